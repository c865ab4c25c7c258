//! Test Support
//!
//! A scripted `ApiGateway` double. Each endpoint has a FIFO queue of
//! replies; a call with an empty queue fails with a `Transport` error, which
//! doubles as the "backend down" simulation. Every call is recorded with its
//! serialized body so tests can assert what reached the network layer.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::gateway::{ApiGateway, Endpoint};
use crate::models::{
    AnalysisEnvelope, AnalysisRequest, AppointmentConfirmation, AppointmentRequest, ChatReply,
    ChatRequest, ConsultationCreate, ConsultationRecord, ConsultationUpdate, HealthStatus,
    MedicalObservationSet, PatientProfile, PatientRecord,
};

/// A scripted reply.
#[derive(Debug)]
pub enum MockReply {
    Json(Value),
    Bytes(Bytes),
    Error(CoreError),
}

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub id: Option<String>,
    pub body: Option<Value>,
}

pub struct MockGateway {
    base_url: String,
    replies: Mutex<HashMap<Endpoint, VecDeque<MockReply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::with_base_url("http://mock.backend")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, endpoint: Endpoint, reply: MockReply) -> &Self {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        replies.entry(endpoint).or_default().push_back(reply);
        self
    }

    pub fn push_json(&self, endpoint: Endpoint, value: Value) -> &Self {
        self.push(endpoint, MockReply::Json(value))
    }

    pub fn push_bytes(&self, endpoint: Endpoint, bytes: impl Into<Bytes>) -> &Self {
        self.push(endpoint, MockReply::Bytes(bytes.into()))
    }

    pub fn push_error(&self, endpoint: Endpoint, error: CoreError) -> &Self {
        self.push(endpoint, MockReply::Error(error))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls_to(endpoint).len()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn take<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        id: Option<&str>,
        body: Option<&B>,
    ) -> CoreResult<MockReply> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                endpoint,
                id: id.map(String::from),
                body: body.and_then(|b| serde_json::to_value(b).ok()),
            });

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);

        match next {
            Some(MockReply::Error(err)) => Err(err),
            Some(reply) => Ok(reply),
            None => Err(CoreError::transport(format!(
                "connection refused: no scripted reply for {}",
                endpoint.label()
            ))),
        }
    }

    fn take_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        id: Option<&str>,
        body: Option<&B>,
    ) -> CoreResult<T> {
        match self.take(endpoint, id, body)? {
            MockReply::Json(value) => serde_json::from_value(value)
                .map_err(|e| CoreError::parse(format!("Failed to parse response: {}", e))),
            MockReply::Bytes(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CoreError::parse(format!("Failed to parse response: {}", e))),
            MockReply::Error(err) => Err(err),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiGateway for MockGateway {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> CoreResult<HealthStatus> {
        self.take_json::<_, Value>(Endpoint::Health, None, None)
    }

    async fn analyze(&self, request: &AnalysisRequest) -> CoreResult<AnalysisEnvelope> {
        self.take_json(Endpoint::Analyze, None, Some(request))
    }

    async fn create_patient(&self, patient: &PatientProfile) -> CoreResult<PatientRecord> {
        self.take_json(Endpoint::CreatePatient, None, Some(patient))
    }

    async fn get_patient(&self, patient_id: &str) -> CoreResult<PatientRecord> {
        self.take_json::<_, Value>(Endpoint::GetPatient, Some(patient_id), None)
    }

    async fn create_consultation(
        &self,
        consultation: &ConsultationCreate,
    ) -> CoreResult<ConsultationRecord> {
        self.take_json(Endpoint::CreateConsultation, None, Some(consultation))
    }

    async fn update_consultation(
        &self,
        consultation_id: &str,
        update: &ConsultationUpdate,
    ) -> CoreResult<ConsultationRecord> {
        self.take_json(Endpoint::UpdateConsultation, Some(consultation_id), Some(update))
    }

    async fn explain_heart(&self, observations: &MedicalObservationSet) -> CoreResult<String> {
        self.take_json(Endpoint::ExplainHeart, None, Some(observations))
    }

    async fn generate_pdf(&self, envelope: &AnalysisEnvelope) -> CoreResult<Bytes> {
        match self.take(Endpoint::GeneratePdf, None, Some(envelope))? {
            MockReply::Bytes(bytes) => Ok(bytes),
            MockReply::Json(value) => Ok(Bytes::from(value.to_string())),
            MockReply::Error(err) => Err(err),
        }
    }

    async fn chat(&self, request: &ChatRequest) -> CoreResult<ChatReply> {
        self.take_json(Endpoint::Chat, None, Some(request))
    }

    async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> CoreResult<AppointmentConfirmation> {
        self.take_json(Endpoint::BookAppointment, None, Some(request))
    }
}

/// Canned backend payloads.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A complete `/api/analyze` envelope for the given MRN.
    pub fn analysis_envelope(mrn: &str) -> Value {
        json!({
            "patient": {
                "id": "p-1",
                "name": "Jane Doe",
                "medical_record_number": mrn,
                "age": 45,
                "gender": "Female",
                "created_at": "2026-10-14T09:00:00"
            },
            "medical_record": {
                "id": "m-1",
                "patient_id": "p-1",
                "bmi": 25.7,
                "chest_pain": true,
                "recorded_at": "2026-10-14T09:00:00"
            },
            "consultation": {
                "id": "c0ffee12-3456-7890",
                "patient_id": "p-1",
                "role": "Doctor",
                "stage": "completed",
                "confidence": 0.9,
                "conversation_history": [],
                "started_at": "2026-10-14T09:00:00"
            },
            "assessment": {
                "id": "a-1",
                "consultation_id": "c0ffee12-3456-7890",
                "overall_risk_score": 62.5,
                "overall_risk_level": "High",
                "primary_concerns": ["Cardiovascular risk"],
                "individual_risks": [
                    {
                        "disease": "Heart Disease",
                        "risk_level": "High",
                        "why": ["Chest pain reported", "Elevated BMI", "Age over 40", "Cholesterol"]
                    },
                    {
                        "disease": "Diabetes",
                        "risk_level": "Low",
                        "why": []
                    }
                ],
                "doctor_report": "## Assessment\nElevated cardiovascular risk.",
                "patient_report": "Your heart health needs attention.",
                "assessed_at": "2026-10-14T09:00:05"
            }
        })
    }

    /// A successful chat reply.
    pub fn chat_reply(text: &str) -> Value {
        json!({ "response": text })
    }

    /// A tiny valid PNG, base64-encoded.
    pub const PNG_BASE64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    /// Leading bytes of a PDF document.
    pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%mock report\n";
}
