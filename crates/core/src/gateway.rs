//! API Gateway Trait
//!
//! Transport abstraction over the backend contract. Implementations carry no
//! business logic: they serialize the request, perform one round-trip, and
//! map the outcome onto `CoreError`. There is no retry anywhere behind this
//! trait; every failure is returned to the caller as-is.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CoreResult;
use crate::models::{
    AnalysisEnvelope, AnalysisRequest, AppointmentConfirmation, AppointmentRequest, ChatReply,
    ChatRequest, ConsultationCreate, ConsultationRecord, ConsultationUpdate, HealthStatus,
    MedicalObservationSet, PatientProfile, PatientRecord,
};

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

/// The fixed set of backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Analyze,
    CreatePatient,
    GetPatient,
    CreateConsultation,
    UpdateConsultation,
    ExplainHeart,
    GeneratePdf,
    Chat,
    BookAppointment,
}

impl Endpoint {
    pub const ALL: [Endpoint; 10] = [
        Endpoint::Health,
        Endpoint::Analyze,
        Endpoint::CreatePatient,
        Endpoint::GetPatient,
        Endpoint::CreateConsultation,
        Endpoint::UpdateConsultation,
        Endpoint::ExplainHeart,
        Endpoint::GeneratePdf,
        Endpoint::Chat,
        Endpoint::BookAppointment,
    ];

    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Health | Endpoint::GetPatient => HttpMethod::Get,
            Endpoint::UpdateConsultation => HttpMethod::Patch,
            _ => HttpMethod::Post,
        }
    }

    /// Path relative to the base URL. `id` fills the `{id}` segment of
    /// `GetPatient` / `UpdateConsultation` and must already be URL-safe.
    pub fn path(&self, id: Option<&str>) -> String {
        let id = id.unwrap_or_default();
        match self {
            Endpoint::Health => "/health".to_string(),
            Endpoint::Analyze => "/api/analyze".to_string(),
            Endpoint::CreatePatient => "/api/patients".to_string(),
            Endpoint::GetPatient => format!("/api/patients/{}", id),
            Endpoint::CreateConsultation => "/api/consultations".to_string(),
            Endpoint::UpdateConsultation => format!("/api/consultations/{}", id),
            Endpoint::ExplainHeart => "/api/explain/heart".to_string(),
            Endpoint::GeneratePdf => "/api/generate-pdf".to_string(),
            Endpoint::Chat => "/api/chat/".to_string(),
            Endpoint::BookAppointment => "/api/chat/appointments".to_string(),
        }
    }

    /// Short name used in logs, e.g. `POST /api/analyze`.
    pub fn label(&self) -> String {
        format!("{} {}", self.method().as_str(), self.path(Some("{id}")))
    }
}

/// Trait every backend transport implements.
///
/// Errors follow the core taxonomy: unreachable backend → `Transport`,
/// non-success status → `Server`, undecodable body → `Parse`.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Base URL this gateway talks to, for user-facing messages.
    fn base_url(&self) -> &str;

    /// `GET /health`
    async fn health(&self) -> CoreResult<HealthStatus>;

    /// `POST /api/analyze`
    async fn analyze(&self, request: &AnalysisRequest) -> CoreResult<AnalysisEnvelope>;

    /// `POST /api/patients`
    async fn create_patient(&self, patient: &PatientProfile) -> CoreResult<PatientRecord>;

    /// `GET /api/patients/{id}`
    async fn get_patient(&self, patient_id: &str) -> CoreResult<PatientRecord>;

    /// `POST /api/consultations`
    async fn create_consultation(
        &self,
        consultation: &ConsultationCreate,
    ) -> CoreResult<ConsultationRecord>;

    /// `PATCH /api/consultations/{id}`
    async fn update_consultation(
        &self,
        consultation_id: &str,
        update: &ConsultationUpdate,
    ) -> CoreResult<ConsultationRecord>;

    /// `POST /api/explain/heart` → base64-encoded PNG.
    async fn explain_heart(&self, observations: &MedicalObservationSet) -> CoreResult<String>;

    /// `POST /api/generate-pdf` → PDF bytes.
    async fn generate_pdf(&self, envelope: &AnalysisEnvelope) -> CoreResult<Bytes>;

    /// `POST /api/chat/`
    async fn chat(&self, request: &ChatRequest) -> CoreResult<ChatReply>;

    /// `POST /api/chat/appointments`
    async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> CoreResult<AppointmentConfirmation>;
}
