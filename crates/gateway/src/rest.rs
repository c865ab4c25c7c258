//! REST Gateway
//!
//! `ApiGateway` over the backend's JSON/HTTP contract. The base URL is fixed
//! at construction; a base with a path prefix (e.g. behind a reverse proxy)
//! keeps that prefix for every endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use clinical_intake_core::{
    AnalysisEnvelope, AnalysisRequest, ApiGateway, AppointmentConfirmation, AppointmentRequest,
    ChatReply, ChatRequest, ConsultationCreate, ConsultationRecord, ConsultationUpdate, CoreError,
    CoreResult, Endpoint, HealthStatus, HttpMethod, MedicalObservationSet, PatientProfile,
    PatientRecord, TransportSettings,
};

use crate::errors::{parse_http_error, transport_error};
use crate::http_client::build_http_client;

/// Object keys under which the explain endpoint may wrap its image.
const EXPLANATION_KEYS: [&str; 4] = ["image", "plot", "shap_image", "explanation"];

/// HTTP gateway to the intake backend
pub struct RestGateway {
    /// Base URL normalized to end with `/` for relative joins
    base_url: Url,
    /// Base URL as configured, for messages
    display_url: String,
    client: reqwest::Client,
}

impl RestGateway {
    /// Create a gateway with a client built from `settings`.
    pub fn new(settings: &TransportSettings) -> CoreResult<Self> {
        let client = build_http_client(settings)?;
        Self::with_client(&settings.base_url, client)
    }

    /// Create a gateway around an existing client.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> CoreResult<Self> {
        let trimmed = base_url.trim();
        let mut url = Url::parse(trimmed)
            .map_err(|e| CoreError::config(format!("Invalid API base URL '{}': {}", trimmed, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::config(format!(
                "API base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            display_url: trimmed.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Absolute URL for an endpoint; `id` is percent-encoded here.
    pub fn url_for(&self, endpoint: Endpoint, id: Option<&str>) -> CoreResult<Url> {
        let encoded = id.map(|raw| urlencoding::encode(raw).into_owned());
        let path = endpoint.path(encoded.as_deref());
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CoreError::internal(format!("Failed to build URL for {}: {}", path, e)))
    }

    fn request(&self, endpoint: Endpoint, id: Option<&str>) -> CoreResult<RequestBuilder> {
        let url = self.url_for(endpoint, id)?;
        Ok(match endpoint.method() {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Patch => self.client.patch(url),
        })
    }

    /// Send and reject non-success statuses.
    async fn execute(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> CoreResult<reqwest::Response> {
        tracing::debug!("[RestGateway] {}", endpoint.label());

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("[RestGateway] {} unreachable: {}", endpoint.label(), e);
            transport_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                "[RestGateway] {} returned HTTP {}",
                endpoint.label(),
                status.as_u16()
            );
            return Err(parse_http_error(status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
    ) -> CoreResult<T> {
        let body_text = self.send_text(endpoint, builder).await?;
        serde_json::from_str(&body_text).map_err(|e| {
            CoreError::parse(format!(
                "Failed to parse {} response: {}",
                endpoint.label(),
                e
            ))
        })
    }

    async fn send_text(&self, endpoint: Endpoint, builder: RequestBuilder) -> CoreResult<String> {
        let response = self.execute(endpoint, builder).await?;
        response.text().await.map_err(transport_error)
    }
}

/// Extract the base64 image from an explain response body.
///
/// Accepts a bare JSON string, an object wrapping it under one of
/// `EXPLANATION_KEYS`, or raw text. JSON `null` means the backend could not
/// produce a plot.
pub(crate) fn parse_explanation_body(body: &str) -> CoreResult<String> {
    let trimmed = body.trim();
    let unusable = || CoreError::parse("Explanation service returned no image");

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Ok(Value::Object(map)) => EXPLANATION_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
            .ok_or_else(unusable),
        Ok(_) => Err(unusable()),
        Err(_) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        Err(_) => Err(unusable()),
    }
}

#[async_trait]
impl ApiGateway for RestGateway {
    fn base_url(&self) -> &str {
        &self.display_url
    }

    async fn health(&self) -> CoreResult<HealthStatus> {
        let builder = self.request(Endpoint::Health, None)?;
        self.send_json(Endpoint::Health, builder).await
    }

    async fn analyze(&self, request: &AnalysisRequest) -> CoreResult<AnalysisEnvelope> {
        let builder = self.request(Endpoint::Analyze, None)?.json(request);
        self.send_json(Endpoint::Analyze, builder).await
    }

    async fn create_patient(&self, patient: &PatientProfile) -> CoreResult<PatientRecord> {
        let builder = self.request(Endpoint::CreatePatient, None)?.json(patient);
        self.send_json(Endpoint::CreatePatient, builder).await
    }

    async fn get_patient(&self, patient_id: &str) -> CoreResult<PatientRecord> {
        let builder = self.request(Endpoint::GetPatient, Some(patient_id))?;
        self.send_json(Endpoint::GetPatient, builder).await
    }

    async fn create_consultation(
        &self,
        consultation: &ConsultationCreate,
    ) -> CoreResult<ConsultationRecord> {
        let builder = self
            .request(Endpoint::CreateConsultation, None)?
            .json(consultation);
        self.send_json(Endpoint::CreateConsultation, builder).await
    }

    async fn update_consultation(
        &self,
        consultation_id: &str,
        update: &ConsultationUpdate,
    ) -> CoreResult<ConsultationRecord> {
        update.validate()?;
        let builder = self
            .request(Endpoint::UpdateConsultation, Some(consultation_id))?
            .json(update);
        self.send_json(Endpoint::UpdateConsultation, builder).await
    }

    async fn explain_heart(&self, observations: &MedicalObservationSet) -> CoreResult<String> {
        let builder = self.request(Endpoint::ExplainHeart, None)?.json(observations);
        let body = self.send_text(Endpoint::ExplainHeart, builder).await?;
        parse_explanation_body(&body)
    }

    async fn generate_pdf(&self, envelope: &AnalysisEnvelope) -> CoreResult<Bytes> {
        let builder = self.request(Endpoint::GeneratePdf, None)?.json(envelope);
        let response = self.execute(Endpoint::GeneratePdf, builder).await?;
        response.bytes().await.map_err(transport_error)
    }

    async fn chat(&self, request: &ChatRequest) -> CoreResult<ChatReply> {
        let builder = self.request(Endpoint::Chat, None)?.json(request);
        self.send_json(Endpoint::Chat, builder).await
    }

    async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> CoreResult<AppointmentConfirmation> {
        let builder = self.request(Endpoint::BookAppointment, None)?.json(request);
        self.send_json(Endpoint::BookAppointment, builder).await
    }
}
