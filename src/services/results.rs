//! Results Orchestrator
//!
//! Owns one analysis result and the two on-demand tools layered on it:
//! the PDF report and the feature-importance explanation.
//!
//! Each tool is driven in three steps so both can be in flight at once
//! without shared locks:
//!
//! 1. `begin_*` - synchronous transition to `Loading`, returns an owned job
//! 2. `Job::run` - the network leg; borrows nothing from the orchestrator
//! 3. `complete_*` - synchronous transition to `Ready` or `Failed`
//!
//! `generate_report` and `generate_explanation` compose the three steps.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use clinical_intake_core::{
    report_file_name, AnalysisEnvelope, AnalysisRequest, ApiGateway, AssessmentResult, CoreError,
    CoreResult, ExplanationImage, MedicalObservationSet, ReportArtifact, EXPLANATION_MEDIA_TYPE,
};

use super::artifact_sink::ArtifactSink;
use super::tool_state::{Ticket, ToolSlot, ToolState};

pub const MISSING_OBSERVATIONS_MESSAGE: &str =
    "Original medical data is not available for this result, so an explanation cannot be generated.";
pub const REPORT_NOT_READY_MESSAGE: &str = "No report has been generated yet.";

/// Result of a tool job, applied with `complete_report` / `complete_explanation`.
#[derive(Debug)]
pub struct ToolCompletion<T> {
    pub ticket: Ticket,
    pub result: CoreResult<T>,
}

/// In-flight PDF generation.
pub struct ReportJob {
    ticket: Ticket,
    gateway: Arc<dyn ApiGateway>,
    envelope: AnalysisEnvelope,
}

impl fmt::Debug for ReportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportJob")
            .field("ticket", &self.ticket)
            .field("medical_record_number", &self.envelope.medical_record_number())
            .finish_non_exhaustive()
    }
}

impl ReportJob {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub async fn run(self) -> ToolCompletion<ReportArtifact> {
        let mrn = self.envelope.medical_record_number().map(String::from);
        let result = self
            .gateway
            .generate_pdf(&self.envelope)
            .await
            .and_then(|bytes| build_report(bytes, mrn));
        ToolCompletion {
            ticket: self.ticket,
            result,
        }
    }
}

/// In-flight explanation generation.
pub struct ExplanationJob {
    ticket: Ticket,
    gateway: Arc<dyn ApiGateway>,
    observations: MedicalObservationSet,
}

impl fmt::Debug for ExplanationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplanationJob")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

impl ExplanationJob {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub async fn run(self) -> ToolCompletion<ExplanationImage> {
        let result = self
            .gateway
            .explain_heart(&self.observations)
            .await
            .and_then(|encoded| decode_explanation(&encoded));
        ToolCompletion {
            ticket: self.ticket,
            result,
        }
    }
}

/// Post-analysis state for one submission.
pub struct ResultsOrchestrator {
    gateway: Arc<dyn ApiGateway>,
    envelope: AnalysisEnvelope,
    assessment: AssessmentResult,
    observations: Option<MedicalObservationSet>,
    report: ToolSlot<ReportArtifact>,
    explanation: ToolSlot<ExplanationImage>,
}

impl fmt::Debug for ResultsOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsOrchestrator")
            .field("base_url", &self.gateway.base_url())
            .field("medical_record_number", &self.medical_record_number())
            .field("has_observations", &self.observations.is_some())
            .field("report", &self.report.state().label())
            .field("explanation", &self.explanation.state().label())
            .finish()
    }
}

impl ResultsOrchestrator {
    /// Orchestrator for a fresh submission; keeps the submitted observations
    /// for the explanation tool.
    pub fn from_submission(
        gateway: Arc<dyn ApiGateway>,
        request: &AnalysisRequest,
        envelope: AnalysisEnvelope,
    ) -> Self {
        let mut orchestrator = Self::from_envelope(gateway, envelope);
        orchestrator.observations = Some(request.observations.clone());
        orchestrator
    }

    /// Orchestrator for an envelope alone; the explanation tool is unavailable.
    pub fn from_envelope(gateway: Arc<dyn ApiGateway>, envelope: AnalysisEnvelope) -> Self {
        let assessment = envelope.assessment_or_default();
        tracing::info!(
            "[ResultsOrchestrator] Result for {} ({} risk, {} findings)",
            envelope.medical_record_number().unwrap_or("unknown MRN"),
            assessment.overall_risk_level,
            assessment.individual_risks.len()
        );
        Self {
            gateway,
            envelope,
            assessment,
            observations: None,
            report: ToolSlot::new(),
            explanation: ToolSlot::new(),
        }
    }

    pub fn envelope(&self) -> &AnalysisEnvelope {
        &self.envelope
    }

    pub fn assessment(&self) -> &AssessmentResult {
        &self.assessment
    }

    pub fn observations(&self) -> Option<&MedicalObservationSet> {
        self.observations.as_ref()
    }

    pub fn medical_record_number(&self) -> Option<&str> {
        self.envelope.medical_record_number()
    }

    /// File name the report will be delivered under.
    pub fn report_file_name(&self) -> String {
        report_file_name(self.medical_record_number())
    }

    pub fn report_state(&self) -> &ToolState<ReportArtifact> {
        self.report.state()
    }

    pub fn explanation_state(&self) -> &ToolState<ExplanationImage> {
        self.explanation.state()
    }

    // ── Report tool ────────────────────────────────────────────────────

    /// Start report generation; `None` if one is already loading.
    pub fn begin_report(&mut self) -> Option<ReportJob> {
        let ticket = self.report.begin()?;
        tracing::info!("[ResultsOrchestrator] Report {} started", ticket);
        Some(ReportJob {
            ticket,
            gateway: Arc::clone(&self.gateway),
            envelope: self.envelope.clone(),
        })
    }

    /// Apply a report result; `false` if it was stale.
    pub fn complete_report(&mut self, completion: ToolCompletion<ReportArtifact>) -> bool {
        let ticket = completion.ticket;
        let applied = self
            .report
            .complete(ticket, completion.result.map_err(|e| failure_reason("Report", ticket, &e)));
        if !applied {
            tracing::debug!("[ResultsOrchestrator] Discarded stale report {}", ticket);
        }
        applied
    }

    pub fn dismiss_report(&mut self) -> bool {
        self.report.dismiss()
    }

    pub fn cancel_report(&mut self) -> bool {
        let cancelled = self.report.cancel();
        if cancelled {
            tracing::info!("[ResultsOrchestrator] Report generation cancelled");
        }
        cancelled
    }

    /// Begin, run and complete report generation.
    pub async fn generate_report(&mut self) -> &ToolState<ReportArtifact> {
        if let Some(job) = self.begin_report() {
            let completion = job.run().await;
            self.complete_report(completion);
        }
        self.report.state()
    }

    /// Hand the ready report to `sink`.
    pub async fn deliver_report(&self, sink: &dyn ArtifactSink) -> CoreResult<String> {
        let artifact = self
            .report
            .state()
            .payload()
            .ok_or_else(|| CoreError::precondition(REPORT_NOT_READY_MESSAGE))?;
        sink.deliver(artifact.bytes.clone(), &artifact.file_name).await
    }

    // ── Explanation tool ───────────────────────────────────────────────

    /// Start explanation generation.
    ///
    /// `Err(Precondition)` without observations (the tool stays as it was);
    /// `Ok(None)` if one is already loading.
    pub fn begin_explanation(&mut self) -> CoreResult<Option<ExplanationJob>> {
        let observations = self
            .observations
            .clone()
            .ok_or_else(|| CoreError::precondition(MISSING_OBSERVATIONS_MESSAGE))?;
        let Some(ticket) = self.explanation.begin() else {
            return Ok(None);
        };
        tracing::info!("[ResultsOrchestrator] Explanation {} started", ticket);
        Ok(Some(ExplanationJob {
            ticket,
            gateway: Arc::clone(&self.gateway),
            observations,
        }))
    }

    /// Apply an explanation result; `false` if it was stale.
    pub fn complete_explanation(&mut self, completion: ToolCompletion<ExplanationImage>) -> bool {
        let ticket = completion.ticket;
        let applied = self.explanation.complete(
            ticket,
            completion
                .result
                .map_err(|e| failure_reason("Explanation", ticket, &e)),
        );
        if !applied {
            tracing::debug!("[ResultsOrchestrator] Discarded stale explanation {}", ticket);
        }
        applied
    }

    pub fn dismiss_explanation(&mut self) -> bool {
        self.explanation.dismiss()
    }

    pub fn cancel_explanation(&mut self) -> bool {
        let cancelled = self.explanation.cancel();
        if cancelled {
            tracing::info!("[ResultsOrchestrator] Explanation generation cancelled");
        }
        cancelled
    }

    /// Begin, run and complete explanation generation.
    pub async fn generate_explanation(&mut self) -> CoreResult<&ToolState<ExplanationImage>> {
        if let Some(job) = self.begin_explanation()? {
            let completion = job.run().await;
            self.complete_explanation(completion);
        }
        Ok(self.explanation.state())
    }
}

fn failure_reason(tool: &str, ticket: Ticket, err: &CoreError) -> String {
    tracing::warn!("[ResultsOrchestrator] {} {} failed: {}", tool, ticket, err);
    err.user_message()
}

fn build_report(bytes: Bytes, medical_record_number: Option<String>) -> CoreResult<ReportArtifact> {
    if bytes.is_empty() {
        return Err(CoreError::parse("The report service returned an empty document."));
    }
    let artifact = ReportArtifact {
        file_name: report_file_name(medical_record_number.as_deref()),
        bytes,
        medical_record_number,
    };
    if !artifact.looks_like_pdf() {
        tracing::warn!(
            "[ResultsOrchestrator] Report payload does not start with %PDF ({} bytes)",
            artifact.len()
        );
    }
    Ok(artifact)
}

/// Decode the explain endpoint's base64 payload.
///
/// A `data:<type>;base64,` prefix and embedded whitespace are tolerated.
pub fn decode_explanation(encoded: &str) -> CoreResult<ExplanationImage> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| CoreError::parse("Malformed data URI in explanation payload"))?,
        None => trimmed,
    };
    let base64: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(base64.as_bytes())
        .map_err(|e| CoreError::parse(format!("Explanation image could not be decoded: {}", e)))?;
    if bytes.is_empty() {
        return Err(CoreError::parse("Explanation image is empty"));
    }

    Ok(ExplanationImage {
        base64,
        bytes: Bytes::from(bytes),
        media_type: EXPLANATION_MEDIA_TYPE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::artifact_sink::MemorySink;
    use clinical_intake_core::testing::{fixtures, MockGateway};
    use clinical_intake_core::{Endpoint, RiskLevel};

    fn envelope(mrn: &str) -> AnalysisEnvelope {
        serde_json::from_value(fixtures::analysis_envelope(mrn)).unwrap()
    }

    fn orchestrator(mock: &Arc<MockGateway>, with_observations: bool) -> ResultsOrchestrator {
        let gateway: Arc<dyn ApiGateway> = mock.clone();
        let envelope = envelope("MRN-55");
        if with_observations {
            let request: AnalysisRequest = serde_json::from_value(serde_json::json!({
                "patient_data": {"name": "Jane Doe", "medical_record_number": "MRN-55", "age": 45, "gender": "Female"},
                "medical_data": {"bmi": 25.7, "chest_pain": true}
            }))
            .unwrap();
            ResultsOrchestrator::from_submission(gateway, &request, envelope)
        } else {
            ResultsOrchestrator::from_envelope(gateway, envelope)
        }
    }

    #[test]
    fn test_decode_explanation() {
        let image = decode_explanation(fixtures::PNG_BASE64).unwrap();
        assert!(image.bytes.starts_with(b"\x89PNG"));
        assert_eq!(image.media_type, "image/png");

        let prefixed = format!("data:image/png;base64,{}", fixtures::PNG_BASE64);
        assert_eq!(decode_explanation(&prefixed).unwrap().base64, fixtures::PNG_BASE64);
        assert!(decode_explanation("not base64 at all!").is_err());
        assert!(decode_explanation("").is_err());
    }

    #[test]
    fn test_assessment_exposed() {
        let mock = Arc::new(MockGateway::new());
        let orch = orchestrator(&mock, false);
        assert_eq!(orch.assessment().overall_risk_level, RiskLevel::High);
        assert_eq!(orch.report_file_name(), "Medical_Report_MRN-55.pdf");
        assert!(orch.report_state().is_idle());
        assert!(orch.explanation_state().is_idle());
    }

    #[tokio::test]
    async fn test_generate_report_ready() {
        let mock = Arc::new(MockGateway::new());
        mock.push_bytes(Endpoint::GeneratePdf, fixtures::PDF_BYTES);
        let mut orch = orchestrator(&mock, false);

        let state = orch.generate_report().await;
        let artifact = state.payload().unwrap();
        assert_eq!(artifact.file_name, "Medical_Report_MRN-55.pdf");
        assert!(artifact.looks_like_pdf());

        // The envelope is echoed unchanged
        let calls = mock.calls_to(Endpoint::GeneratePdf);
        assert_eq!(calls[0].body.as_ref().unwrap()["consultation"]["id"], "c0ffee12-3456-7890");
    }

    #[tokio::test]
    async fn test_report_echoes_backend_labels() {
        let mock = Arc::new(MockGateway::new());
        mock.push_bytes(Endpoint::GeneratePdf, fixtures::PDF_BYTES);
        let mut body = fixtures::analysis_envelope("MRN-55");
        body["assessment"]["overall_risk_level"] = serde_json::json!("Critical");
        body["assessment"]["individual_risks"][0]["risk_level"] = serde_json::json!("Moderate");
        let envelope: AnalysisEnvelope = serde_json::from_value(body.clone()).unwrap();
        let mut orch = ResultsOrchestrator::from_envelope(mock.clone(), envelope);

        assert!(orch.generate_report().await.is_ready());
        let calls = mock.calls_to(Endpoint::GeneratePdf);
        assert_eq!(calls[0].body.as_ref(), Some(&body));
    }

    #[test]
    fn test_debug_omits_payloads() {
        let mock = Arc::new(MockGateway::new());
        let rendered = format!("{:?}", orchestrator(&mock, true));
        assert!(rendered.contains("MRN-55"));
        assert!(rendered.contains("has_observations: true"));
        assert!(!rendered.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_report_failure_then_retry() {
        let mock = Arc::new(MockGateway::new());
        mock.push_error(Endpoint::GeneratePdf, CoreError::server(500, "PDF engine crashed"))
            .push_bytes(Endpoint::GeneratePdf, fixtures::PDF_BYTES);
        let mut orch = orchestrator(&mock, false);

        assert_eq!(orch.generate_report().await.error(), Some("PDF engine crashed"));
        assert!(orch.generate_report().await.is_ready());
        assert_eq!(mock.call_count(Endpoint::GeneratePdf), 2);
    }

    #[tokio::test]
    async fn test_both_tools_loading_at_once() {
        let mock = Arc::new(MockGateway::new());
        mock.push_bytes(Endpoint::GeneratePdf, fixtures::PDF_BYTES)
            .push_json(Endpoint::ExplainHeart, serde_json::json!(fixtures::PNG_BASE64));
        let mut orch = orchestrator(&mock, true);

        let report_job = orch.begin_report().unwrap();
        let explanation_job = orch.begin_explanation().unwrap().unwrap();
        assert!(orch.report_state().is_loading());
        assert!(orch.explanation_state().is_loading());
        assert!(orch.begin_report().is_none());
        assert!(orch.begin_explanation().unwrap().is_none());

        let (report, explanation) = tokio::join!(report_job.run(), explanation_job.run());
        assert!(orch.complete_explanation(explanation));
        assert!(orch.report_state().is_loading());
        assert!(orch.complete_report(report));

        assert!(orch.report_state().is_ready());
        assert!(orch.explanation_state().is_ready());
    }

    #[tokio::test]
    async fn test_explanation_without_observations() {
        let mock = Arc::new(MockGateway::new());
        let mut orch = orchestrator(&mock, false);

        let err = orch.generate_explanation().await.unwrap_err();
        assert!(matches!(err, CoreError::Precondition(_)));
        assert_eq!(err.user_message(), MISSING_OBSERVATIONS_MESSAGE);
        assert!(orch.explanation_state().is_idle());
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_explanation_fails_tool() {
        let mock = Arc::new(MockGateway::new());
        mock.push_json(Endpoint::ExplainHeart, serde_json::json!("%%%"));
        let mut orch = orchestrator(&mock, true);

        let state = orch.generate_explanation().await.unwrap();
        assert!(state.is_failed());
        assert!(orch.report_state().is_idle());
    }

    #[tokio::test]
    async fn test_cancel_discards_result() {
        let mock = Arc::new(MockGateway::new());
        mock.push_bytes(Endpoint::GeneratePdf, fixtures::PDF_BYTES);
        let mut orch = orchestrator(&mock, false);

        let job = orch.begin_report().unwrap();
        assert!(orch.cancel_report());
        let completion = job.run().await;
        assert!(!orch.complete_report(completion));
        assert!(orch.report_state().is_idle());
    }

    #[tokio::test]
    async fn test_deliver_report() {
        let mock = Arc::new(MockGateway::new());
        mock.push_bytes(Endpoint::GeneratePdf, fixtures::PDF_BYTES);
        let mut orch = orchestrator(&mock, false);
        let sink = MemorySink::new();

        let err = orch.deliver_report(&sink).await.unwrap_err();
        assert!(matches!(err, CoreError::Precondition(_)));

        orch.generate_report().await;
        let location = orch.deliver_report(&sink).await.unwrap();
        assert_eq!(location, "memory://Medical_Report_MRN-55.pdf");
        assert_eq!(sink.deliveries()[0].bytes.as_ref(), fixtures::PDF_BYTES);
        assert!(orch.report_state().is_ready());
    }

    #[tokio::test]
    async fn test_dismiss_returns_to_idle() {
        let mock = Arc::new(MockGateway::new());
        mock.push_error(
            Endpoint::GeneratePdf,
            CoreError::transport("connection refused"),
        );
        let mut orch = orchestrator(&mock, false);

        assert!(orch.generate_report().await.is_failed());
        assert!(orch.dismiss_report());
        assert!(orch.report_state().is_idle());
    }
}
