//! Workflow Integration Tests
//!
//! Form submission, hand-off to the results orchestrator and the two
//! result tools, against the scripted gateway and a wiremock backend.

use std::sync::Arc;
use std::time::Duration;

use clinical_intake::services::{ConsultationWorkflow, FileSystemSink, ResultsOrchestrator};
use clinical_intake::{BmiCategory, SubmissionState};
use clinical_intake_core::testing::{fixtures, MockGateway};
use clinical_intake_core::{
    AnalysisEnvelope, ApiGateway, ConsultationRole, CoreError, Endpoint, RiskLevel,
    TransportSettings,
};
use clinical_intake_gateway::RestGateway;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::init_test_tracing;

fn fill_jane(workflow: &mut ConsultationWorkflow) {
    workflow.set_field("patient_name", "Jane Doe").unwrap();
    workflow.set_field("age", "45").unwrap();
    workflow.set_field("gender", "Female").unwrap();
    workflow.set_field("height", "165").unwrap();
    workflow.set_field("weight", "70").unwrap();
}

fn is_generated_mrn(mrn: &str) -> bool {
    mrn.strip_prefix("MRN-")
        .map(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_jane_doe_submission() {
    init_test_tracing();
    let mock = Arc::new(MockGateway::new());
    let mut workflow = ConsultationWorkflow::new(mock.clone(), ConsultationRole::Patient);
    fill_jane(&mut workflow);

    assert_eq!(workflow.form().bmi(), Some(25.7));
    assert_eq!(workflow.form().bmi_category(), Some(BmiCategory::Overweight));
    assert_eq!(workflow.form().bmi_category().unwrap().label(), "Overweight");

    let job = workflow.begin_submit().unwrap();
    let mrn = job.request().medical_record_number().to_string();
    assert!(is_generated_mrn(&mrn), "unexpected MRN {}", mrn);
    assert!(workflow.state().is_submitting());

    mock.push_json(Endpoint::Analyze, fixtures::analysis_envelope(&mrn));
    let outcome = job.run().await;
    let results = workflow.complete_submit(outcome).unwrap();

    assert_eq!(results.medical_record_number(), Some(mrn.as_str()));
    assert_eq!(results.assessment().overall_risk_level, RiskLevel::High);
    assert_eq!(results.assessment().individual_risks[0].display_reasons().len(), 3);
    assert_eq!(workflow.state(), &SubmissionState::Completed);

    let body = mock.calls_to(Endpoint::Analyze)[0].body.clone().unwrap();
    assert_eq!(body["patient_data"]["name"], "Jane Doe");
    assert_eq!(body["patient_data"]["age"], 45);
    assert_eq!(body["medical_data"]["bmi"], 25.7);
    assert_eq!(body["conversation_history"], serde_json::json!([]));
    assert_eq!(body["role"], "Patient");
}

#[tokio::test]
async fn test_validation_failure_makes_no_calls() {
    let mock = Arc::new(MockGateway::new());
    let mut workflow = ConsultationWorkflow::new(mock.clone(), ConsultationRole::Doctor);
    workflow.set_field("age", "45").unwrap();

    let err = workflow.submit().await.unwrap_err();
    assert_eq!(
        workflow.alert_for(&err),
        "Patient Name is required for generating the report."
    );
    assert_eq!(workflow.state(), &SubmissionState::Editing);
    assert_eq!(mock.total_calls(), 0);
}

// ============================================================================
// Result Tools
// ============================================================================

#[tokio::test]
async fn test_explanation_without_observations_stays_idle() {
    let mock = Arc::new(MockGateway::new());
    let envelope: AnalysisEnvelope =
        serde_json::from_value(fixtures::analysis_envelope("MRN-1")).unwrap();
    let mut results = ResultsOrchestrator::from_envelope(mock.clone(), envelope);

    let err = results.begin_explanation().err().unwrap();
    assert!(matches!(err, CoreError::Precondition(_)));
    assert!(results.explanation_state().is_idle());
    assert!(!results.explanation_state().is_loading());
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_report_failure_leaves_explanation_untouched() {
    let mock = Arc::new(MockGateway::new());
    mock.push_json(Endpoint::Analyze, fixtures::analysis_envelope("MRN-9"))
        .push_json(Endpoint::ExplainHeart, serde_json::json!(fixtures::PNG_BASE64))
        .push_error(Endpoint::GeneratePdf, CoreError::transport("connection refused"));

    let mut workflow = ConsultationWorkflow::new(mock.clone(), ConsultationRole::Patient);
    fill_jane(&mut workflow);
    workflow.set_field("medical_record_number", "MRN-9").unwrap();
    workflow.submit().await.unwrap();

    let results = workflow.results_mut().unwrap();
    assert!(results.report_state().is_idle());

    // Failure while the explanation is still idle
    assert!(results.generate_report().await.is_failed());
    assert!(results.explanation_state().is_idle());

    // Failure while the explanation is ready
    let explanation = results.generate_explanation().await.unwrap();
    assert!(explanation.is_ready());
    mock.push_error(Endpoint::GeneratePdf, CoreError::server(500, "boom"));
    assert_eq!(results.generate_report().await.error(), Some("boom"));
    assert!(results.explanation_state().is_ready());
    assert_eq!(results.assessment().overall_risk_score, 62.5);
}

#[tokio::test]
async fn test_explanation_uses_submitted_observations() {
    let mock = Arc::new(MockGateway::new());
    mock.push_json(Endpoint::Analyze, fixtures::analysis_envelope("MRN-9"))
        .push_json(Endpoint::ExplainHeart, serde_json::json!(fixtures::PNG_BASE64));

    let mut workflow = ConsultationWorkflow::new(mock.clone(), ConsultationRole::Patient);
    fill_jane(&mut workflow);
    workflow.set_field("chest_pain", true).unwrap();
    workflow.set_field("cholesterol", "240").unwrap();
    workflow.submit().await.unwrap();

    let results = workflow.results_mut().unwrap();
    let state = results.generate_explanation().await.unwrap();
    assert!(state.payload().unwrap().data_uri().starts_with("data:image/png;base64,"));

    let body = mock.calls_to(Endpoint::ExplainHeart)[0].body.clone().unwrap();
    assert_eq!(body["chest_pain"], true);
    assert_eq!(body["cholesterol"], 240.0);
    assert_eq!(body["bmi"], 25.7);
}

// ============================================================================
// End to End over HTTP
// ============================================================================

#[tokio::test]
async fn test_submit_and_download_report_over_http() {
    init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(fixtures::analysis_envelope("MRN-314")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate-pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::PDF_BYTES.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway: Arc<dyn ApiGateway> =
        Arc::new(RestGateway::new(&TransportSettings::new(server.uri())).unwrap());
    let mut workflow = ConsultationWorkflow::new(gateway, ConsultationRole::Doctor);
    fill_jane(&mut workflow);
    workflow.set_field("medical_record_number", "MRN-314").unwrap();
    workflow.submit().await.unwrap();

    let results = workflow.results_mut().unwrap();
    assert!(results.generate_report().await.is_ready());

    let downloads = tempfile::tempdir().unwrap();
    let sink = FileSystemSink::new(downloads.path());
    let location = results.deliver_report(&sink).await.unwrap();

    assert!(location.ends_with("Medical_Report_MRN-314.pdf"));
    let written = std::fs::read(downloads.path().join("Medical_Report_MRN-314.pdf")).unwrap();
    assert_eq!(written, fixtures::PDF_BYTES);
}

#[tokio::test]
async fn test_unreachable_backend_alert_names_url() {
    let settings = TransportSettings::new("http://127.0.0.1:9").with_connect_timeout_secs(2);
    let gateway: Arc<dyn ApiGateway> = Arc::new(RestGateway::new(&settings).unwrap());
    let mut workflow = ConsultationWorkflow::new(gateway, ConsultationRole::Patient);
    fill_jane(&mut workflow);

    assert!(workflow.submit().await.unwrap_err().is_transport());
    match workflow.state() {
        SubmissionState::Failed(alert) => {
            assert!(alert.starts_with("Cannot connect to the medical analysis server."));
            assert!(alert.ends_with("http://127.0.0.1:9"));
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert!(workflow.results().is_none());
}

#[tokio::test]
async fn test_abandoned_submit_returns_to_editing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::analysis_envelope("MRN-5"))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let gateway: Arc<dyn ApiGateway> =
        Arc::new(RestGateway::new(&TransportSettings::new(server.uri())).unwrap());
    let mut workflow = ConsultationWorkflow::new(gateway, ConsultationRole::Patient);
    fill_jane(&mut workflow);

    let finished = tokio::select! {
        biased;
        _ = workflow.submit() => true,
        _ = tokio::task::yield_now() => false,
    };
    assert!(!finished);

    assert_eq!(workflow.state(), &SubmissionState::Editing);
    assert!(workflow.results().is_none());
    assert_eq!(workflow.form().patient_name(), "Jane Doe");
    assert!(workflow.begin_submit().is_ok());
}
