//! Gateway Integration Tests
//!
//! `RestGateway` against a wiremock backend, and `AppState` wiring from a
//! config file with environment overrides.

use std::sync::Arc;

use clinical_intake::storage::{ENV_API_URL, ENV_TIMEOUT_SECS};
use clinical_intake::{AppState, ConfigService};
use clinical_intake_core::{
    ApiGateway, ConsultationCreate, ConsultationRole, ConsultationUpdate, ConversationMessage,
    CoreError, Gender, PatientProfile, TransportSettings,
};
use clinical_intake_gateway::RestGateway;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> RestGateway {
    RestGateway::new(&TransportSettings::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_patient_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/patients"))
        .and(body_json(json!({
            "name": "Jane Doe",
            "medical_record_number": "MRN-77",
            "age": 45,
            "gender": "Female"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-77",
            "name": "Jane Doe",
            "medical_record_number": "MRN-77",
            "age": 45,
            "gender": "Female",
            "created_at": "2026-10-14T09:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/patients/p-77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-77",
            "name": "Jane Doe",
            "medical_record_number": "MRN-77"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let created = gateway
        .create_patient(&PatientProfile {
            name: "Jane Doe".to_string(),
            medical_record_number: "MRN-77".to_string(),
            age: 45,
            gender: Gender::Female,
            email: None,
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id.as_deref(), Some("p-77"));

    let fetched = gateway.get_patient("p-77").await.unwrap();
    assert_eq!(fetched.mrn(), Some("MRN-77"));
}

#[tokio::test]
async fn test_missing_patient_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patients/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Patient not found"})),
        )
        .mount(&server)
        .await;

    match gateway(&server).get_patient("nope").await {
        Err(CoreError::Server { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Patient not found");
        }
        other => panic!("Expected Server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_consultation_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consultations"))
        .and(body_json(json!({"patient_id": "p-77", "role": "Doctor"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-1",
            "patient_id": "p-77",
            "role": "Doctor",
            "stage": "started",
            "conversation_history": [],
            "started_at": "2026-10-14T09:00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/consultations/c-1"))
        .and(body_json(json!({
            "stage": "completed",
            "conversation_history": [{"role": "user", "content": "Chest pain"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-1",
            "patient_id": "p-77",
            "role": "Doctor",
            "stage": "completed",
            "completed_at": "2026-10-14T09:30:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let created = gateway
        .create_consultation(&ConsultationCreate {
            patient_id: "p-77".to_string(),
            role: ConsultationRole::Doctor,
        })
        .await
        .unwrap();
    assert_eq!(created.stage.as_deref(), Some("started"));

    let updated = gateway
        .update_consultation(
            &created.id,
            &ConsultationUpdate {
                stage: Some("completed".to_string()),
                confidence: None,
                conversation_history: Some(vec![ConversationMessage::user("Chest pain")]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.completed_at.as_deref(), Some("2026-10-14T09:30:00"));
}

#[tokio::test]
async fn test_request_validation_detail_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "age"], "msg": "value is not a valid integer", "type": "type_error"}]
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .create_patient(&PatientProfile {
            name: "Jane Doe".to_string(),
            medical_record_number: "MRN-1".to_string(),
            age: 45,
            gender: Gender::Female,
            email: None,
            phone: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "age: value is not a valid integer");
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy login</html>"))
        .mount(&server)
        .await;

    let err = gateway(&server).health().await.unwrap_err();
    assert!(matches!(err, CoreError::Parse(_)));
}

#[tokio::test]
async fn test_app_state_from_config_with_env_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = ConfigService::open(dir.path().join("config.json")).unwrap();
    let uri = server.uri();
    config
        .apply_overrides_from(|key| match key {
            k if k == ENV_API_URL => Some(uri.clone()),
            k if k == ENV_TIMEOUT_SECS => Some("5".to_string()),
            _ => None,
        })
        .unwrap();

    let state = AppState::new();
    state.initialize_with(config).await.unwrap();

    let gateway: Arc<dyn ApiGateway> = state.gateway().await.unwrap();
    assert_eq!(gateway.base_url(), server.uri());
    assert_eq!(state.get_config().await.unwrap().request_timeout_secs, 5);
    assert!(state.check_backend().await.unwrap().is_healthy());
}
