//! Conversation Integration Tests
//!
//! Chat ordering, history serialization and failure recovery.

use std::sync::Arc;
use std::time::Duration;

use clinical_intake::services::{ConversationSession, FAILURE_SENTINEL, GREETING};
use clinical_intake_core::testing::{fixtures, MockGateway};
use clinical_intake_core::{
    ApiGateway, AppointmentRequest, ChatRole, ConversationMessage, CoreError, Endpoint,
    MessageRole, TransportSettings,
};
use clinical_intake_gateway::RestGateway;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::init_test_tracing;

#[tokio::test]
async fn test_first_turn_serializes_only_seed() {
    init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(body_json(json!({
            "message": "Hello",
            "history": [{"role": "assistant", "content": GREETING}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::chat_reply("Hi Jane!")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway: Arc<dyn ApiGateway> =
        Arc::new(RestGateway::new(&TransportSettings::new(server.uri())).unwrap());
    let mut session = ConversationSession::new(gateway);

    let reply = session.send_user_message("Hello").await.unwrap();
    assert_eq!(reply.content, "Hi Jane!");
    assert_eq!(
        session.history(),
        &[
            ConversationMessage::bot(GREETING),
            ConversationMessage::user("Hello"),
            ConversationMessage::bot("Hi Jane!"),
        ]
    );
}

#[tokio::test]
async fn test_n_turns_yield_seed_plus_two_n() {
    let mock = Arc::new(MockGateway::new());
    let prompts = ["I have a headache", "Since yesterday", "Book me a doctor"];
    for (i, _) in prompts.iter().enumerate() {
        mock.push_json(Endpoint::Chat, fixtures::chat_reply(&format!("reply {}", i)));
    }
    let mut session = ConversationSession::new(mock.clone());

    for prompt in prompts {
        session.send_user_message(prompt).await.unwrap();
    }

    let history = session.history();
    assert_eq!(history.len(), 1 + 2 * prompts.len());
    for (i, prompt) in prompts.iter().enumerate() {
        assert_eq!(history[1 + 2 * i], ConversationMessage::user(*prompt));
        assert_eq!(history[2 + 2 * i], ConversationMessage::bot(format!("reply {}", i)));
    }

    // Each request carried exactly the history before its own message
    let calls = mock.calls_to(Endpoint::Chat);
    for (i, call) in calls.iter().enumerate() {
        let body = call.body.as_ref().unwrap();
        assert_eq!(body["history"].as_array().unwrap().len(), 1 + 2 * i);
        assert_eq!(body["message"], prompts[i]);
    }
    assert_eq!(calls[1].body.as_ref().unwrap()["history"][1]["role"], "user");
    assert_eq!(calls[1].body.as_ref().unwrap()["history"][2]["role"], "assistant");
}

#[tokio::test]
async fn test_send_while_loading_is_ignored() {
    let mock = Arc::new(MockGateway::new());
    mock.push_json(Endpoint::Chat, fixtures::chat_reply("ok"));
    let mut session = ConversationSession::new(mock.clone());

    let turn = session.begin_send("first").unwrap();
    assert!(session.is_loading());
    assert!(session.begin_send("second").is_none());
    assert!(session.send_user_message("third").await.is_none());
    assert_eq!(session.history().len(), 2);

    let outcome = turn.run().await;
    session.complete(outcome).unwrap();
    assert_eq!(session.history().len(), 3);
    assert_eq!(mock.call_count(Endpoint::Chat), 1);
}

#[tokio::test]
async fn test_transport_failure_appends_sentinel_without_retry() {
    let settings = TransportSettings::new("http://127.0.0.1:9").with_connect_timeout_secs(2);
    let gateway: Arc<dyn ApiGateway> = Arc::new(RestGateway::new(&settings).unwrap());
    let mut session = ConversationSession::new(gateway);

    let reply = session.send_user_message("Are you there?").await.unwrap();
    assert_eq!(reply.role, MessageRole::Bot);
    assert_eq!(reply.content, FAILURE_SENTINEL);
    assert!(!session.is_loading());

    // The session recovers for the next turn
    assert!(session.begin_send("Hello again").is_some());
}

#[tokio::test]
async fn test_serialized_history_roles() {
    let mock = Arc::new(MockGateway::new());
    mock.push_error(Endpoint::Chat, CoreError::server(503, "busy"));
    let mut session = ConversationSession::new(mock.clone());
    session.send_user_message("Hello").await.unwrap();

    let roles: Vec<ChatRole> = session
        .serialize_history()
        .into_iter()
        .map(|e| e.role)
        .collect();
    assert_eq!(roles, vec![ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]);
}

#[tokio::test]
async fn test_book_appointment_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "patient_name": "Jane Doe",
            "department": "Cardiology",
            "preferred_date": "2026-11-02",
            "preferred_time": "09:30",
            "created_at": "2026-10-14T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway: Arc<dyn ApiGateway> =
        Arc::new(RestGateway::new(&TransportSettings::new(server.uri())).unwrap());
    let session = ConversationSession::new(gateway);
    let confirmation = session
        .book_appointment(&AppointmentRequest {
            patient_name: "Jane Doe".to_string(),
            department: "Cardiology".to_string(),
            preferred_date: "2026-11-02".to_string(),
            preferred_time: "09:30".to_string(),
            reason: None,
        })
        .await
        .unwrap();

    assert_eq!(confirmation.id, 3);
    assert_eq!(confirmation.created_at.as_deref(), Some("2026-10-14T10:00:00"));
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_abandoned_send_gets_sentinel_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::chat_reply("too late"))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let gateway: Arc<dyn ApiGateway> =
        Arc::new(RestGateway::new(&TransportSettings::new(server.uri())).unwrap());
    let mut session = ConversationSession::new(gateway);

    let finished = tokio::select! {
        biased;
        _ = session.send_user_message("Hello?") => true,
        _ = tokio::task::yield_now() => false,
    };
    assert!(!finished);

    assert!(!session.is_loading());
    assert_eq!(
        session.history(),
        &[
            ConversationMessage::bot(GREETING),
            ConversationMessage::user("Hello?"),
            ConversationMessage::bot(FAILURE_SENTINEL),
        ]
    );
    assert!(session.begin_send("Still there?").is_some());
}
