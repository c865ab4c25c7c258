//! Integration Tests Module
//!
//! End-to-end tests for the clinical intake core: form submission through
//! the result tools, the assistant conversation, and the REST gateway
//! against a mock HTTP backend.

// Intake -> analysis -> report/explanation tools
mod workflow_test;

// Assistant chat session
mod conversation_test;

// RestGateway endpoints and AppState wiring
mod gateway_test;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
