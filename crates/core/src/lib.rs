//! Clinical Intake Core
//!
//! Foundational types for the clinical intake workspace. This crate has no
//! dependency on HTTP, configuration files, or presentation code.
//!
//! ## Module Organization
//!
//! - `error` - Error taxonomy (`CoreError`, `CoreResult`, `ValidationErrors`)
//! - `models` - Wire and domain models shared with the backend contract
//! - `gateway` - The `ApiGateway` transport trait and endpoint table
//! - `transport` - Transport settings (base URL, timeouts, proxy)
//! - `testing` - Scripted `MockGateway` (behind the `test-support` feature)
//!
//! ## Design Principles
//!
//! 1. **Transport-agnostic** - business logic depends on `ApiGateway`, never on `reqwest`
//! 2. **Wire-faithful models** - serde names match the backend contract exactly
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod gateway;
pub mod models;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult, FieldError, ValidationErrors};

// ── Gateway ────────────────────────────────────────────────────────────
pub use gateway::{ApiGateway, Endpoint, HttpMethod};

// ── Transport Settings ─────────────────────────────────────────────────
pub use transport::{ProxyConfig, ProxyProtocol, TransportSettings, DEFAULT_API_BASE_URL};

// ── Models ─────────────────────────────────────────────────────────────
pub use models::*;
