//! Clinical Intake Gateway
//!
//! HTTP implementation of `ApiGateway` on top of `reqwest`:
//! - `RestGateway` - one method per backend endpoint
//! - `build_http_client` - client factory applying timeouts and proxy
//! - `errors` - HTTP status and transport failure mapping onto `CoreError`

pub mod errors;
pub mod http_client;
pub mod rest;

pub use errors::{parse_http_error, transport_error};
pub use http_client::build_http_client;
pub use rest::RestGateway;
