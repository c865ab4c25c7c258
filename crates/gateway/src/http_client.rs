//! HTTP Client Factory
//!
//! Builds the `reqwest::Client` used by `RestGateway` from `TransportSettings`.

use clinical_intake_core::{CoreError, CoreResult, TransportSettings};

/// Build a `reqwest::Client` with the configured timeouts and proxy.
///
/// - `proxy: Some(..)` -> route all traffic through it
/// - `proxy: None` -> explicitly disable proxying, ignoring env vars
pub fn build_http_client(settings: &TransportSettings) -> CoreResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = settings.request_timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = settings.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }

    match &settings.proxy {
        Some(cfg) => {
            let mut proxy = reqwest::Proxy::all(cfg.url())
                .map_err(|e| CoreError::config(format!("Invalid proxy URL {}: {}", cfg.url(), e)))?;
            if let Some((user, password)) = cfg.credentials() {
                proxy = proxy.basic_auth(user, password);
            }
            builder = builder.proxy(proxy);
        }
        None => {
            builder = builder.no_proxy();
        }
    }

    builder
        .build()
        .map_err(|e| CoreError::config(format!("Failed to build HTTP client: {}", e)))
}
