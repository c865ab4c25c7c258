//! Error Mapping
//!
//! Translates `reqwest` failures and backend error bodies into `CoreError`.
//! The backend is FastAPI, whose error bodies look like `{"detail": "..."}`
//! or, for request validation, `{"detail": [{"loc": [...], "msg": "..."}]}`.

use clinical_intake_core::CoreError;
use serde_json::Value;

/// Map a failed send or body read to a transport error.
pub fn transport_error(err: reqwest::Error) -> CoreError {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    CoreError::transport(format!("{}: {}", kind, err))
}

/// Map a non-success status and its body to a server error.
pub fn parse_http_error(status: u16, body: &str) -> CoreError {
    let message = extract_detail(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("HTTP {}", status)
        } else {
            trimmed.to_string()
        }
    });
    CoreError::server(status, message)
}

/// Pull the human-readable message out of a FastAPI error body.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(f) => format!("{}: {}", f, msg),
                        None => msg.to_string(),
                    })
                })
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        other => Some(other.to_string()),
    }
}
