//! Core Error Types
//!
//! The error taxonomy shared by every layer of the intake workspace:
//!
//! - `Validation` - client-side, field-attributed, never reaches the network
//! - `Transport` - the backend could not be reached at all
//! - `Server` - the backend answered with a non-success status
//! - `Precondition` - a tool was invoked without its supporting data
//!
//! None of these are fatal; every failure is recoverable by a user retry.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-attributed validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Form field name (e.g. `patient_name`, `age`)
    pub field: String,
    /// User-facing message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered collection of field errors reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Field names in the order they were reported.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// Whether the given field has at least one error.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Distinct messages, preserving first-seen order.
    ///
    /// Age and gender share one demographics message, so it is reported once.
    pub fn messages(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for e in &self.errors {
            if !seen.contains(&e.message.as_str()) {
                seen.push(e.message.as_str());
            }
        }
        seen
    }

    /// Convert into `Err(CoreError::Validation)` when non-empty.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join(" "))
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(err: FieldError) -> Self {
        Self { errors: vec![err] }
    }
}

/// Core error type for the clinical intake workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Client-side input validation failed
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// No connectivity: connection refused, DNS failure, timeout
    #[error("Network error: {message}")]
    Transport { message: String },

    /// Backend answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A tool was invoked without its required supporting data
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a single-field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(FieldError::new(field, message).into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
        }
    }

    /// Create a server error
    pub fn server(status: u16, msg: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: msg.into(),
        }
    }

    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the backend was unreachable (as opposed to answering with an error).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether this error was raised before any network call.
    pub fn is_client_side(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Precondition(_))
    }

    /// Text suitable for showing to the user without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Transport { .. } => {
                "Cannot connect to the medical analysis server. Please try again.".to_string()
            }
            Self::Server { message, .. } => message.clone(),
            Self::Precondition(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
