//! Consultation Models
//!
//! Consultation payloads for `/api/consultations` and the role attached to
//! every analysis request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::conversation::ConversationMessage;
use crate::error::{CoreError, CoreResult};

/// Who is driving the consultation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsultationRole {
    #[default]
    Patient,
    Doctor,
}

impl ConsultationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationRole::Patient => "Patient",
            ConsultationRole::Doctor => "Doctor",
        }
    }
}

impl fmt::Display for ConsultationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsultationRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Patient" | "patient" => Ok(ConsultationRole::Patient),
            "Doctor" | "doctor" => Ok(ConsultationRole::Doctor),
            other => Err(CoreError::validation(
                "role",
                format!("Unknown role: '{}'. Must be 'Patient' or 'Doctor'", other),
            )),
        }
    }
}

/// Body of `POST /api/consultations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationCreate {
    pub patient_id: String,
    pub role: ConsultationRole,
}

/// Body of `PATCH /api/consultations/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ConversationMessage>>,
}

impl ConsultationUpdate {
    pub fn is_empty(&self) -> bool {
        self.stage.is_none() && self.confidence.is_none() && self.conversation_history.is_none()
    }

    /// Confidence must lie in `0.0..=1.0`.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(c) = self.confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(CoreError::validation(
                    "confidence",
                    format!("Confidence must be between 0 and 1, got {}", c),
                ));
            }
        }
        Ok(())
    }
}

/// Stored consultation as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub role: Option<ConsultationRole>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub conversation_history: Vec<Value>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConsultationRecord {
    /// Short report identifier: first dash-separated segment, upper-cased.
    pub fn report_id(&self) -> String {
        self.id
            .split('-')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }
}
