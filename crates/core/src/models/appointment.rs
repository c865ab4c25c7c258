//! Appointment Models
//!
//! Booking requests relayed through the assistant's appointment endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreResult, ValidationErrors};

/// Body of `POST /api/chat/appointments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub patient_name: String,
    /// Department or specialty, e.g. "Cardiology"
    pub department: String,
    /// Preferred date, `YYYY-MM-DD`
    pub preferred_date: String,
    /// Preferred time, `HH:MM`
    pub preferred_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AppointmentRequest {
    /// Patient name and department are mandatory.
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = ValidationErrors::new();
        if self.patient_name.trim().is_empty() {
            errors.push("patient_name", "Patient name is required to book an appointment.");
        }
        if self.department.trim().is_empty() {
            errors.push("department", "Please choose a department or specialty.");
        }
        errors.into_result()
    }
}

/// Booking confirmation returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentConfirmation {
    pub id: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}
