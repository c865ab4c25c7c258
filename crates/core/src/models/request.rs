//! Analysis Request
//!
//! The normalized body of `POST /api/analyze`.

use serde::{Deserialize, Serialize};

use super::consultation::ConsultationRole;
use super::conversation::ConversationMessage;
use super::observations::MedicalObservationSet;
use super::patient::PatientProfile;

/// One submission's worth of intake data.
///
/// Created once per submission and never mutated after it is sent; the
/// fields are public for reading, and consumers hold it by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(rename = "patient_data")]
    pub patient: PatientProfile,
    #[serde(rename = "medical_data")]
    pub observations: MedicalObservationSet,
    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
    #[serde(default)]
    pub role: ConsultationRole,
}

impl AnalysisRequest {
    pub fn medical_record_number(&self) -> &str {
        &self.patient.medical_record_number
    }
}
