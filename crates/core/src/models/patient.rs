//! Patient Models
//!
//! The submitted patient profile and the stored record the backend returns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Upper bound on accepted patient age.
pub const MAX_PATIENT_AGE: u8 = 120;

/// Administrative gender, as accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Male" | "male" => Ok(Gender::Male),
            "Female" | "female" => Ok(Gender::Female),
            other => Err(CoreError::validation(
                "gender",
                format!("Unknown gender: '{}'. Must be 'Male' or 'Female'", other),
            )),
        }
    }
}

/// Identification and demographics sent with an analysis request.
///
/// Built once per submission and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub name: String,
    pub medical_record_number: String,
    pub age: u8,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Stored patient record returned by `/api/patients` and `/api/analyze`.
///
/// Unknown fields are kept in `extra` so the record can be echoed back
/// to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub medical_record_number: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PatientRecord {
    /// The MRN if the backend stored a non-blank one.
    pub fn mrn(&self) -> Option<&str> {
        self.medical_record_number
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" female ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("Other".parse::<Gender>().is_err());
    }

    #[test]
    fn test_profile_skips_absent_contact_fields() {
        let profile = PatientProfile {
            name: "Jane Doe".to_string(),
            medical_record_number: "MRN-1".to_string(),
            age: 45,
            gender: Gender::Female,
            email: None,
            phone: None,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["gender"], "Female");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let json = serde_json::json!({
            "id": "p-1",
            "name": "Jane Doe",
            "medical_record_number": "  ",
            "age": 45,
            "gender": "Female",
            "insurance_tier": "gold"
        });
        let record: PatientRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.mrn(), None);
        assert_eq!(record.extra["insurance_tier"], "gold");

        let echoed = serde_json::to_value(&record).unwrap();
        assert_eq!(echoed["insurance_tier"], "gold");
    }
}
