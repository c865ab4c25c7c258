//! Medical Observation Models
//!
//! Vitals, labs, history flags, and symptom flags collected at intake.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Smoking history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    #[default]
    Never,
    Former,
    Current,
}

impl SmokingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingStatus::Never => "never",
            SmokingStatus::Former => "former",
            SmokingStatus::Current => "current",
        }
    }
}

impl fmt::Display for SmokingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmokingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(SmokingStatus::Never),
            "former" => Ok(SmokingStatus::Former),
            "current" => Ok(SmokingStatus::Current),
            other => Err(CoreError::validation(
                "smoking_status",
                format!(
                    "Unknown smoking status: '{}'. Must be 'never', 'former', or 'current'",
                    other
                ),
            )),
        }
    }
}

/// Inclusive range the backend accepts for a numeric observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClinicalRange {
    pub field: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

impl ClinicalRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const BMI_RANGE: ClinicalRange = ClinicalRange {
    field: "bmi",
    label: "BMI",
    unit: "kg/m²",
    min: 10.0,
    max: 60.0,
};

pub const BLOOD_PRESSURE_RANGE: ClinicalRange = ClinicalRange {
    field: "blood_pressure",
    label: "Blood Pressure",
    unit: "mmHg",
    min: 60.0,
    max: 250.0,
};

pub const BLOOD_GLUCOSE_RANGE: ClinicalRange = ClinicalRange {
    field: "blood_glucose",
    label: "Blood Glucose",
    unit: "mg/dL",
    min: 50.0,
    max: 500.0,
};

pub const HBA1C_RANGE: ClinicalRange = ClinicalRange {
    field: "hba1c",
    label: "HbA1c",
    unit: "%",
    min: 3.0,
    max: 15.0,
};

pub const CHOLESTEROL_RANGE: ClinicalRange = ClinicalRange {
    field: "cholesterol",
    label: "Cholesterol",
    unit: "mg/dL",
    min: 100.0,
    max: 400.0,
};

pub const CREATININE_RANGE: ClinicalRange = ClinicalRange {
    field: "creatinine",
    label: "Creatinine",
    unit: "mg/dL",
    min: 0.1,
    max: 10.0,
};

/// Observation set sent as `medical_data` and to `/api/explain/heart`.
///
/// Every numeric field is nullable: a blank or unparseable input becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalObservationSet {
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub blood_pressure: Option<u16>,
    #[serde(default)]
    pub blood_glucose: Option<f64>,
    #[serde(default)]
    pub hba1c: Option<f64>,
    #[serde(default)]
    pub cholesterol: Option<f64>,
    #[serde(default)]
    pub creatinine: Option<f64>,

    // Medical history
    #[serde(default)]
    pub hypertension: bool,
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub heart_disease: bool,
    #[serde(default)]
    pub smoking_status: SmokingStatus,

    // Symptoms
    #[serde(default)]
    pub chest_pain: bool,
    #[serde(default)]
    pub breathlessness: bool,
    #[serde(default)]
    pub fatigue: bool,
    #[serde(default)]
    pub edema: bool,
}

impl MedicalObservationSet {
    /// Numeric observations paired with their accepted ranges.
    pub fn ranged_values(&self) -> [(ClinicalRange, Option<f64>); 6] {
        [
            (BMI_RANGE, self.bmi),
            (BLOOD_PRESSURE_RANGE, self.blood_pressure.map(f64::from)),
            (BLOOD_GLUCOSE_RANGE, self.blood_glucose),
            (HBA1C_RANGE, self.hba1c),
            (CHOLESTEROL_RANGE, self.cholesterol),
            (CREATININE_RANGE, self.creatinine),
        ]
    }

    /// Number of symptom flags set.
    pub fn symptom_count(&self) -> usize {
        [self.chest_pain, self.breathlessness, self.fatigue, self.edema]
            .iter()
            .filter(|f| **f)
            .count()
    }
}
