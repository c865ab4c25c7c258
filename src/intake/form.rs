//! Intake Form Model
//!
//! Raw intake inputs as the user typed them. Text inputs are kept verbatim
//! and only interpreted when observations are read or a request is built.
//! BMI is the one derived field and changes only through `derive_bmi`.

use std::fmt;
use std::str::FromStr;

use clinical_intake_core::{
    CoreError, CoreResult, FieldError, Gender, MedicalObservationSet, SmokingStatus,
    ValidationErrors, MAX_PATIENT_AGE,
};

use super::bmi::{classify_bmi, compute_bmi, BmiCategory};
use super::numeric::{parse_integer, parse_measurement, parse_whole};

pub const NAME_REQUIRED_MESSAGE: &str = "Patient Name is required for generating the report.";
pub const DEMOGRAPHICS_REQUIRED_MESSAGE: &str =
    "Clinical demographics (Age, Gender) are required for analysis.";
pub const INVALID_AGE_MESSAGE: &str = "Age must be a whole number between 0 and 120.";

/// Editable form fields, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeField {
    PatientName,
    MedicalRecordNumber,
    Age,
    Gender,
    Height,
    Weight,
    BloodPressure,
    BloodGlucose,
    Hba1c,
    Cholesterol,
    Creatinine,
    Hypertension,
    Diabetes,
    HeartDisease,
    SmokingStatus,
    ChestPain,
    Breathlessness,
    Fatigue,
    Edema,
}

impl IntakeField {
    pub const ALL: [IntakeField; 19] = [
        IntakeField::PatientName,
        IntakeField::MedicalRecordNumber,
        IntakeField::Age,
        IntakeField::Gender,
        IntakeField::Height,
        IntakeField::Weight,
        IntakeField::BloodPressure,
        IntakeField::BloodGlucose,
        IntakeField::Hba1c,
        IntakeField::Cholesterol,
        IntakeField::Creatinine,
        IntakeField::Hypertension,
        IntakeField::Diabetes,
        IntakeField::HeartDisease,
        IntakeField::SmokingStatus,
        IntakeField::ChestPain,
        IntakeField::Breathlessness,
        IntakeField::Fatigue,
        IntakeField::Edema,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IntakeField::PatientName => "patient_name",
            IntakeField::MedicalRecordNumber => "medical_record_number",
            IntakeField::Age => "age",
            IntakeField::Gender => "gender",
            IntakeField::Height => "height",
            IntakeField::Weight => "weight",
            IntakeField::BloodPressure => "blood_pressure",
            IntakeField::BloodGlucose => "blood_glucose",
            IntakeField::Hba1c => "hba1c",
            IntakeField::Cholesterol => "cholesterol",
            IntakeField::Creatinine => "creatinine",
            IntakeField::Hypertension => "hypertension",
            IntakeField::Diabetes => "diabetes",
            IntakeField::HeartDisease => "heart_disease",
            IntakeField::SmokingStatus => "smoking_status",
            IntakeField::ChestPain => "chest_pain",
            IntakeField::Breathlessness => "breathlessness",
            IntakeField::Fatigue => "fatigue",
            IntakeField::Edema => "edema",
        }
    }

    /// Checkbox fields take a `FieldValue::Flag`.
    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            IntakeField::Hypertension
                | IntakeField::Diabetes
                | IntakeField::HeartDisease
                | IntakeField::ChestPain
                | IntakeField::Breathlessness
                | IntakeField::Fatigue
                | IntakeField::Edema
        )
    }
}

impl fmt::Display for IntakeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntakeField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name == "bmi" {
            return Err(CoreError::validation(
                "bmi",
                "BMI is calculated from height and weight and cannot be edited.",
            ));
        }
        IntakeField::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| CoreError::validation(name, format!("Unknown form field: '{}'", name)))
    }
}

/// A value entered into one form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// The intake form's editable state.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeFormModel {
    patient_name: String,
    medical_record_number: String,
    age: String,
    gender: Option<Gender>,
    height: String,
    weight: String,
    blood_pressure: String,
    blood_glucose: String,
    hba1c: String,
    cholesterol: String,
    creatinine: String,
    hypertension: bool,
    diabetes: bool,
    heart_disease: bool,
    smoking_status: SmokingStatus,
    chest_pain: bool,
    breathlessness: bool,
    fatigue: bool,
    edema: bool,
    bmi: Option<f64>,
}

impl Default for IntakeFormModel {
    fn default() -> Self {
        Self {
            patient_name: String::new(),
            medical_record_number: String::new(),
            age: String::new(),
            gender: Some(Gender::Male),
            height: String::new(),
            weight: String::new(),
            blood_pressure: String::new(),
            blood_glucose: String::new(),
            hba1c: String::new(),
            cholesterol: String::new(),
            creatinine: String::new(),
            hypertension: false,
            diabetes: false,
            heart_disease: false,
            smoking_status: SmokingStatus::Never,
            chest_pain: false,
            breathlessness: false,
            fatigue: false,
            edema: false,
            bmi: None,
        }
    }
}

impl IntakeFormModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update one field by its wire name.
    ///
    /// Does not recompute BMI; call `derive_bmi` afterwards.
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> CoreResult<()> {
        let field = name.parse::<IntakeField>()?;
        self.set(field, value.into())
    }

    /// Update one field.
    pub fn set(&mut self, field: IntakeField, value: FieldValue) -> CoreResult<()> {
        match (field.is_flag(), value) {
            (true, FieldValue::Flag(flag)) => {
                *self.flag_slot(field)? = flag;
                Ok(())
            }
            (false, FieldValue::Text(text)) => self.set_text(field, text),
            (true, FieldValue::Text(_)) => Err(CoreError::validation(
                field.name(),
                format!("Field '{}' expects a checked/unchecked value", field),
            )),
            (false, FieldValue::Flag(_)) => Err(CoreError::validation(
                field.name(),
                format!("Field '{}' expects text", field),
            )),
        }
    }

    fn set_text(&mut self, field: IntakeField, text: String) -> CoreResult<()> {
        match field {
            IntakeField::Gender => {
                self.gender = if text.trim().is_empty() {
                    None
                } else {
                    Some(text.parse()?)
                };
            }
            IntakeField::SmokingStatus => {
                self.smoking_status = text.parse()?;
            }
            _ => *self.text_slot(field)? = text,
        }
        Ok(())
    }

    fn text_slot(&mut self, field: IntakeField) -> CoreResult<&mut String> {
        Ok(match field {
            IntakeField::PatientName => &mut self.patient_name,
            IntakeField::MedicalRecordNumber => &mut self.medical_record_number,
            IntakeField::Age => &mut self.age,
            IntakeField::Height => &mut self.height,
            IntakeField::Weight => &mut self.weight,
            IntakeField::BloodPressure => &mut self.blood_pressure,
            IntakeField::BloodGlucose => &mut self.blood_glucose,
            IntakeField::Hba1c => &mut self.hba1c,
            IntakeField::Cholesterol => &mut self.cholesterol,
            IntakeField::Creatinine => &mut self.creatinine,
            other => {
                return Err(CoreError::internal(format!(
                    "Field '{}' has no text storage",
                    other
                )))
            }
        })
    }

    fn flag_slot(&mut self, field: IntakeField) -> CoreResult<&mut bool> {
        Ok(match field {
            IntakeField::Hypertension => &mut self.hypertension,
            IntakeField::Diabetes => &mut self.diabetes,
            IntakeField::HeartDisease => &mut self.heart_disease,
            IntakeField::ChestPain => &mut self.chest_pain,
            IntakeField::Breathlessness => &mut self.breathlessness,
            IntakeField::Fatigue => &mut self.fatigue,
            IntakeField::Edema => &mut self.edema,
            other => {
                return Err(CoreError::internal(format!(
                    "Field '{}' is not a flag",
                    other
                )))
            }
        })
    }

    /// Recompute BMI from height (cm) and weight (kg).
    ///
    /// Clears BMI when either input is missing or not positive. Returns the
    /// new value.
    pub fn derive_bmi(&mut self) -> Option<f64> {
        let height = parse_measurement(&self.height);
        let weight = parse_measurement(&self.weight);
        self.bmi = match (height, weight) {
            (Some(h), Some(w)) => compute_bmi(h, w),
            _ => None,
        };
        self.bmi
    }

    pub fn bmi(&self) -> Option<f64> {
        self.bmi
    }

    pub fn bmi_category(&self) -> Option<BmiCategory> {
        classify_bmi(self.bmi)
    }

    /// Check the fields required before anything is sent.
    ///
    /// Every problem is reported at once: name, then age, then gender.
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = ValidationErrors::new();

        if self.patient_name.trim().is_empty() {
            errors.push(IntakeField::PatientName.name(), NAME_REQUIRED_MESSAGE);
        }
        if self.age.trim().is_empty() {
            errors.push(IntakeField::Age.name(), DEMOGRAPHICS_REQUIRED_MESSAGE);
        } else if self.parsed_age().is_none() {
            errors.push(IntakeField::Age.name(), INVALID_AGE_MESSAGE);
        }
        if self.gender.is_none() {
            errors.push(IntakeField::Gender.name(), DEMOGRAPHICS_REQUIRED_MESSAGE);
        }

        errors.into_result()
    }

    /// Observations whose value falls outside the backend's accepted range.
    ///
    /// Advisory only; out-of-range values are still submitted.
    pub fn range_warnings(&self) -> Vec<FieldError> {
        self.observations()
            .ranged_values()
            .into_iter()
            .filter_map(|(range, value)| {
                let value = value?;
                (!range.contains(value)).then(|| {
                    FieldError::new(
                        range.field,
                        format!(
                            "{} of {} is outside the expected range {}-{} {}",
                            range.label, value, range.min, range.max, range.unit
                        ),
                    )
                })
            })
            .collect()
    }

    /// Interpret the current inputs as an observation set.
    ///
    /// Never fails: unusable numeric inputs become `None`.
    pub fn observations(&self) -> MedicalObservationSet {
        MedicalObservationSet {
            bmi: self.bmi,
            blood_pressure: parse_whole(&self.blood_pressure),
            blood_glucose: parse_measurement(&self.blood_glucose),
            hba1c: parse_measurement(&self.hba1c),
            cholesterol: parse_measurement(&self.cholesterol),
            creatinine: parse_measurement(&self.creatinine),
            hypertension: self.hypertension,
            diabetes: self.diabetes,
            heart_disease: self.heart_disease,
            smoking_status: self.smoking_status,
            chest_pain: self.chest_pain,
            breathlessness: self.breathlessness,
            fatigue: self.fatigue,
            edema: self.edema,
        }
    }

    /// Age as a whole number of years within `0..=120`.
    ///
    /// Read from the leading integer, so "45.5" is 45.
    pub fn parsed_age(&self) -> Option<u8> {
        parse_integer(&self.age)
            .and_then(|a| u8::try_from(a).ok())
            .filter(|a| *a <= MAX_PATIENT_AGE)
    }

    /// Raw text of a text field; `None` for flag fields.
    pub fn text(&self, field: IntakeField) -> Option<&str> {
        let text = match field {
            IntakeField::PatientName => &self.patient_name,
            IntakeField::MedicalRecordNumber => &self.medical_record_number,
            IntakeField::Age => &self.age,
            IntakeField::Height => &self.height,
            IntakeField::Weight => &self.weight,
            IntakeField::BloodPressure => &self.blood_pressure,
            IntakeField::BloodGlucose => &self.blood_glucose,
            IntakeField::Hba1c => &self.hba1c,
            IntakeField::Cholesterol => &self.cholesterol,
            IntakeField::Creatinine => &self.creatinine,
            IntakeField::Gender => return Some(self.gender.map(|g| g.as_str()).unwrap_or("")),
            IntakeField::SmokingStatus => return Some(self.smoking_status.as_str()),
            _ => return None,
        };
        Some(text.as_str())
    }

    /// State of a flag field; `None` for text fields.
    pub fn flag(&self, field: IntakeField) -> Option<bool> {
        match field {
            IntakeField::Hypertension => Some(self.hypertension),
            IntakeField::Diabetes => Some(self.diabetes),
            IntakeField::HeartDisease => Some(self.heart_disease),
            IntakeField::ChestPain => Some(self.chest_pain),
            IntakeField::Breathlessness => Some(self.breathlessness),
            IntakeField::Fatigue => Some(self.fatigue),
            IntakeField::Edema => Some(self.edema),
            _ => None,
        }
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn medical_record_number(&self) -> &str {
        &self.medical_record_number
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn smoking_status(&self) -> SmokingStatus {
        self.smoking_status
    }
}
