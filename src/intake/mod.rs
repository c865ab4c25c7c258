//! Intake
//!
//! Form state, BMI derivation and request building for one submission.

pub mod bmi;
pub mod builder;
pub mod form;
mod numeric;

pub use bmi::{classify_bmi, compute_bmi, BmiCategory};
pub use builder::{AnalysisRequestBuilder, Clock};
pub use form::{
    FieldValue, IntakeField, IntakeFormModel, DEMOGRAPHICS_REQUIRED_MESSAGE,
    INVALID_AGE_MESSAGE, NAME_REQUIRED_MESSAGE,
};
