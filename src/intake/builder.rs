//! Analysis Request Builder
//!
//! Normalizes a validated `IntakeFormModel` into the `/api/analyze` body.

use std::fmt;

use clinical_intake_core::{
    AnalysisRequest, ConsultationRole, CoreError, CoreResult, PatientProfile,
};

use super::form::IntakeFormModel;

/// Milliseconds since the Unix epoch.
pub type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Builds `AnalysisRequest`s from form state.
pub struct AnalysisRequestBuilder {
    clock: Clock,
}

impl AnalysisRequestBuilder {
    pub fn new() -> Self {
        Self {
            clock: Box::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Use a custom clock for generated medical record numbers.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Validate the form and build the request.
    ///
    /// A blank MRN becomes `MRN-<epoch ms>`. Optional observations that fail
    /// to parse are sent as null.
    pub fn build(
        &self,
        model: &IntakeFormModel,
        role: ConsultationRole,
    ) -> CoreResult<AnalysisRequest> {
        model.validate()?;

        let age = model
            .parsed_age()
            .ok_or_else(|| CoreError::validation("age", super::form::INVALID_AGE_MESSAGE))?;
        let gender = model.gender().ok_or_else(|| {
            CoreError::validation("gender", super::form::DEMOGRAPHICS_REQUIRED_MESSAGE)
        })?;

        let medical_record_number = match model.medical_record_number().trim() {
            "" => self.generate_mrn(),
            mrn => mrn.to_string(),
        };

        let request = AnalysisRequest {
            patient: PatientProfile {
                name: model.patient_name().trim().to_string(),
                medical_record_number,
                age,
                gender,
                email: None,
                phone: None,
            },
            observations: model.observations(),
            conversation_history: Vec::new(),
            role,
        };

        tracing::debug!(
            "[AnalysisRequestBuilder] Built request for {} ({} role)",
            request.medical_record_number(),
            role
        );
        Ok(request)
    }

    fn generate_mrn(&self) -> String {
        format!("MRN-{}", (self.clock)())
    }
}

impl Default for AnalysisRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnalysisRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisRequestBuilder").finish_non_exhaustive()
    }
}
