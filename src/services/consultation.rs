//! Consultation Workflow
//!
//! The submission stage: form -> validated request -> `/api/analyze` ->
//! `ResultsOrchestrator`. Validation failures never reach the gateway.

use std::fmt;
use std::sync::Arc;

use clinical_intake_core::{
    AnalysisEnvelope, AnalysisRequest, ApiGateway, ConsultationRole, CoreError, CoreResult,
};

use crate::intake::{AnalysisRequestBuilder, FieldValue, IntakeField, IntakeFormModel};

use super::results::ResultsOrchestrator;

/// Where the current submission stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Form is editable; nothing submitted or last submission was blocked
    Editing,
    /// Analysis request in flight
    Submitting,
    /// Results are available
    Completed,
    /// Analysis failed; user-facing alert text
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

/// Alert text for a failed submission.
pub fn submission_alert(err: &CoreError, base_url: &str) -> String {
    match err {
        CoreError::Validation(_) => err.user_message(),
        CoreError::Transport { .. } => format!(
            "Cannot connect to the medical analysis server. Please ensure the backend is running at {}",
            base_url
        ),
        other => format!("Error analyzing health data: {}", other.user_message()),
    }
}

/// In-flight `/api/analyze` call.
pub struct SubmissionJob {
    attempt: u64,
    gateway: Arc<dyn ApiGateway>,
    request: AnalysisRequest,
}

impl fmt::Debug for SubmissionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionJob")
            .field("attempt", &self.attempt)
            .field("medical_record_number", &self.request.medical_record_number())
            .finish_non_exhaustive()
    }
}

impl SubmissionJob {
    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }

    pub async fn run(self) -> SubmissionOutcome {
        let result = self.gateway.analyze(&self.request).await;
        SubmissionOutcome {
            attempt: self.attempt,
            request: self.request,
            result,
        }
    }
}

/// Result of a `SubmissionJob`.
#[derive(Debug)]
pub struct SubmissionOutcome {
    attempt: u64,
    pub request: AnalysisRequest,
    pub result: CoreResult<AnalysisEnvelope>,
}

/// One intake form and its submission lifecycle.
pub struct ConsultationWorkflow {
    gateway: Arc<dyn ApiGateway>,
    builder: AnalysisRequestBuilder,
    role: ConsultationRole,
    form: IntakeFormModel,
    state: SubmissionState,
    results: Option<ResultsOrchestrator>,
    pending: Option<u64>,
    attempts: u64,
}

impl fmt::Debug for ConsultationWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsultationWorkflow")
            .field("base_url", &self.gateway.base_url())
            .field("role", &self.role)
            .field("state", &self.state)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

/// Cancels the submission if `submit` is dropped before the outcome lands.
struct PendingSubmission<'a> {
    workflow: Option<&'a mut ConsultationWorkflow>,
}

impl<'a> PendingSubmission<'a> {
    fn finish(mut self, outcome: SubmissionOutcome) -> CoreResult<&'a ResultsOrchestrator> {
        match self.workflow.take() {
            Some(workflow) => workflow.complete_submit(outcome),
            None => Err(CoreError::internal("Submission already finished")),
        }
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if let Some(workflow) = self.workflow.take() {
            workflow.cancel_submit();
        }
    }
}

impl ConsultationWorkflow {
    pub fn new(gateway: Arc<dyn ApiGateway>, role: ConsultationRole) -> Self {
        Self::with_builder(gateway, role, AnalysisRequestBuilder::new())
    }

    pub fn with_builder(
        gateway: Arc<dyn ApiGateway>,
        role: ConsultationRole,
        builder: AnalysisRequestBuilder,
    ) -> Self {
        Self {
            gateway,
            builder,
            role,
            form: IntakeFormModel::new(),
            state: SubmissionState::Editing,
            results: None,
            pending: None,
            attempts: 0,
        }
    }

    pub fn form(&self) -> &IntakeFormModel {
        &self.form
    }

    pub fn role(&self) -> ConsultationRole {
        self.role
    }

    pub fn set_role(&mut self, role: ConsultationRole) {
        self.role = role;
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn results(&self) -> Option<&ResultsOrchestrator> {
        self.results.as_ref()
    }

    pub fn results_mut(&mut self) -> Option<&mut ResultsOrchestrator> {
        self.results.as_mut()
    }

    /// Update a form field, re-deriving BMI when height or weight change.
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> CoreResult<()> {
        let field: IntakeField = name.parse()?;
        self.form.set(field, value.into())?;
        if matches!(field, IntakeField::Height | IntakeField::Weight) {
            self.form.derive_bmi();
        }
        Ok(())
    }

    /// Validate and build the request, entering `Submitting`.
    ///
    /// Validation errors leave the state untouched and send nothing.
    pub fn begin_submit(&mut self) -> CoreResult<SubmissionJob> {
        if self.state.is_submitting() {
            return Err(CoreError::precondition("A submission is already in progress."));
        }

        let request = self.builder.build(&self.form, self.role).map_err(|e| {
            tracing::info!("[ConsultationWorkflow] Submission blocked by validation");
            e
        })?;

        tracing::info!(
            "[ConsultationWorkflow] Submitting analysis for {}",
            request.medical_record_number()
        );
        self.attempts += 1;
        self.pending = Some(self.attempts);
        self.state = SubmissionState::Submitting;
        Ok(SubmissionJob {
            attempt: self.attempts,
            gateway: Arc::clone(&self.gateway),
            request,
        })
    }

    /// Apply the analysis outcome.
    ///
    /// An outcome for a cancelled or superseded submission is a
    /// `Precondition` error and changes nothing.
    pub fn complete_submit(
        &mut self,
        outcome: SubmissionOutcome,
    ) -> CoreResult<&ResultsOrchestrator> {
        if self.pending != Some(outcome.attempt) {
            tracing::debug!(
                "[ConsultationWorkflow] Discarded outcome of submission {}",
                outcome.attempt
            );
            return Err(CoreError::precondition("This submission is no longer in progress."));
        }
        self.pending = None;

        match outcome.result {
            Ok(envelope) => {
                let orchestrator = ResultsOrchestrator::from_submission(
                    Arc::clone(&self.gateway),
                    &outcome.request,
                    envelope,
                );
                self.state = SubmissionState::Completed;
                let results = self.results.insert(orchestrator);
                Ok(&*results)
            }
            Err(err) => {
                let alert = submission_alert(&err, self.gateway.base_url());
                tracing::warn!("[ConsultationWorkflow] Analysis failed: {}", err);
                self.state = SubmissionState::Failed(alert);
                Err(err)
            }
        }
    }

    /// Abandon the in-flight submission and return to `Editing`.
    ///
    /// `false` if nothing was submitting. The form is kept.
    pub fn cancel_submit(&mut self) -> bool {
        let Some(attempt) = self.pending.take() else {
            return false;
        };
        tracing::info!("[ConsultationWorkflow] Submission {} cancelled", attempt);
        self.state = SubmissionState::Editing;
        true
    }

    /// Validate, submit and hand off to a `ResultsOrchestrator`.
    ///
    /// Dropping the returned future mid-flight cancels the submission.
    pub async fn submit(&mut self) -> CoreResult<&ResultsOrchestrator> {
        let job = self.begin_submit()?;
        let guard = PendingSubmission {
            workflow: Some(self),
        };
        let outcome = job.run().await;
        guard.finish(outcome)
    }

    /// Alert to show for the last blocked or failed submission.
    pub fn alert_for(&self, err: &CoreError) -> String {
        submission_alert(err, self.gateway.base_url())
    }

    /// Discard results and start over with an empty form.
    pub fn start_new_assessment(&mut self) {
        self.form = IntakeFormModel::new();
        self.results = None;
        self.pending = None;
        self.state = SubmissionState::Editing;
    }

    /// Return from a failure to editing without clearing the form.
    pub fn acknowledge_failure(&mut self) {
        if matches!(self.state, SubmissionState::Failed(_)) {
            self.state = SubmissionState::Editing;
        }
    }
}
