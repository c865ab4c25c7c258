//! Services
//!
//! Stateful orchestration over the `ApiGateway`:
//! - `consultation` - form submission lifecycle
//! - `results` - assessment plus the report and explanation tools
//! - `conversation` - assistant chat and appointment booking
//! - `artifact_sink` - delivery targets for generated documents

pub mod artifact_sink;
pub mod consultation;
pub mod conversation;
pub mod results;
pub mod tool_state;

pub use artifact_sink::{ArtifactSink, DeliveredArtifact, FileSystemSink, MemorySink};
pub use consultation::{
    submission_alert, ConsultationWorkflow, SubmissionJob, SubmissionOutcome, SubmissionState,
};
pub use conversation::{ChatOutcome, ChatTurn, ConversationSession, FAILURE_SENTINEL, GREETING};
pub use results::{
    decode_explanation, ExplanationJob, ReportJob, ResultsOrchestrator, ToolCompletion,
};
pub use tool_state::{Ticket, ToolState};
