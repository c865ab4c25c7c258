//! Clinical Intake - Orchestration Library
//!
//! Client-side core of the clinical intake application. It includes:
//! - Intake form state, BMI derivation and analysis request building
//! - The submission workflow and the post-analysis result tools
//! - The assistant conversation session
//! - Configuration storage and application state
//!
//! Presentation code drives these types and renders their state.

pub mod intake;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use intake::{
    classify_bmi, compute_bmi, AnalysisRequestBuilder, BmiCategory, FieldValue, IntakeField,
    IntakeFormModel,
};
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::{
    ArtifactSink, ConsultationWorkflow, ConversationSession, FileSystemSink, MemorySink,
    ResultsOrchestrator, SubmissionState, ToolState,
};
pub use state::AppState;
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
