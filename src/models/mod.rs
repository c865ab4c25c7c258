//! Data Models
//!
//! Application-level models. Wire and domain models shared with the backend
//! live in `clinical_intake_core::models`.

pub mod settings;

pub use settings::*;
