//! Data Models
//!
//! Wire and domain models for the intake backend contract.

pub mod appointment;
pub mod artifact;
pub mod assessment;
pub mod consultation;
pub mod conversation;
pub mod health;
pub mod observations;
pub mod patient;
pub mod request;

pub use appointment::*;
pub use artifact::*;
pub use assessment::*;
pub use consultation::*;
pub use conversation::*;
pub use health::*;
pub use observations::*;
pub use patient::*;
pub use request::*;
