//! Storage Layer
//!
//! JSON configuration persistence. Session state is never persisted.

pub mod config;

pub use config::*;
