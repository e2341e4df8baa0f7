//! Shared types for the exam simulator: error taxonomy, configuration,
//! session state and the evaluation transcript.
pub mod error;
pub mod session;
pub mod transcript;
pub mod utils;
