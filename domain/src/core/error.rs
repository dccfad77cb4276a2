//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid run state transition for {model}: {from} -> {to}")]
    InvalidTransition {
        model: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid analysis artifact: {0}")]
    InvalidArtifact(String),
}
