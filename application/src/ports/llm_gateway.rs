//! LLM Gateway port
//!
//! Defines the interface for communicating with the LLM backend.

use async_trait::async_trait;
use themis_domain::Model;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether the same request may succeed if sent again.
    ///
    /// Network faults, timeouts, empty completions and server-side (5xx)
    /// errors are transient. A missing model never is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::Timeout | Self::EmptyResponse => true,
            Self::Http { status, .. } => *status >= 500,
            Self::ModelNotAvailable(_) | Self::InvalidResponse(_) => false,
        }
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to the backend.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one prompt and return the full completion
    async fn complete(&self, model: &Model, prompt: &str) -> Result<String, GatewayError>;

    /// Models the backend currently serves, in the backend's order
    async fn available_models(&self) -> Result<Vec<Model>, GatewayError>;

    /// Backend version string, used as a reachability probe
    async fn server_version(&self) -> Result<String, GatewayError>;
}
