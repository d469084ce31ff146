//! Crate-wide error type.
//!
//! Each module defines its own error enum; [`AgentFlowError`] wraps them so
//! callers that touch several modules can use a single `Result`.

use thiserror::Error;

/// Main error type that encompasses all errors raised by the library
#[derive(Debug, Error)]
pub enum AgentFlowError {
    #[error("Graph error: {0}")]
    Graph(#[from] crate::graph::GraphError),

    #[error("Layout error: {0}")]
    Layout(#[from] crate::layout::LayoutError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::chat::TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentFlowError {
    /// Whether the error is the caller's own cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AgentFlowError::Transport(e) if e.is_cancellation())
    }
}

/// Result alias used across the crate
pub type AgentFlowResult<T> = Result<T, AgentFlowError>;
