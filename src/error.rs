//! Error types and result aliases for the travel agent.
//!
//! This module defines the core error type [`TravelError`] and the [`Result`] type alias
//! used throughout the crate. Tool-level failures are normally converted into
//! error-tagged function responses by the agent loop; the variants that escape the
//! loop are the ones a caller has to act on ([`TravelError::UnknownTool`] under the
//! abort policy, [`TravelError::LoopExceeded`], gateway failures).

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which bound stopped an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopLimit {
    /// The model was still requesting tools after this many turns.
    TurnLimit { turns: usize },
    /// The wall-clock deadline for the run elapsed.
    Deadline { after: Duration },
}

impl fmt::Display for LoopLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopLimit::TurnLimit { turns } => {
                write!(f, "model still requesting tools after {} turns", turns)
            }
            LoopLimit::Deadline { after } => {
                write!(f, "deadline of {:?} elapsed", after)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum TravelError {
    #[error("LLM gateway error: {0}")]
    GatewayError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing field '{field}' in {engine} response")]
    MissingField { engine: String, field: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Agent loop exceeded: {0}")]
    LoopExceeded(LoopLimit),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("At capacity: {0}")]
    CapacityExceeded(String),
}

impl TravelError {
    pub fn missing_field(engine: impl Into<String>, field: impl Into<String>) -> Self {
        TravelError::MissingField {
            engine: engine.into(),
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TravelError>;
