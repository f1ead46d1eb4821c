//! Session error types

use colloquy_core::{ArgumentId, InvalidRosterError, MalformedDebateError};
use colloquy_provider::GenerationError;

/// Why a session operation was rejected or failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("No debate is loaded")]
    NoActiveDebate,

    #[error("Unknown argument: {0}")]
    UnknownArgument(ArgumentId),

    #[error("Argument already exists: {0}")]
    DuplicateArgument(ArgumentId),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Stage {index} is out of range ({len} stages)")]
    StageOutOfRange { index: usize, len: usize },

    /// `target` names the request kind or the debate being loaded
    #[error("Generation already in flight: {target}")]
    GenerationInFlight { target: String },

    #[error("Malformed debate: {0}")]
    Malformed(#[from] MalformedDebateError),

    #[error(transparent)]
    Roster(#[from] InvalidRosterError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl SessionError {
    /// Whether retrying the same request later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GenerationInFlight { .. }
                | Self::Generation(GenerationError::Timeout(_))
                | Self::Generation(GenerationError::NotAvailable)
                | Self::Generation(GenerationError::Failed(_))
        )
    }
}
