//! Error types for envelope compilation

use thiserror::Error;

/// Errors that can occur while compiling an inscription envelope
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// A single push exceeded the Tapscript element limit
    #[error("push data too large: {size} bytes (max 520)")]
    PushTooLarge { size: usize },

    /// The single-leaf Taproot commitment could not be built
    #[error("taproot commitment could not be finalized")]
    TaprootFinalize,
}

/// Result type for envelope operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
