//! Error types for the chain engine

use thiserror::Error;

/// Result type for inscription chain operations
pub type Result<T> = std::result::Result<T, InscribeError>;

/// Errors raised while planning, assembling or signing inscription chains
#[derive(Error, Debug)]
pub enum InscribeError {
    /// Request failed up-front validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Not enough funding outputs for the requested batch
    #[error("UTXO count {available} insufficient for {required} inscriptions")]
    UtxoCountInsufficient { available: usize, required: usize },

    /// The funding output cannot even cover the commit's own fee
    #[error("commit value cannot cover its own fee: fee {fee} sats, funding {available} sats")]
    CommitShortage { fee: u64, available: u64 },

    /// A reveal cannot cover fee plus dust even with change dropped
    #[error("chain broken: balance {balance} cannot cover reveal fee + dust")]
    ChainBroken { balance: u64 },

    /// Change would have to be dropped before the final reveal
    #[error("non-final reveal must carry change")]
    NonFinalChangeDropped,

    /// Funding address is not one of the four supported kinds
    #[error("unsupported funding address type")]
    UnsupportedAddressType,

    /// The committed output does not match the inscription context
    #[error("script mismatch between committed output and inscription context")]
    ScriptMismatch,

    /// A reveal transaction has no context recorded for it
    #[error("missing context entry for transaction {chain}:{index}")]
    MissingContextEntry { chain: usize, index: usize },

    /// A funding private key failed to decode
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Envelope compilation or Taproot commitment failure
    #[error("envelope error: {0}")]
    Envelope(#[from] chainscribe_core::EnvelopeError),

    /// Sighash computation failed
    #[error("sighash computation failed: {0}")]
    Sighash(String),

    /// Internal invariant violated; aborts the whole operation
    #[error("internal invariant violated: {0}")]
    Internal(String),
}
