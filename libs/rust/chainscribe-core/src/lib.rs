//! CHAINSCRIBE Core Library
//!
//! This crate provides the protocol-level building blocks for packing
//! batches of ordinal-style inscriptions into linked chains of Taproot
//! transactions: the ordinals envelope compiler, the single-leaf Taproot
//! commitment, and the per-inscription context record that the planner,
//! estimator and signer share.
//!
//! # Example
//!
//! ```ignore
//! use chainscribe_core::{build_envelope_script, InscriptionContext, InscriptionPayload};
//!
//! let payload = InscriptionPayload::new("text/plain", b"hello".to_vec(), recipient);
//! let context = InscriptionContext::derive(&secp, internal_key, &payload, network)?;
//! println!("commit to {}", context.commit_address);
//! ```

mod context;
mod envelope;
mod error;

pub use context::*;
pub use envelope::*;
pub use error::*;

/// Protocol identifier pushed at the top of every envelope
pub const PROTOCOL_ID: [u8; 3] = *b"ord";

/// Envelope tag introducing the content type
pub const CONTENT_TYPE_TAG: u8 = 1;

/// Maximum push data size in Tapscript
pub const MAX_PUSH_SIZE: usize = 520;

/// Mempool ancestor/descendant policy cap on one chain
pub const MAX_TRANSACTIONS_PER_CHAIN: usize = 25;

/// Inscriptions one chain can carry (one commit plus up to 24 reveals)
pub const MAX_INSCRIPTIONS_PER_CHAIN: usize = MAX_TRANSACTIONS_PER_CHAIN - 1;

/// Default value of the dust-valued reveal output, in satoshis
pub const DEFAULT_REVEAL_VALUE: u64 = 546;

/// Default minimum value for a change output, in satoshis
pub const DEFAULT_MIN_CHANGE: u64 = 546;
