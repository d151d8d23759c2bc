//! # CHAINSCRIBE Wallet Library
//!
//! A Rust library that packs a batch of ordinal-style inscriptions onto the
//! Bitcoin chain by building, fee-estimating and signing linked chains of
//! Taproot transactions from a supplied set of funding outputs.
//!
//! Each funding output seeds one chain: a commit transaction locks the funds
//! into a P2TR output committing to the first inscription envelope, then up
//! to 24 reveal transactions each publish one envelope via script-path spend,
//! pay the dust output to the inscription recipient, and forward change to
//! the next commit address (or to the final change address at the tail).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chainscribe_wallet_lib::{ChainInscriber, InscribeRequest};
//!
//! let request = InscribeRequest::new(funding, inscriptions, change_address, network)
//!     .with_commit_fee_rate(2.0)
//!     .with_reveal_fee_rate(2.5);
//!
//! let result = ChainInscriber::new(request).run();
//! if result.success {
//!     for chain in &result.chains {
//!         for tx in &chain.txs {
//!             println!("{} {}", tx.txid, tx.hex);
//!         }
//!     }
//! }
//! ```
//!
//! The engine is synchronous and single-threaded; callers wanting
//! parallelism should run disjoint inscribers. Broadcasting, UTXO discovery
//! and fee bumping are out of scope — the result's [`LastTxInfo`] records
//! carry everything an external RBF module needs.
//!
//! ## Re-exports
//!
//! This crate re-exports `chainscribe-core` types for convenience.

mod assembler;
mod error;
mod estimator;
mod inscriber;
mod planner;
mod result;
mod signer;
mod types;

pub use chainscribe_core::{
    build_envelope_script, EnvelopeError, InscriptionContext, InscriptionPayload,
    DEFAULT_MIN_CHANGE, DEFAULT_REVEAL_VALUE, MAX_INSCRIPTIONS_PER_CHAIN,
    MAX_TRANSACTIONS_PER_CHAIN,
};

pub use error::{InscribeError, Result};
pub use inscriber::ChainInscriber;
pub use result::{ChainRecord, InscribeResult, LastTxInfo, TxOutRecord, TxRecord};
pub use signer::{AuxRand, TxSigner};
pub use types::{AddressKind, FundingUtxo, InscribeRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
