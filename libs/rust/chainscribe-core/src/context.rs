//! Per-inscription derived state
//!
//! An [`InscriptionContext`] is computed once per payload before any
//! transaction is assembled and never changes afterwards: the fee estimator
//! sizes reveal witnesses from it, the assembler wires commit outputs to it,
//! and the signer replays it when producing the script-path witness.

use bitcoin::secp256k1::{Secp256k1, Verification};
use bitcoin::taproot::{ControlBlock, LeafVersion, TaprootBuilder};
use bitcoin::{Address, Network, ScriptBuf, TapLeafHash, XOnlyPublicKey};
use serde::Serialize;

use crate::envelope::build_envelope_script;
use crate::error::{EnvelopeError, EnvelopeResult};

/// One inscription to be placed on-chain
#[derive(Debug, Clone, Serialize)]
pub struct InscriptionPayload {
    /// MIME type recorded in the envelope (e.g. `text/plain;charset=utf-8`)
    pub content_type: String,
    /// Raw body bytes; chunked into 520-byte pushes
    pub body: Vec<u8>,
    /// Address that receives the dust-valued reveal output
    pub recipient: Address,
}

impl InscriptionPayload {
    /// Create a payload from its parts
    pub fn new(content_type: impl Into<String>, body: Vec<u8>, recipient: Address) -> Self {
        Self {
            content_type: content_type.into(),
            body,
            recipient,
        }
    }
}

/// Everything derived from one payload that build and sign need
#[derive(Debug, Clone)]
pub struct InscriptionContext {
    /// Shared x-only internal key (the primary signing key's public part)
    pub internal_key: XOnlyPublicKey,
    /// Compiled envelope leaf script
    pub script: ScriptBuf,
    /// TapLeaf hash of `script` at leaf version 0xC0
    pub leaf_hash: TapLeafHash,
    /// BIP341 control block for the single-leaf tree (33 bytes)
    pub control_block: ControlBlock,
    /// Bech32m P2TR commit address
    pub commit_address: Address,
    /// Output script of `commit_address`
    pub commit_script_pubkey: ScriptBuf,
    /// Output script paying the reveal recipient
    pub reveal_script_pubkey: ScriptBuf,
}

impl InscriptionContext {
    /// Derive the context for one payload.
    ///
    /// Every payload in a batch uses the same `internal_key`; the commit
    /// addresses differ only through the envelope script.
    pub fn derive<C: Verification>(
        secp: &Secp256k1<C>,
        internal_key: XOnlyPublicKey,
        payload: &InscriptionPayload,
        network: Network,
    ) -> EnvelopeResult<Self> {
        let script = build_envelope_script(&internal_key, &payload.content_type, &payload.body)?;

        let spend_info = TaprootBuilder::new()
            .add_leaf(0, script.clone())
            .map_err(|_| EnvelopeError::TaprootFinalize)?
            .finalize(secp, internal_key)
            .map_err(|_| EnvelopeError::TaprootFinalize)?;

        let control_block = spend_info
            .control_block(&(script.clone(), LeafVersion::TapScript))
            .ok_or(EnvelopeError::TaprootFinalize)?;

        let commit_address = Address::p2tr_tweaked(spend_info.output_key(), network);
        let commit_script_pubkey = commit_address.script_pubkey();
        let leaf_hash = TapLeafHash::from_script(&script, LeafVersion::TapScript);

        Ok(Self {
            internal_key,
            script,
            leaf_hash,
            control_block,
            commit_address,
            commit_script_pubkey,
            reveal_script_pubkey: payload.recipient.script_pubkey(),
        })
    }

    /// The reveal witness stack without its signature: `[script, control_block]`.
    ///
    /// The signer prepends the 64-byte Schnorr signature to produce the full
    /// `[sig, script, control_block]` stack.
    pub fn reveal_witness_suffix(&self) -> [Vec<u8>; 2] {
        [self.script.to_bytes(), self.control_block.serialize()]
    }
}
