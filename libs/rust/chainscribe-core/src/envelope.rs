//! Ordinals envelope compilation
//!
//! Compiles one inscription into the Taproot leaf script that both commits
//! to the content and makes the leaf spendable by the internal key:
//!
//! ```text
//! <32-byte x-only internal key>
//! OP_CHECKSIG
//! OP_FALSE
//! OP_IF
//!   OP_PUSH "ord"            // protocol ID
//!   0x01 0x01                // content-type tag (single-byte push of 0x01)
//!   OP_PUSH <content-type>   // MIME type
//!   OP_0                     // body tag
//!   OP_PUSH <body_chunk_1>   // data in 520-byte chunks
//!   OP_PUSH <body_chunk_2>
//!   ...
//! OP_ENDIF
//! ```
//!
//! The `OP_FALSE OP_IF ... OP_ENDIF` region is never executed, so the data
//! rides along for free when the leaf is revealed; the leading
//! `<key> OP_CHECKSIG` is what actually gates the spend.

use bitcoin::opcodes::all::{OP_CHECKSIG, OP_ENDIF, OP_IF};
use bitcoin::opcodes::{OP_0, OP_FALSE};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{ScriptBuf, XOnlyPublicKey};

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::{CONTENT_TYPE_TAG, MAX_PUSH_SIZE, PROTOCOL_ID};

/// Build the envelope leaf script for one inscription.
///
/// `internal_key` is the x-only key every envelope in a batch shares; the
/// commit address is fully determined by this key plus the script.
pub fn build_envelope_script(
    internal_key: &XOnlyPublicKey,
    content_type: &str,
    body: &[u8],
) -> EnvelopeResult<ScriptBuf> {
    let content_type_push = PushBytesBuf::try_from(content_type.as_bytes().to_vec())
        .map_err(|_| EnvelopeError::PushTooLarge {
            size: content_type.len(),
        })?;

    let mut builder = Builder::new()
        .push_slice(internal_key.serialize())
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_FALSE)
        .push_opcode(OP_IF)
        .push_slice(PROTOCOL_ID)
        // Tag value carried as a one-byte push, so the wire form is the
        // literal pair 0x01 0x01.
        .push_slice([CONTENT_TYPE_TAG])
        .push_slice(content_type_push)
        .push_opcode(OP_0);

    for chunk in body.chunks(MAX_PUSH_SIZE) {
        let push = PushBytesBuf::try_from(chunk.to_vec())
            .map_err(|_| EnvelopeError::PushTooLarge { size: chunk.len() })?;
        builder = builder.push_slice(push);
    }

    Ok(builder.push_opcode(OP_ENDIF).into_script())
}
