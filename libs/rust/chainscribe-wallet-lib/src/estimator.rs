//! Fee & change estimation
//!
//! Sizes a candidate transaction under a plausible witness, multiplies the
//! virtual size by the fee rate (floored at 1 sat/vB), and decides whether a
//! change output survives. The decision needs two passes: dropping the change
//! output shrinks the transaction, so a remainder that cannot fund change at
//! the full size may still be affordable without it.

use bitcoin::{Transaction, Witness};
use tracing::debug;

use chainscribe_core::InscriptionContext;

use crate::error::Result;
use crate::signer::TxSigner;
use crate::types::FundingUtxo;

/// Index of the change output in a reveal candidate (dust sits at 0)
pub(crate) const REVEAL_CHANGE_VOUT: usize = 1;

/// Outcome of estimating a reveal-shaped transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeDecision {
    /// Keep the change output at this value
    Keep { fee: u64, change: u64 },
    /// Drop the change output; fee re-estimated without it
    Drop { fee: u64 },
    /// Even without change the balance cannot cover fee + fixed outputs
    Insufficient,
}

pub(crate) struct FeeEstimator {
    pub fee_rate: f64,
    pub min_change: u64,
}

impl FeeEstimator {
    fn fee_for_vsize(&self, vsize: usize) -> u64 {
        let fee = (vsize as f64 * self.fee_rate).ceil() as u64;
        fee.max(vsize as u64)
    }

    /// Estimate a commit: single funding input, single commitment output.
    ///
    /// The returned value is what the commitment output can carry after the
    /// fee; `None` means the funding output cannot cover the fee at all. The
    /// dry-run signature does not have to verify, it only has to occupy the
    /// bytes the real one will.
    pub(crate) fn estimate_commit(
        &self,
        signer: &mut TxSigner,
        candidate: &Transaction,
        funding: &FundingUtxo,
        key: &bitcoin::PrivateKey,
    ) -> Result<(u64, Option<u64>)> {
        let mut probe = candidate.clone();
        signer.sign_funding_input(&mut probe, 0, funding, key)?;
        let vsize = probe.vsize();
        let fee = self.fee_for_vsize(vsize);
        debug!(vsize, fee, funding = funding.value, "estimated commit");
        Ok((fee, funding.value.checked_sub(fee)))
    }

    /// Estimate a reveal candidate shaped `[dust, change]`.
    pub(crate) fn estimate_reveal(
        &self,
        candidate: &Transaction,
        context: &InscriptionContext,
        total_input: u64,
        fixed_output: u64,
    ) -> ChangeDecision {
        let fee = self.fee_for_vsize(reveal_vsize(candidate, context));
        if let Some(change) = total_input.checked_sub(fixed_output + fee) {
            if change >= self.min_change {
                debug!(fee, change, "estimated reveal");
                return ChangeDecision::Keep { fee, change };
            }
        }

        // Second pass without the change output.
        let mut trimmed = candidate.clone();
        trimmed.output.truncate(REVEAL_CHANGE_VOUT);
        let fee = self.fee_for_vsize(reveal_vsize(&trimmed, context));
        if total_input >= fixed_output + fee {
            debug!(fee, "estimated reveal with change dropped");
            ChangeDecision::Drop { fee }
        } else {
            debug!(fee, total_input, "reveal unaffordable");
            ChangeDecision::Insufficient
        }
    }
}

/// Virtual size of a reveal candidate under its future witness:
/// a zeroed 64-byte signature ahead of the real `[script, control_block]`.
fn reveal_vsize(candidate: &Transaction, context: &InscriptionContext) -> usize {
    let mut probe = candidate.clone();
    let mut witness = Witness::new();
    witness.push([0u8; 64]);
    let [script, control_block] = context.reveal_witness_suffix();
    witness.push(script);
    witness.push(control_block);
    probe.input[0].witness = witness;
    probe.vsize()
}
