//! Chain assembly
//!
//! Builds one chain per funding output: a commit transaction locking the
//! funding value into the first envelope's commitment, then one reveal per
//! inscription. Each reveal pays the dust output at vout 0 and forwards the
//! remainder at vout 1 — to the next inscription's commit address, or to the
//! final change address on the last reveal. Only the last reveal may drop its
//! change output; every other reveal must stay able to feed the next commit.

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use tracing::debug;

use chainscribe_core::InscriptionContext;

use crate::error::{InscribeError, Result};
use crate::estimator::{ChangeDecision, FeeEstimator, REVEAL_CHANGE_VOUT};
use crate::signer::TxSigner;
use crate::types::InscribeRequest;

/// A built transaction with its ledger entry
#[derive(Debug, Clone)]
pub(crate) struct AssembledTx {
    pub tx: Transaction,
    /// Estimated fee recorded for this transaction
    pub fee: u64,
    /// Index into the request's inscription list; `None` for the commit
    pub context_index: Option<usize>,
}

/// One funded chain, commit first
#[derive(Debug, Clone)]
pub(crate) struct Chain {
    pub funding_index: usize,
    pub txs: Vec<AssembledTx>,
}

fn rbf_input(outpoint: OutPoint) -> TxIn {
    TxIn {
        previous_output: outpoint,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        witness: Witness::new(),
    }
}

fn v2_tx(input: Vec<TxIn>, output: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input,
        output,
    }
}

/// Assemble the chain for one funding output over a contiguous slice of
/// inscription contexts. `first_context` is the global index of `contexts[0]`.
pub(crate) fn assemble_chain(
    signer: &mut TxSigner,
    request: &InscribeRequest,
    funding_index: usize,
    contexts: &[InscriptionContext],
    first_context: usize,
) -> Result<Chain> {
    if contexts.is_empty() {
        return Err(InscribeError::Internal(
            "chain planned with no inscriptions".to_string(),
        ));
    }

    let funding = &request.funding[funding_index];
    let key = funding.signing_key()?;

    // Commit: the funding output locked to the first envelope's commitment.
    let commit_estimator = FeeEstimator {
        fee_rate: request.commit_fee_rate,
        min_change: request.min_change_value,
    };
    let mut commit = v2_tx(
        vec![rbf_input(funding.outpoint())],
        vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: contexts[0].commit_script_pubkey.clone(),
        }],
    );
    let (commit_fee, commit_value) =
        commit_estimator.estimate_commit(signer, &commit, funding, &key)?;
    let commit_value = commit_value.ok_or(InscribeError::CommitShortage {
        fee: commit_fee,
        available: funding.value,
    })?;
    commit.output[0].value = Amount::from_sat(commit_value);
    debug!(
        chain = funding_index,
        fee = commit_fee,
        value = commit_value,
        "assembled commit"
    );

    let mut txs = vec![AssembledTx {
        tx: commit,
        fee: commit_fee,
        context_index: None,
    }];
    let mut prev_available = commit_value;
    let mut prev_vout = 0u32;

    let reveal_estimator = FeeEstimator {
        fee_rate: request.reveal_fee_rate,
        min_change: request.min_change_value,
    };

    for (i, context) in contexts.iter().enumerate() {
        let is_last = i == contexts.len() - 1;
        let prev_txid = txs[i].tx.compute_txid();
        let change_script = if is_last {
            request.change_address.script_pubkey()
        } else {
            contexts[i + 1].commit_script_pubkey.clone()
        };

        let mut reveal = v2_tx(
            vec![rbf_input(OutPoint {
                txid: prev_txid,
                vout: prev_vout,
            })],
            vec![
                TxOut {
                    value: Amount::from_sat(request.reveal_out_value),
                    script_pubkey: context.reveal_script_pubkey.clone(),
                },
                TxOut {
                    value: Amount::ZERO,
                    script_pubkey: change_script,
                },
            ],
        );

        match reveal_estimator.estimate_reveal(
            &reveal,
            context,
            prev_available,
            request.reveal_out_value,
        ) {
            ChangeDecision::Keep { fee, change } => {
                reveal.output[REVEAL_CHANGE_VOUT].value = Amount::from_sat(change);
                txs.push(AssembledTx {
                    tx: reveal,
                    fee,
                    context_index: Some(first_context + i),
                });
                prev_available = change;
                prev_vout = REVEAL_CHANGE_VOUT as u32;
            }
            ChangeDecision::Drop { fee } => {
                if !is_last {
                    return Err(InscribeError::NonFinalChangeDropped);
                }
                reveal.output.truncate(REVEAL_CHANGE_VOUT);
                txs.push(AssembledTx {
                    tx: reveal,
                    fee,
                    context_index: Some(first_context + i),
                });
                prev_available = 0;
            }
            ChangeDecision::Insufficient => {
                return Err(InscribeError::ChainBroken {
                    balance: prev_available,
                });
            }
        }
    }

    debug!(
        chain = funding_index,
        transactions = txs.len(),
        remainder = prev_available,
        "assembled chain"
    );
    Ok(Chain {
        funding_index,
        txs,
    })
}
