//! Result packaging
//!
//! Turns signed chains into a serializable envelope: per-chain transaction
//! hex and txids, the aggregate estimated fee, and one [`LastTxInfo`] per
//! chain with everything an external fee-bump module needs to rebuild and
//! re-sign the final reveal.

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::Hash;
use bitcoin::Network;
use serde::{Deserialize, Serialize};

use chainscribe_core::InscriptionContext;

use crate::assembler::Chain;
use crate::error::{InscribeError, Result};
use crate::types::InscribeRequest;

/// One finished transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    /// Transaction ID
    pub txid: String,
    /// Raw transaction hex
    pub hex: String,
    /// Estimated fee in satoshis
    pub fee: u64,
}

/// One finished chain, commit first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRecord {
    pub txs: Vec<TxRecord>,
}

/// An output of the final reveal as (script, value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutRecord {
    /// Output script hex
    pub pk_script: String,
    /// Value in satoshis
    pub value: u64,
}

/// Self-contained context for fee-bumping a chain's final reveal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTxInfo {
    /// Txid of the final reveal
    pub txid: String,
    /// Raw hex of the final reveal
    pub hex: String,
    /// Estimated fee of the final reveal in satoshis
    pub estimated_fee: u64,
    /// Txid of the spent commit/reveal output
    pub spent_txid: String,
    /// Vout of the spent output
    pub spent_vout: u32,
    /// Value of the spent output in satoshis
    pub spent_value: u64,
    /// All outputs of the final reveal
    pub outputs: Vec<TxOutRecord>,
    /// Signing key in WIF (the primary key; reveals are script-path spends)
    pub signing_private_key_wif: String,
    /// Final change address
    pub change_address: String,
    /// `"mainnet"` or `"testnet"`
    pub network_type: String,
    /// Reveal output value in force for this run
    pub reveal_out_value: u64,
    /// Minimum change value in force for this run
    pub min_change_value: u64,
    /// Hex of the spent commitment's output script
    pub prev_input_pk_script: String,
    /// Hex of the reveal recipient's output script
    pub reveal_pk_script: String,
    /// Hex of the final change output script
    pub final_change_pk_script: String,
    /// Hex of the envelope's TapLeaf hash
    pub leaf_hash: String,
}

/// Result envelope for a whole batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InscribeResult {
    /// Whether the batch was fully built and signed
    pub success: bool,
    /// Error message when `success` is false
    pub error: Option<String>,
    /// Finished chains in planning order
    pub chains: Vec<ChainRecord>,
    /// Sum of all per-transaction estimated fees
    pub total_estimated_fee: u64,
    /// One fee-bump context per chain
    pub last_tx_details: Vec<LastTxInfo>,
}

impl InscribeResult {
    /// Failure envelope: no partial progress is ever exposed.
    pub(crate) fn failure(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            chains: Vec::new(),
            total_estimated_fee: 0,
            last_tx_details: Vec::new(),
        }
    }
}

fn network_type(network: Network) -> &'static str {
    if network == Network::Bitcoin {
        "mainnet"
    } else {
        "testnet"
    }
}

/// Package signed chains into the result envelope.
pub(crate) fn package_result(
    request: &InscribeRequest,
    chains: &[Chain],
    contexts: &[InscriptionContext],
) -> Result<InscribeResult> {
    let signing_wif = request.primary_key()?.to_wif();
    let final_change_script = request.change_address.script_pubkey();

    let mut records = Vec::with_capacity(chains.len());
    let mut last_tx_details = Vec::with_capacity(chains.len());
    let mut total_estimated_fee = 0u64;

    for chain in chains {
        let txs: Vec<TxRecord> = chain
            .txs
            .iter()
            .map(|assembled| TxRecord {
                txid: assembled.tx.compute_txid().to_string(),
                hex: serialize_hex(&assembled.tx),
                fee: assembled.fee,
            })
            .collect();
        total_estimated_fee += txs.iter().map(|tx| tx.fee).sum::<u64>();

        let last_index = chain.txs.len() - 1;
        if last_index == 0 {
            return Err(InscribeError::Internal(
                "chain shorter than commit + reveal".to_string(),
            ));
        }
        let last = &chain.txs[last_index];
        let prev = &chain.txs[last_index - 1];
        let spent = last.tx.input[0].previous_output;
        let spent_value = prev
            .tx
            .output
            .get(spent.vout as usize)
            .ok_or_else(|| InscribeError::Internal("spent vout out of range".to_string()))?
            .value
            .to_sat();
        let context_index = last
            .context_index
            .ok_or(InscribeError::MissingContextEntry {
                chain: chain.funding_index,
                index: last_index,
            })?;
        let context = contexts
            .get(context_index)
            .ok_or(InscribeError::MissingContextEntry {
                chain: chain.funding_index,
                index: last_index,
            })?;

        last_tx_details.push(LastTxInfo {
            txid: txs[last_index].txid.clone(),
            hex: txs[last_index].hex.clone(),
            estimated_fee: last.fee,
            spent_txid: spent.txid.to_string(),
            spent_vout: spent.vout,
            spent_value,
            outputs: last
                .tx
                .output
                .iter()
                .map(|out| TxOutRecord {
                    pk_script: hex::encode(out.script_pubkey.as_bytes()),
                    value: out.value.to_sat(),
                })
                .collect(),
            signing_private_key_wif: signing_wif.clone(),
            change_address: request.change_address.to_string(),
            network_type: network_type(request.network).to_string(),
            reveal_out_value: request.reveal_out_value,
            min_change_value: request.min_change_value,
            prev_input_pk_script: hex::encode(context.commit_script_pubkey.as_bytes()),
            reveal_pk_script: hex::encode(context.reveal_script_pubkey.as_bytes()),
            final_change_pk_script: hex::encode(final_change_script.as_bytes()),
            leaf_hash: hex::encode(context.leaf_hash.to_byte_array()),
        });

        records.push(ChainRecord { txs });
    }

    Ok(InscribeResult {
        success: true,
        error: None,
        chains: records,
        total_estimated_fee,
        last_tx_details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_type_strings() {
        assert_eq!(network_type(Network::Bitcoin), "mainnet");
        assert_eq!(network_type(Network::Testnet), "testnet");
        assert_eq!(network_type(Network::Regtest), "testnet");
    }

    #[test]
    fn test_failure_envelope_is_empty() {
        let result = InscribeResult::failure("boom".to_string());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(result.chains.is_empty());
        assert!(result.last_tx_details.is_empty());
        assert_eq!(result.total_estimated_fee, 0);
    }

    #[test]
    fn test_result_envelope_serializes() {
        let result = InscribeResult::failure("no funds".to_string());
        let json = serde_json::to_string(&result).unwrap();
        let back: InscribeResult = serde_json::from_str(&json).unwrap();
        assert!(!back.success);
        assert_eq!(back.error.as_deref(), Some("no funds"));
    }
}
