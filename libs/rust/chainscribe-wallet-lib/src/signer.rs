//! Funding and script-path signing
//!
//! Two signing paths cover everything the engine produces. The funding input
//! of a commit transaction is signed according to the owning address kind
//! (P2PKH, P2WPKH, nested P2WPKH, or P2TR key path). Every reveal input is a
//! BIP341 script-path spend of the preceding commitment, signed with the raw
//! untweaked primary key and witnessed as `[sig, script, control_block]`.

use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::key::{Keypair, TapTweak};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::sighash::{Prevouts, SighashCache};
use bitcoin::{
    Amount, CompressedPublicKey, EcdsaSighashType, PrivateKey, ScriptBuf, TapSighashType,
    Transaction, TxOut, Witness,
};
use tracing::debug;

use chainscribe_core::InscriptionContext;

use crate::assembler::Chain;
use crate::error::{InscribeError, Result};
use crate::types::{AddressKind, FundingUtxo, InscribeRequest};

/// Source of BIP340 auxiliary randomness
#[derive(Debug, Clone)]
pub enum AuxRand {
    /// Fresh 32 bytes per signature
    Entropy,
    /// Deterministic per-signature bytes derived from a fixed seed;
    /// reproducible runs for tests and fixtures
    Seeded([u8; 32]),
}

/// Stateful signer shared by estimation (dry runs) and the final pass
pub struct TxSigner {
    secp: Secp256k1<All>,
    aux: AuxRand,
    counter: u64,
}

impl TxSigner {
    pub fn new(aux: AuxRand) -> Self {
        Self {
            secp: Secp256k1::new(),
            aux,
            counter: 0,
        }
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    fn next_aux(&mut self) -> [u8; 32] {
        match self.aux {
            AuxRand::Entropy => rand::random(),
            AuxRand::Seeded(seed) => {
                let mut engine = sha256::Hash::engine();
                engine.input(&seed);
                engine.input(&self.counter.to_le_bytes());
                self.counter += 1;
                sha256::Hash::from_engine(engine).to_byte_array()
            }
        }
    }

    /// Sign the funding input of a commit transaction in place.
    ///
    /// Dispatches on the funding address kind; anything outside the four
    /// supported kinds is rejected here, which also makes the fee
    /// estimator's dry run fail early for unusable funding entries.
    pub fn sign_funding_input(
        &mut self,
        tx: &mut Transaction,
        input_index: usize,
        funding: &FundingUtxo,
        key: &PrivateKey,
    ) -> Result<()> {
        let prev_script = funding.address.script_pubkey();
        match AddressKind::classify(&prev_script)? {
            AddressKind::Legacy => self.sign_p2pkh(tx, input_index, &prev_script, key),
            AddressKind::Segwit => self.sign_p2wpkh(tx, input_index, &prev_script, funding.value, key),
            AddressKind::SegwitNested => {
                self.sign_p2sh_p2wpkh(tx, input_index, funding.value, key)
            }
            AddressKind::SegwitTaproot => {
                let prevout = TxOut {
                    value: Amount::from_sat(funding.value),
                    script_pubkey: prev_script,
                };
                self.sign_p2tr_key_path(tx, input_index, &prevout, key)
            }
        }
    }

    fn sign_p2pkh(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        prev_script: &ScriptBuf,
        key: &PrivateKey,
    ) -> Result<()> {
        let sighash = SighashCache::new(&*tx)
            .legacy_signature_hash(input_index, prev_script, EcdsaSighashType::All.to_u32())
            .map_err(|e| InscribeError::Sighash(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = bitcoin::ecdsa::Signature {
            signature: self.secp.sign_ecdsa(&message, &key.inner),
            sighash_type: EcdsaSighashType::All,
        };

        let sig_push = PushBytesBuf::try_from(signature.to_vec())
            .map_err(|_| InscribeError::Internal("oversized signature push".to_string()))?;
        tx.input[input_index].script_sig = Builder::new()
            .push_slice(sig_push)
            .push_slice(key.inner.public_key(&self.secp).serialize())
            .into_script();
        tx.input[input_index].witness = Witness::new();
        Ok(())
    }

    fn sign_p2wpkh(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        prev_script: &ScriptBuf,
        value: u64,
        key: &PrivateKey,
    ) -> Result<()> {
        let sighash = SighashCache::new(&*tx)
            .p2wpkh_signature_hash(
                input_index,
                prev_script,
                Amount::from_sat(value),
                EcdsaSighashType::All,
            )
            .map_err(|e| InscribeError::Sighash(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = bitcoin::ecdsa::Signature {
            signature: self.secp.sign_ecdsa(&message, &key.inner),
            sighash_type: EcdsaSighashType::All,
        };

        tx.input[input_index].script_sig = ScriptBuf::new();
        tx.input[input_index].witness =
            Witness::p2wpkh(&signature, &key.inner.public_key(&self.secp));
        Ok(())
    }

    fn sign_p2sh_p2wpkh(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        value: u64,
        key: &PrivateKey,
    ) -> Result<()> {
        let pubkey = CompressedPublicKey(key.inner.public_key(&self.secp));
        // The redeem script is the implicit P2WPKH program; it doubles as the
        // BIP143 script code source.
        let redeem = ScriptBuf::new_p2wpkh(&pubkey.wpubkey_hash());

        let sighash = SighashCache::new(&*tx)
            .p2wpkh_signature_hash(
                input_index,
                &redeem,
                Amount::from_sat(value),
                EcdsaSighashType::All,
            )
            .map_err(|e| InscribeError::Sighash(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = bitcoin::ecdsa::Signature {
            signature: self.secp.sign_ecdsa(&message, &key.inner),
            sighash_type: EcdsaSighashType::All,
        };

        let redeem_push = PushBytesBuf::try_from(redeem.into_bytes())
            .map_err(|_| InscribeError::Internal("oversized redeem script push".to_string()))?;
        tx.input[input_index].script_sig = Builder::new().push_slice(redeem_push).into_script();
        tx.input[input_index].witness = Witness::p2wpkh(&signature, &pubkey.0);
        Ok(())
    }

    fn sign_p2tr_key_path(
        &mut self,
        tx: &mut Transaction,
        input_index: usize,
        prevout: &TxOut,
        key: &PrivateKey,
    ) -> Result<()> {
        let prevouts = [prevout.clone()];
        let sighash = SighashCache::new(&*tx)
            .taproot_key_spend_signature_hash(
                input_index,
                &Prevouts::All(&prevouts),
                TapSighashType::Default,
            )
            .map_err(|e| InscribeError::Sighash(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());

        // Key-path spends sign with the output-tweaked key (no script tree).
        let keypair = Keypair::from_secret_key(&self.secp, &key.inner);
        let tweaked = keypair.tap_tweak(&self.secp, None);
        let aux = self.next_aux();
        let signature = bitcoin::taproot::Signature {
            signature: self
                .secp
                .sign_schnorr_with_aux_rand(&message, &tweaked.to_inner(), &aux),
            sighash_type: TapSighashType::Default,
        };

        let mut witness = Witness::new();
        witness.push(signature.to_vec());
        tx.input[input_index].witness = witness;
        Ok(())
    }

    /// Sign a reveal input (script-path spend of the previous commitment).
    pub fn sign_reveal_input(
        &mut self,
        tx: &mut Transaction,
        input_index: usize,
        context: &InscriptionContext,
        prevout: &TxOut,
        key: &PrivateKey,
    ) -> Result<()> {
        // A mismatch here means the plan and the contexts have drifted apart;
        // signing anyway would burn the funds.
        if prevout.script_pubkey != context.commit_script_pubkey {
            return Err(InscribeError::ScriptMismatch);
        }

        let prevouts = [prevout.clone()];
        let sighash = SighashCache::new(&*tx)
            .taproot_script_spend_signature_hash(
                input_index,
                &Prevouts::All(&prevouts),
                context.leaf_hash,
                TapSighashType::Default,
            )
            .map_err(|e| InscribeError::Sighash(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());

        // Script-path: the raw untweaked key is the one committed in the leaf.
        let keypair = Keypair::from_secret_key(&self.secp, &key.inner);
        let aux = self.next_aux();
        let signature = bitcoin::taproot::Signature {
            signature: self.secp.sign_schnorr_with_aux_rand(&message, &keypair, &aux),
            sighash_type: TapSighashType::Default,
        };

        let mut witness = Witness::new();
        witness.push(signature.to_vec());
        witness.push(context.script.as_bytes());
        witness.push(context.control_block.serialize());
        tx.input[input_index].witness = witness;
        Ok(())
    }
}

/// Sign every transaction of an assembled chain in order.
///
/// The commit is signed first; for legacy and nested funding its txid shifts
/// when the script_sig lands, so each reveal's outpoint is refreshed from the
/// final txid of its predecessor before that reveal is signed.
pub(crate) fn sign_chain(
    signer: &mut TxSigner,
    request: &InscribeRequest,
    chain: &mut Chain,
    contexts: &[InscriptionContext],
) -> Result<()> {
    let funding = &request.funding[chain.funding_index];
    let key = funding.signing_key()?;
    let primary = request.primary_key()?;

    signer.sign_funding_input(&mut chain.txs[0].tx, 0, funding, &key)?;
    debug!(chain = chain.funding_index, "signed commit input");

    for i in 1..chain.txs.len() {
        let prev_vout = chain.txs[i].tx.input[0].previous_output.vout;
        let (prev_txid, prevout) = {
            let prev = &chain.txs[i - 1].tx;
            (prev.compute_txid(), prev.output[prev_vout as usize].clone())
        };
        chain.txs[i].tx.input[0].previous_output.txid = prev_txid;

        let context_index =
            chain.txs[i]
                .context_index
                .ok_or(InscribeError::MissingContextEntry {
                    chain: chain.funding_index,
                    index: i,
                })?;
        let context = contexts
            .get(context_index)
            .ok_or(InscribeError::MissingContextEntry {
                chain: chain.funding_index,
                index: i,
            })?;

        signer.sign_reveal_input(&mut chain.txs[i].tx, 0, context, &prevout, &primary)?;
    }
    debug!(
        chain = chain.funding_index,
        reveals = chain.txs.len() - 1,
        "signed chain"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::absolute::LockTime;
    use bitcoin::transaction::Version;
    use bitcoin::{Address, Network, OutPoint, Sequence, TxIn, Txid};
    use std::str::FromStr;

    fn test_key(byte: u8) -> PrivateKey {
        let sk = bitcoin::secp256k1::SecretKey::from_slice(&[byte; 32]).unwrap();
        PrivateKey::new(sk, Network::Testnet)
    }

    fn spend_tx() -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint {
                    txid: Txid::from_str(
                        "791b415dc6946d864d368a0e5ec5c09ee2ad39cf298bc6e3f9aec293732cfda7",
                    )
                    .unwrap(),
                    vout: 0,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(9_000),
                script_pubkey: ScriptBuf::new(),
            }],
        }
    }

    fn funding_for(address: Address, key: &PrivateKey) -> FundingUtxo {
        FundingUtxo {
            txid: Txid::from_str("791b415dc6946d864d368a0e5ec5c09ee2ad39cf298bc6e3f9aec293732cfda7")
                .unwrap(),
            vout: 0,
            value: 10_000,
            address,
            private_key_wif: key.to_wif(),
        }
    }

    #[test]
    fn test_sign_p2wpkh_funding() {
        let mut signer = TxSigner::new(AuxRand::Seeded([1; 32]));
        let key = test_key(11);
        let pk = CompressedPublicKey(key.inner.public_key(signer.secp()));
        let funding = funding_for(Address::p2wpkh(&pk, Network::Testnet), &key);

        let mut tx = spend_tx();
        signer.sign_funding_input(&mut tx, 0, &funding, &key).unwrap();

        assert!(tx.input[0].script_sig.is_empty());
        assert_eq!(tx.input[0].witness.len(), 2);
    }

    #[test]
    fn test_sign_p2pkh_funding() {
        let mut signer = TxSigner::new(AuxRand::Seeded([1; 32]));
        let key = test_key(12);
        let pk = bitcoin::PublicKey::new(key.inner.public_key(signer.secp()));
        let funding = funding_for(Address::p2pkh(&pk, Network::Testnet), &key);

        let mut tx = spend_tx();
        signer.sign_funding_input(&mut tx, 0, &funding, &key).unwrap();

        assert!(!tx.input[0].script_sig.is_empty());
        assert!(tx.input[0].witness.is_empty());
    }

    #[test]
    fn test_sign_nested_funding() {
        let mut signer = TxSigner::new(AuxRand::Seeded([1; 32]));
        let key = test_key(13);
        let pk = CompressedPublicKey(key.inner.public_key(signer.secp()));
        let redeem = ScriptBuf::new_p2wpkh(&pk.wpubkey_hash());
        let funding = funding_for(Address::p2sh(&redeem, Network::Testnet).unwrap(), &key);

        let mut tx = spend_tx();
        signer.sign_funding_input(&mut tx, 0, &funding, &key).unwrap();

        // script_sig = one push of the 22-byte witness program.
        assert_eq!(tx.input[0].script_sig.len(), 23);
        assert_eq!(tx.input[0].witness.len(), 2);
    }

    #[test]
    fn test_sign_taproot_key_path_funding() {
        let mut signer = TxSigner::new(AuxRand::Seeded([1; 32]));
        let key = test_key(14);
        let xonly = key.inner.x_only_public_key(signer.secp()).0;
        let funding = funding_for(
            Address::p2tr(signer.secp(), xonly, None, Network::Testnet),
            &key,
        );

        let mut tx = spend_tx();
        signer.sign_funding_input(&mut tx, 0, &funding, &key).unwrap();

        assert!(tx.input[0].script_sig.is_empty());
        assert_eq!(tx.input[0].witness.len(), 1);
        // SIGHASH_DEFAULT signatures carry no trailing type byte.
        assert_eq!(tx.input[0].witness.nth(0).unwrap().len(), 64);
    }

    #[test]
    fn test_reveal_script_mismatch_is_fatal() {
        let mut signer = TxSigner::new(AuxRand::Seeded([1; 32]));
        let key = test_key(15);
        let xonly = key.inner.x_only_public_key(signer.secp()).0;

        let pk = bitcoin::PublicKey::new(key.inner.public_key(signer.secp()));
        let recipient = Address::p2pkh(&pk, Network::Testnet);
        let payload = chainscribe_core::InscriptionPayload::new(
            "text/plain",
            b"x".to_vec(),
            recipient.clone(),
        );
        let context = InscriptionContext::derive(signer.secp(), xonly, &payload, Network::Testnet)
            .unwrap();

        let mut tx = spend_tx();
        let prevout = TxOut {
            value: Amount::from_sat(9_000),
            script_pubkey: recipient.script_pubkey(), // not the commit script
        };
        let err = signer
            .sign_reveal_input(&mut tx, 0, &context, &prevout, &key)
            .unwrap_err();
        assert!(matches!(err, InscribeError::ScriptMismatch));
    }

    #[test]
    fn test_reveal_witness_shape() {
        let mut signer = TxSigner::new(AuxRand::Seeded([1; 32]));
        let key = test_key(16);
        let xonly = key.inner.x_only_public_key(signer.secp()).0;

        let pk = bitcoin::PublicKey::new(key.inner.public_key(signer.secp()));
        let recipient = Address::p2pkh(&pk, Network::Testnet);
        let payload =
            chainscribe_core::InscriptionPayload::new("text/plain", b"x".to_vec(), recipient);
        let context = InscriptionContext::derive(signer.secp(), xonly, &payload, Network::Testnet)
            .unwrap();

        let mut tx = spend_tx();
        let prevout = TxOut {
            value: Amount::from_sat(9_000),
            script_pubkey: context.commit_script_pubkey.clone(),
        };
        signer
            .sign_reveal_input(&mut tx, 0, &context, &prevout, &key)
            .unwrap();

        let witness = &tx.input[0].witness;
        assert_eq!(witness.len(), 3);
        assert_eq!(witness.nth(0).unwrap().len(), 64);
        assert_eq!(witness.nth(1).unwrap(), context.script.as_bytes());
        assert_eq!(witness.nth(2).unwrap().len(), 33);
    }

    #[test]
    fn test_seeded_aux_is_deterministic() {
        let sign_once = || {
            let mut signer = TxSigner::new(AuxRand::Seeded([42; 32]));
            let key = test_key(17);
            let xonly = key.inner.x_only_public_key(signer.secp()).0;
            let pk = bitcoin::PublicKey::new(key.inner.public_key(signer.secp()));
            let recipient = Address::p2pkh(&pk, Network::Testnet);
            let payload =
                chainscribe_core::InscriptionPayload::new("text/plain", b"x".to_vec(), recipient);
            let context =
                InscriptionContext::derive(signer.secp(), xonly, &payload, Network::Testnet)
                    .unwrap();
            let mut tx = spend_tx();
            let prevout = TxOut {
                value: Amount::from_sat(9_000),
                script_pubkey: context.commit_script_pubkey.clone(),
            };
            signer
                .sign_reveal_input(&mut tx, 0, &context, &prevout, &key)
                .unwrap();
            tx.input[0].witness.nth(0).unwrap().to_vec()
        };

        assert_eq!(sign_once(), sign_once());
    }
}
