//! Request and funding types

use bitcoin::{Address, Network, OutPoint, PrivateKey, Script, Txid};

use chainscribe_core::{InscriptionPayload, DEFAULT_MIN_CHANGE, DEFAULT_REVEAL_VALUE};

use crate::error::{InscribeError, Result};

/// Address kinds accepted on funding inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// P2PKH
    Legacy,
    /// P2WPKH
    Segwit,
    /// P2SH-wrapped P2WPKH
    SegwitNested,
    /// P2TR spent via key path
    SegwitTaproot,
}

impl AddressKind {
    /// Classify an output script; anything else is rejected.
    pub fn classify(script: &Script) -> Result<Self> {
        if script.is_p2pkh() {
            Ok(AddressKind::Legacy)
        } else if script.is_p2wpkh() {
            Ok(AddressKind::Segwit)
        } else if script.is_p2sh() {
            Ok(AddressKind::SegwitNested)
        } else if script.is_p2tr() {
            Ok(AddressKind::SegwitTaproot)
        } else {
            Err(InscribeError::UnsupportedAddressType)
        }
    }
}

/// A funding output; each one seeds exactly one chain
#[derive(Debug, Clone)]
pub struct FundingUtxo {
    /// Transaction ID of the funding output
    pub txid: Txid,
    /// Output index
    pub vout: u32,
    /// Value in satoshis
    pub value: u64,
    /// Owning address
    pub address: Address,
    /// Signing key in WIF; watch-only entries are rejected at validation
    pub private_key_wif: String,
}

impl FundingUtxo {
    /// The outpoint this funding entry spends
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }

    /// Decode the signing key
    pub fn signing_key(&self) -> Result<PrivateKey> {
        if self.private_key_wif.is_empty() {
            return Err(InscribeError::Validation(
                "funding entry missing private key".to_string(),
            ));
        }
        PrivateKey::from_wif(&self.private_key_wif)
            .map_err(|e| InscribeError::InvalidKey(e.to_string()))
    }
}

/// A batch inscription request
#[derive(Debug, Clone)]
pub struct InscribeRequest {
    /// Funding outputs, consumed in order
    pub funding: Vec<FundingUtxo>,
    /// Inscriptions, packed into chains in order
    pub inscriptions: Vec<InscriptionPayload>,
    /// Commit transaction fee rate in sat/vB
    pub commit_fee_rate: f64,
    /// Reveal transaction fee rate in sat/vB
    pub reveal_fee_rate: f64,
    /// Value of each dust reveal output, in satoshis
    pub reveal_out_value: u64,
    /// Address receiving the final change of every chain
    pub change_address: Address,
    /// Minimum value a change output must carry, in satoshis
    pub min_change_value: u64,
    /// Network used for derived addresses and result reporting
    pub network: Network,
}

impl InscribeRequest {
    /// Create a request with default dust and fee-rate settings
    pub fn new(
        funding: Vec<FundingUtxo>,
        inscriptions: Vec<InscriptionPayload>,
        change_address: Address,
        network: Network,
    ) -> Self {
        Self {
            funding,
            inscriptions,
            commit_fee_rate: 1.0,
            reveal_fee_rate: 1.0,
            reveal_out_value: DEFAULT_REVEAL_VALUE,
            change_address,
            min_change_value: DEFAULT_MIN_CHANGE,
            network,
        }
    }

    /// Set the commit fee rate in sat/vB
    pub fn with_commit_fee_rate(mut self, rate: f64) -> Self {
        self.commit_fee_rate = rate;
        self
    }

    /// Set the reveal fee rate in sat/vB
    pub fn with_reveal_fee_rate(mut self, rate: f64) -> Self {
        self.reveal_fee_rate = rate;
        self
    }

    /// Set the value of each reveal output
    pub fn with_reveal_out_value(mut self, value: u64) -> Self {
        self.reveal_out_value = value;
        self
    }

    /// Set the minimum change value
    pub fn with_min_change_value(mut self, value: u64) -> Self {
        self.min_change_value = value;
        self
    }

    /// The primary signing key: funding output #0's key.
    ///
    /// Every envelope's internal public key derives from it, whichever UTXO
    /// ends up funding that envelope's chain.
    pub fn primary_key(&self) -> Result<PrivateKey> {
        let funding = self
            .funding
            .first()
            .ok_or_else(|| InscribeError::Validation("funding list is empty".to_string()))?;
        funding.signing_key()
    }

    /// Validate the request before any planning starts
    pub fn validate(&self) -> Result<()> {
        if self.funding.is_empty() {
            return Err(InscribeError::Validation(
                "funding list is empty".to_string(),
            ));
        }
        if self.inscriptions.is_empty() {
            return Err(InscribeError::Validation(
                "inscription list is empty".to_string(),
            ));
        }
        for funding in &self.funding {
            funding.signing_key()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::key::CompressedPublicKey;
    use bitcoin::secp256k1::{Secp256k1, SecretKey};
    use bitcoin::ScriptBuf;
    use std::str::FromStr;

    fn test_key(byte: u8) -> PrivateKey {
        let sk = SecretKey::from_slice(&[byte; 32]).unwrap();
        PrivateKey::new(sk, Network::Testnet)
    }

    fn test_funding(wif: String) -> FundingUtxo {
        let secp = Secp256k1::new();
        let key = test_key(2);
        let pk = CompressedPublicKey(key.inner.public_key(&secp));
        FundingUtxo {
            txid: Txid::from_str("4472899344bce1a6c83c6ec45859f79ab622b55b3faf67e555e3e03cee5139e6")
                .unwrap(),
            vout: 0,
            value: 50_000,
            address: Address::p2wpkh(&pk, Network::Testnet),
            private_key_wif: wif,
        }
    }

    #[test]
    fn test_classify_supported_kinds() {
        let secp = Secp256k1::new();
        let key = test_key(3);
        let pk = bitcoin::PublicKey::new(key.inner.public_key(&secp));
        let compressed = CompressedPublicKey(pk.inner);

        let p2pkh = Address::p2pkh(&pk, Network::Testnet);
        let p2wpkh = Address::p2wpkh(&compressed, Network::Testnet);
        let redeem = ScriptBuf::new_p2wpkh(&compressed.wpubkey_hash());
        let p2sh = Address::p2sh(&redeem, Network::Testnet).unwrap();
        let xonly = key.inner.x_only_public_key(&secp).0;
        let p2tr = Address::p2tr(&secp, xonly, None, Network::Testnet);

        assert_eq!(
            AddressKind::classify(&p2pkh.script_pubkey()).unwrap(),
            AddressKind::Legacy
        );
        assert_eq!(
            AddressKind::classify(&p2wpkh.script_pubkey()).unwrap(),
            AddressKind::Segwit
        );
        assert_eq!(
            AddressKind::classify(&p2sh.script_pubkey()).unwrap(),
            AddressKind::SegwitNested
        );
        assert_eq!(
            AddressKind::classify(&p2tr.script_pubkey()).unwrap(),
            AddressKind::SegwitTaproot
        );
    }

    #[test]
    fn test_classify_rejects_other_scripts() {
        let result = AddressKind::classify(&ScriptBuf::new());
        assert!(matches!(result, Err(InscribeError::UnsupportedAddressType)));
    }

    #[test]
    fn test_missing_private_key_rejected() {
        let funding = test_funding(String::new());
        let err = funding.signing_key().unwrap_err();
        assert!(err.to_string().contains("missing private key"));
    }

    #[test]
    fn test_wif_roundtrip() {
        let key = test_key(2);
        let funding = test_funding(key.to_wif());
        assert_eq!(funding.signing_key().unwrap().inner, key.inner);
    }

    #[test]
    fn test_validate_empty_lists() {
        let key = test_key(2);
        let funding = test_funding(key.to_wif());
        let change = funding.address.clone();

        let request = InscribeRequest::new(vec![], vec![], change.clone(), Network::Testnet);
        assert!(request.validate().is_err());

        let request = InscribeRequest::new(vec![funding], vec![], change, Network::Testnet);
        assert!(request.validate().is_err());
    }
}
