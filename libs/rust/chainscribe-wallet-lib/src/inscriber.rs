//! Batch front door
//!
//! [`ChainInscriber`] drives the fixed build → sign → package sequence over
//! one request. The engine is synchronous and single-threaded; a failed build
//! discards any partially built chains and surfaces only the error envelope.

use bitcoin::key::Keypair;
use bitcoin::XOnlyPublicKey;
use tracing::info;

use chainscribe_core::InscriptionContext;

use crate::assembler::{assemble_chain, Chain};
use crate::error::{InscribeError, Result};
use crate::planner::plan_chains;
use crate::result::{package_result, InscribeResult};
use crate::signer::{sign_chain, AuxRand, TxSigner};
use crate::types::InscribeRequest;

/// Plans, assembles and signs a batch of inscription chains
pub struct ChainInscriber {
    request: InscribeRequest,
    aux: AuxRand,
}

impl ChainInscriber {
    /// Create an inscriber over a request
    pub fn new(request: InscribeRequest) -> Self {
        Self {
            request,
            aux: AuxRand::Entropy,
        }
    }

    /// Use deterministic auxiliary randomness derived from `seed`.
    ///
    /// Repeated runs over the same request then produce byte-identical
    /// transactions, which is what test fixtures want.
    pub fn with_aux_seed(mut self, seed: [u8; 32]) -> Self {
        self.aux = AuxRand::Seeded(seed);
        self
    }

    /// Run the whole batch.
    ///
    /// Never returns partial progress: on any failure the envelope carries
    /// `success = false`, the error message, and empty collections.
    pub fn run(&self) -> InscribeResult {
        match self.try_run() {
            Ok(result) => result,
            Err(err) => InscribeResult::failure(err.to_string()),
        }
    }

    fn try_run(&self) -> Result<InscribeResult> {
        self.request.validate()?;

        let mut signer = TxSigner::new(self.aux.clone());

        // Every envelope keys off funding #0's signing key, regardless of
        // which UTXO ends up funding its chain.
        let primary = self.request.primary_key()?;
        let keypair = Keypair::from_secret_key(signer.secp(), &primary.inner);
        let internal_key = XOnlyPublicKey::from_keypair(&keypair).0;

        let contexts: Vec<InscriptionContext> = self
            .request
            .inscriptions
            .iter()
            .map(|payload| {
                InscriptionContext::derive(
                    signer.secp(),
                    internal_key,
                    payload,
                    self.request.network,
                )
                .map_err(InscribeError::from)
            })
            .collect::<Result<_>>()?;

        info!(
            inscriptions = contexts.len(),
            fundings = self.request.funding.len(),
            "planning inscription chains"
        );
        let layouts = plan_chains(contexts.len(), self.request.funding.len())?;

        let mut chains: Vec<Chain> = Vec::with_capacity(layouts.len());
        for layout in &layouts {
            let slice =
                &contexts[layout.first_inscription..layout.first_inscription + layout.count];
            chains.push(assemble_chain(
                &mut signer,
                &self.request,
                layout.funding_index,
                slice,
                layout.first_inscription,
            )?);
        }

        for chain in &mut chains {
            sign_chain(&mut signer, &self.request, chain, &contexts)?;
        }

        info!(chains = chains.len(), "batch built and signed");
        package_result(&self.request, &chains, &contexts)
    }
}
