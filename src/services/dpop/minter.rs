//! Client-side proof construction.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use tracing::debug;

use super::algorithm::SigningAlgorithm;
use super::codec;
use super::error::DpopError;
use super::htu::{normalize_htu, normalize_method};
use super::keys::PrivateKey;
use super::types::{MintedProof, ProofClaims, ProofHeader};
use crate::services::clock::{Clock, SystemClock};

/// Random bytes behind each `jti`.
const JTI_BYTES: usize = 32;

/// Builds fresh proofs bound to one method + URL.
///
/// A proof is valid only for the request it was minted for; mint one per request.
#[derive(Debug, Clone)]
pub struct ProofMinter {
    clock: Arc<dyn Clock>,
}

impl Default for ProofMinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofMinter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Mint a proof and return its compact form.
    pub fn mint(
        &self,
        private_key: &PrivateKey,
        algorithm: SigningAlgorithm,
        method: &str,
        url: &str,
    ) -> Result<String, DpopError> {
        self.mint_with_claims(private_key, algorithm, method, url)
            .map(|minted| minted.proof)
    }

    /// Mint a proof and also hand back the claims it carries.
    pub fn mint_with_claims(
        &self,
        private_key: &PrivateKey,
        algorithm: SigningAlgorithm,
        method: &str,
        url: &str,
    ) -> Result<MintedProof, DpopError> {
        // The key can only produce signatures of its own family.
        if private_key.algorithm() != algorithm {
            debug!(
                key_alg = %private_key.algorithm(),
                requested = %algorithm,
                "algorithm does not match signing key"
            );
            return Err(DpopError::SigningFailed);
        }

        let header = ProofHeader::new(algorithm.name());
        let claims = ProofClaims {
            htm: normalize_method(method)?,
            htu: normalize_htu(url)?,
            jti: fresh_jti()?,
            iat: self.clock.now(),
        };

        let signing_input = codec::signing_input(&header, &claims)?;
        let signature = private_key.sign(signing_input.as_bytes())?;

        Ok(MintedProof {
            proof: codec::attach_signature(&signing_input, &signature),
            claims,
        })
    }
}

/// 256 bits from the OS RNG, base64url.
pub fn fresh_jti() -> Result<String, DpopError> {
    let mut bytes = [0u8; JTI_BYTES];
    getrandom::fill(&mut bytes).map_err(|_| DpopError::SigningFailed)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
