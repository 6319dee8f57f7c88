//! Signature algorithm families supported for DPoP proofs.
//!
//! Each variant carries the whole capability set for its family (key
//! generation, import checks, sign, verify), so callers switch on the tag once
//! at the crypto boundary.

use std::fmt;
use std::str::FromStr;

use josekit::jwk::Jwk;
use josekit::jws::{ES256, JwsSigner, JwsVerifier, RS256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DpopError;

/// RSA modulus size used for generated keys (and the minimum accepted on import).
pub const RSA_MODULUS_BITS: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[serde(rename = "RS256")]
    Rs256,
    /// ECDSA on P-256 with SHA-256.
    #[serde(rename = "ES256")]
    Es256,
}

impl SigningAlgorithm {
    /// JWS `alg` identifier.
    pub fn name(self) -> &'static str {
        match self {
            SigningAlgorithm::Rs256 => "RS256",
            SigningAlgorithm::Es256 => "ES256",
        }
    }

    /// JWK `kty` of keys belonging to this family.
    pub fn key_type(self) -> &'static str {
        match self {
            SigningAlgorithm::Rs256 => "RSA",
            SigningAlgorithm::Es256 => "EC",
        }
    }

    /// Default algorithm for a JWK key type.
    pub fn for_key_type(kty: &str) -> Result<Self, DpopError> {
        match kty {
            "RSA" => Ok(SigningAlgorithm::Rs256),
            "EC" => Ok(SigningAlgorithm::Es256),
            other => Err(DpopError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Generate a fresh key pair, returned as (private JWK, public JWK).
    ///
    /// The private JWK carries the public members too (EC `x`/`y`).
    pub(crate) fn generate(self) -> Result<(Jwk, Jwk), DpopError> {
        match self {
            SigningAlgorithm::Rs256 => {
                let key_pair = RS256
                    .generate_key_pair(RSA_MODULUS_BITS)
                    .map_err(|e| {
                        debug!(error = %e, "RSA key generation failed");
                        DpopError::KeyGenerationFailed
                    })?;
                Ok((key_pair.to_jwk_key_pair(), key_pair.to_jwk_public_key()))
            }
            SigningAlgorithm::Es256 => {
                let key_pair = ES256.generate_key_pair().map_err(|e| {
                    debug!(error = %e, "P-256 key generation failed");
                    DpopError::KeyGenerationFailed
                })?;
                Ok((key_pair.to_jwk_key_pair(), key_pair.to_jwk_public_key()))
            }
        }
    }

    /// Confirm the backend accepts `jwk` as a signing key for this family.
    pub(crate) fn check_signing_key(self, jwk: &Jwk) -> Result<(), DpopError> {
        let accepted = match self {
            SigningAlgorithm::Rs256 => RS256.signer_from_jwk(jwk).map(|_| ()),
            SigningAlgorithm::Es256 => ES256.signer_from_jwk(jwk).map(|_| ()),
        };
        accepted.map_err(|e| {
            debug!(error = %e, alg = self.name(), "private key rejected");
            DpopError::MalformedKey("private key rejected by crypto backend")
        })
    }

    /// Confirm the backend accepts `jwk` as a verification key for this family.
    pub(crate) fn check_verifying_key(self, jwk: &Jwk) -> Result<(), DpopError> {
        let accepted = match self {
            SigningAlgorithm::Rs256 => RS256.verifier_from_jwk(jwk).map(|_| ()),
            SigningAlgorithm::Es256 => ES256.verifier_from_jwk(jwk).map(|_| ()),
        };
        accepted.map_err(|e| {
            debug!(error = %e, alg = self.name(), "public key rejected");
            DpopError::MalformedKey("public key rejected by crypto backend")
        })
    }

    /// Sign `message`. ES256 output is the fixed-size `r || s` JWS form.
    pub(crate) fn sign(self, private_jwk: &Jwk, message: &[u8]) -> Result<Vec<u8>, DpopError> {
        let signed = match self {
            SigningAlgorithm::Rs256 => RS256
                .signer_from_jwk(private_jwk)
                .and_then(|signer| signer.sign(message)),
            SigningAlgorithm::Es256 => ES256
                .signer_from_jwk(private_jwk)
                .and_then(|signer| signer.sign(message)),
        };
        signed.map_err(|e| {
            debug!(error = %e, alg = self.name(), "signing failed");
            DpopError::SigningFailed
        })
    }

    pub(crate) fn verify(
        self,
        public_jwk: &Jwk,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), DpopError> {
        let verified = match self {
            SigningAlgorithm::Rs256 => RS256
                .verifier_from_jwk(public_jwk)
                .and_then(|verifier| verifier.verify(message, signature)),
            SigningAlgorithm::Es256 => ES256
                .verifier_from_jwk(public_jwk)
                .and_then(|verifier| verifier.verify(message, signature)),
        };
        verified.map_err(|_| DpopError::InvalidSignature)
    }
}

impl FromStr for SigningAlgorithm {
    type Err = DpopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RS256" | "RSA" => Ok(SigningAlgorithm::Rs256),
            "ES256" | "EC" | "ECDSA" | "P-256" => Ok(SigningAlgorithm::Es256),
            _ => Err(DpopError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("RS256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Rs256);
        assert_eq!("es256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Es256);
        assert_eq!("ECDSA".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Es256);
    }

    #[test]
    fn rejects_unknown_family() {
        let err = "HS256".parse::<SigningAlgorithm>().unwrap_err();
        assert_eq!(err, DpopError::UnsupportedAlgorithm("HS256".to_string()));

        let err = SigningAlgorithm::for_key_type("OKP").unwrap_err();
        assert!(matches!(err, DpopError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn generated_private_jwk_includes_public_members() {
        let (private, public) = SigningAlgorithm::Es256.generate().unwrap();
        assert!(private.parameter("d").is_some());
        assert_eq!(private.parameter("x"), public.parameter("x"));
        assert_eq!(private.parameter("y"), public.parameter("y"));

        let (private, public) = SigningAlgorithm::Rs256.generate().unwrap();
        assert!(private.parameter("d").is_some());
        assert_eq!(private.parameter("n"), public.parameter("n"));
    }

    #[test]
    fn name_and_key_type_agree() {
        for alg in [SigningAlgorithm::Rs256, SigningAlgorithm::Es256] {
            assert_eq!(SigningAlgorithm::for_key_type(alg.key_type()).unwrap(), alg);
            assert_eq!(alg.name().parse::<SigningAlgorithm>().unwrap(), alg);
        }
    }
}
