//! Error kinds shared by key provisioning, minting, verification and the registry.
//!
//! Every variant is terminal. Callers outside the core decide how to surface
//! them; verification failures must reach the client as one opaque rejection.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DpopError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("malformed key: {0}")]
    MalformedKey(&'static str),
    #[error("malformed DPoP proof")]
    MalformedProof,
    #[error("DPoP alg/typ does not match the registered key")]
    AlgorithmMismatch,
    #[error("invalid DPoP proof signature")]
    InvalidSignature,
    #[error("htm/htu mismatch")]
    BindingMismatch,
    #[error("DPoP proof expired (iat={iat}, now={now})")]
    ProofExpired { iat: i64, now: i64 },
    #[error("DPoP proof not yet valid (iat={iat}, now={now})")]
    ProofNotYetValid { iat: i64, now: i64 },
    #[error("DPoP proof replay detected")]
    ReplayDetected,
    #[error("unknown client")]
    UnknownClient,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("signing failed")]
    SigningFailed,
    #[error("key generation failed")]
    KeyGenerationFailed,
    #[error("target is not an absolute http(s) URL")]
    MalformedUrl,
    #[error("method is not an HTTP token")]
    MalformedMethod,
}

impl DpopError {
    /// True for the failures of proof verification proper.
    ///
    /// These are logged with their precise kind but must be reported to the
    /// presenter as a single undifferentiated rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DpopError::MalformedProof
                | DpopError::AlgorithmMismatch
                | DpopError::InvalidSignature
                | DpopError::BindingMismatch
                | DpopError::ProofExpired { .. }
                | DpopError::ProofNotYetValid { .. }
                | DpopError::ReplayDetected
        )
    }

    /// Stable machine-readable name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DpopError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            DpopError::MalformedKey(_) => "malformed_key",
            DpopError::MalformedProof => "malformed_proof",
            DpopError::AlgorithmMismatch => "algorithm_mismatch",
            DpopError::InvalidSignature => "invalid_signature",
            DpopError::BindingMismatch => "binding_mismatch",
            DpopError::ProofExpired { .. } => "proof_expired",
            DpopError::ProofNotYetValid { .. } => "proof_not_yet_valid",
            DpopError::ReplayDetected => "replay_detected",
            DpopError::UnknownClient => "unknown_client",
            DpopError::MissingField(_) => "missing_field",
            DpopError::SigningFailed => "signing_failed",
            DpopError::KeyGenerationFailed => "key_generation_failed",
            DpopError::MalformedUrl => "malformed_url",
            DpopError::MalformedMethod => "malformed_method",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_kinds_are_rejections() {
        assert!(DpopError::ReplayDetected.is_rejection());
        assert!(DpopError::ProofExpired { iat: 0, now: 301 }.is_rejection());
        assert!(DpopError::InvalidSignature.is_rejection());
    }

    #[test]
    fn registry_and_provisioning_kinds_are_not_rejections() {
        assert!(!DpopError::UnknownClient.is_rejection());
        assert!(!DpopError::MissingField("clientId").is_rejection());
        assert!(!DpopError::MalformedKey("x").is_rejection());
        assert!(!DpopError::SigningFailed.is_rejection());
    }
}
