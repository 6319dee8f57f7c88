//! Server-side proof verification.
//!
//! Checks run in a fixed order and the first failure is returned:
//! 1. decode            -> MalformedProof
//! 2. typ / alg         -> AlgorithmMismatch
//! 3. signature         -> InvalidSignature
//! 4. htm / htu         -> BindingMismatch
//! 5. iat window        -> ProofExpired / ProofNotYetValid
//! 6. (client, jti)     -> ReplayDetected
//!
//! The replay step runs last so that only fully valid proofs consume a jti.

use std::sync::Arc;

use super::algorithm::SigningAlgorithm;
use super::codec;
use super::error::DpopError;
use super::htu::normalize_htu;
use super::keys::PublicKey;
use super::types::{DPOP_TYP, ProofClaims};
use crate::services::clock::{Clock, SystemClock};
use crate::services::registry::KeyRegistry;
use crate::services::replay::ReplayStore;

/// Maximum accepted age of a proof (now - iat), seconds.
pub const FRESHNESS_WINDOW_SECONDS: i64 = 300;
/// Allowed amount by which iat may run ahead of the server clock, seconds.
pub const CLOCK_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpopPolicy {
    pub freshness_window_seconds: i64,
    pub clock_skew_seconds: i64,
}

impl Default for DpopPolicy {
    fn default() -> Self {
        Self {
            freshness_window_seconds: FRESHNESS_WINDOW_SECONDS,
            clock_skew_seconds: CLOCK_SKEW_SECONDS,
        }
    }
}

#[derive(Clone)]
pub struct ProofVerifier {
    policy: DpopPolicy,
    replay: Arc<dyn ReplayStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProofVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofVerifier")
            .field("policy", &self.policy)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl ProofVerifier {
    pub fn new(policy: DpopPolicy, replay: Arc<dyn ReplayStore>) -> Self {
        Self::with_clock(policy, replay, Arc::new(SystemClock))
    }

    pub fn with_clock(
        policy: DpopPolicy,
        replay: Arc<dyn ReplayStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            replay,
            clock,
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Verify `proof` for a request by `client_id` against `public_key` at time `now`.
    ///
    /// `public_key: None` (no binding for the client) short-circuits to
    /// `UnknownClient` before any decoding or signature work.
    /// On success the proof's jti is recorded and the validated claims returned.
    pub fn verify(
        &self,
        client_id: &str,
        proof: &str,
        expected_method: &str,
        expected_url: &str,
        public_key: Option<&PublicKey>,
        now: i64,
    ) -> Result<ProofClaims, DpopError> {
        let public_key = public_key.ok_or(DpopError::UnknownClient)?;

        let decoded = codec::decode(proof)?;

        if !decoded.header.typ.eq_ignore_ascii_case(DPOP_TYP) {
            return Err(DpopError::AlgorithmMismatch);
        }
        let alg = decoded
            .header
            .alg
            .parse::<SigningAlgorithm>()
            .map_err(|_| DpopError::AlgorithmMismatch)?;
        if alg != public_key.algorithm() || decoded.header.alg != alg.name() {
            return Err(DpopError::AlgorithmMismatch);
        }

        public_key.verify(decoded.signing_input.as_bytes(), &decoded.signature)?;

        let claims = decoded.claims;
        check_binding(&claims, expected_method, expected_url)?;
        self.check_freshness(claims.iat, now)?;

        let expires_at = claims.iat.saturating_add(self.policy.freshness_window_seconds);
        if !self
            .replay
            .check_and_store(client_id, &claims.jti, expires_at, now)
        {
            return Err(DpopError::ReplayDetected);
        }

        Ok(claims)
    }

    /// `verify` at the verifier's own clock.
    pub fn verify_now(
        &self,
        client_id: &str,
        proof: &str,
        expected_method: &str,
        expected_url: &str,
        public_key: Option<&PublicKey>,
    ) -> Result<ProofClaims, DpopError> {
        self.verify(
            client_id,
            proof,
            expected_method,
            expected_url,
            public_key,
            self.clock.now(),
        )
    }

    /// Resolve the client's key through `registry`, then verify.
    pub fn verify_for_client(
        &self,
        registry: &dyn KeyRegistry,
        client_id: &str,
        proof: &str,
        expected_method: &str,
        expected_url: &str,
    ) -> Result<ProofClaims, DpopError> {
        let public_key = registry.lookup(client_id)?;
        self.verify_now(
            client_id,
            proof,
            expected_method,
            expected_url,
            Some(&*public_key),
        )
    }

    fn check_freshness(&self, iat: i64, now: i64) -> Result<(), DpopError> {
        if iat < now.saturating_sub(self.policy.freshness_window_seconds) {
            return Err(DpopError::ProofExpired { iat, now });
        }
        if iat > now.saturating_add(self.policy.clock_skew_seconds) {
            return Err(DpopError::ProofNotYetValid { iat, now });
        }
        Ok(())
    }
}

fn check_binding(
    claims: &ProofClaims,
    expected_method: &str,
    expected_url: &str,
) -> Result<(), DpopError> {
    if !claims.htm.eq_ignore_ascii_case(expected_method.trim()) {
        return Err(DpopError::BindingMismatch);
    }
    // The signed htu must already be canonical; only the expected side is normalized.
    let expected = normalize_htu(expected_url).map_err(|_| DpopError::BindingMismatch)?;
    if claims.htu != expected {
        return Err(DpopError::BindingMismatch);
    }
    Ok(())
}
