//! Server-side facade used by the HTTP layer: registry + verifier + replay window.

use std::sync::Arc;

use crate::services::clock::{Clock, SystemClock};
use crate::services::dpop::{DpopError, DpopPolicy, KeyRecord, ProofClaims, ProofVerifier};
use crate::services::registry::{InMemoryKeyRegistry, KeyRegistry};
use crate::services::replay::{InMemoryReplayStore, ReplayStore};

#[derive(Clone)]
pub struct DpopService {
    registry: Arc<dyn KeyRegistry>,
    replay_store: Arc<dyn ReplayStore>,
    verifier: ProofVerifier,
    public_base_url: Option<String>,
}

impl std::fmt::Debug for DpopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DpopService")
            .field("verifier", &self.verifier)
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

impl DpopService {
    pub fn new(
        policy: DpopPolicy,
        registry: Arc<dyn KeyRegistry>,
        replay_store: Arc<dyn ReplayStore>,
        clock: Arc<dyn Clock>,
        public_base_url: Option<String>,
    ) -> Self {
        let verifier = ProofVerifier::with_clock(policy, replay_store.clone(), clock);
        Self {
            registry,
            replay_store,
            verifier,
            public_base_url,
        }
    }

    /// Fresh process-local registry and replay window on the system clock.
    pub fn in_memory(policy: DpopPolicy, public_base_url: Option<String>) -> Self {
        Self::in_memory_with_clock(policy, public_base_url, Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(
        policy: DpopPolicy,
        public_base_url: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            policy,
            Arc::new(InMemoryKeyRegistry::new()),
            Arc::new(InMemoryReplayStore::new()),
            clock,
            public_base_url,
        )
    }

    pub fn register(&self, client_id: &str, record: &KeyRecord) -> Result<(), DpopError> {
        self.registry.register(client_id, record)
    }

    /// Look up the client's key and verify the proof for this request.
    pub fn verify_request(
        &self,
        client_id: &str,
        proof: &str,
        method: &str,
        url: &str,
    ) -> Result<ProofClaims, DpopError> {
        self.verifier
            .verify_for_client(self.registry.as_ref(), client_id, proof, method, url)
    }

    /// Sweep replay entries that can no longer match a fresh proof.
    pub fn purge_expired_replays(&self) -> usize {
        self.replay_store.purge_expired(self.verifier.now())
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }
}
