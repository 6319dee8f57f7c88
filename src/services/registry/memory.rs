use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use super::KeyRegistry;
use crate::services::dpop::{DpopError, KeyRecord, PublicKey, keys};

/// In-process registry.
///
/// Bindings are stored as `Arc<PublicKey>` and replaced wholesale, so a
/// lookup racing a re-registration sees either the old or the new key.
#[derive(Debug, Default)]
pub struct InMemoryKeyRegistry {
    bindings: DashMap<String, Arc<PublicKey>>,
}

impl InMemoryKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl KeyRegistry for InMemoryKeyRegistry {
    fn register(&self, client_id: &str, record: &KeyRecord) -> Result<(), DpopError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(DpopError::MissingField("clientId"));
        }
        // Only the public half may cross the network.
        if record.has_private_material() {
            return Err(DpopError::MalformedKey("private key material in registration"));
        }

        let public_key = keys::import_public(record)?;
        let jkt = public_key.thumbprint()?;
        let alg = public_key.algorithm();

        let replaced = self
            .bindings
            .insert(client_id.to_string(), Arc::new(public_key))
            .is_some();

        info!(client_id, %alg, jkt = %jkt, replaced, "registered DPoP key");
        Ok(())
    }

    fn lookup(&self, client_id: &str) -> Result<Arc<PublicKey>, DpopError> {
        self.bindings
            .get(client_id.trim())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DpopError::UnknownClient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dpop::SigningAlgorithm;

    #[test]
    fn lookup_of_unregistered_client_fails() {
        let registry = InMemoryKeyRegistry::new();
        assert_eq!(
            registry.lookup("nobody").unwrap_err(),
            DpopError::UnknownClient
        );
    }

    #[test]
    fn registered_key_is_returned() {
        let registry = InMemoryKeyRegistry::new();
        let key_pair = keys::generate(SigningAlgorithm::Es256).unwrap();
        let record = keys::export_public(&key_pair);

        registry.register("my-client-id", &record).unwrap();

        let found = registry.lookup("my-client-id").unwrap();
        assert_eq!(found.record(), &record);
        assert_eq!(found.algorithm(), SigningAlgorithm::Es256);
    }

    #[test]
    fn last_registration_wins() {
        let registry = InMemoryKeyRegistry::new();
        let first = keys::export_public(&keys::generate(SigningAlgorithm::Es256).unwrap());
        let second = keys::export_public(&keys::generate(SigningAlgorithm::Rs256).unwrap());

        registry.register("client", &first).unwrap();
        registry.register("client", &second).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("client").unwrap().record(), &second);
    }

    #[test]
    fn blank_client_id_is_a_missing_field() {
        let registry = InMemoryKeyRegistry::new();
        let record = keys::export_public(&keys::generate(SigningAlgorithm::Es256).unwrap());
        assert_eq!(
            registry.register("  ", &record).unwrap_err(),
            DpopError::MissingField("clientId")
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_record_is_rejected_and_not_stored() {
        let registry = InMemoryKeyRegistry::new();
        let mut record = keys::export_public(&keys::generate(SigningAlgorithm::Es256).unwrap());
        record.x = None;

        assert!(matches!(
            registry.register("client", &record),
            Err(DpopError::MalformedKey(_))
        ));
        assert_eq!(registry.lookup("client").unwrap_err(), DpopError::UnknownClient);
    }

    #[test]
    fn private_records_are_refused() {
        let registry = InMemoryKeyRegistry::new();
        let key_pair = keys::generate(SigningAlgorithm::Es256).unwrap();
        assert!(matches!(
            registry.register("client", &keys::export_private(&key_pair)),
            Err(DpopError::MalformedKey(_))
        ));
    }
}
