//! Client id → registered public key.

pub mod memory;

use std::sync::Arc;

use crate::services::dpop::{DpopError, KeyRecord, PublicKey};

pub use memory::InMemoryKeyRegistry;

/// Storage seam for client bindings.
///
/// One binding per client id; the last successful registration wins.
/// Authenticating the registration call itself is the caller's job.
pub trait KeyRegistry: Send + Sync {
    /// Import `record` and bind it to `client_id`.
    ///
    /// Errors: `MissingField` for a blank client id, `MalformedKey` /
    /// `UnsupportedAlgorithm` when the record cannot be imported.
    fn register(&self, client_id: &str, record: &KeyRecord) -> Result<(), DpopError>;

    /// Key currently bound to `client_id`, or `UnknownClient`.
    fn lookup(&self, client_id: &str) -> Result<Arc<PublicKey>, DpopError>;
}
