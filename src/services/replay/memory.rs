//! Process-local replay window.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::store::ReplayStore;

/// Lazy purge runs once every this many inserts.
const PURGE_EVERY: u64 = 1024;

/// DashMap-backed replay window keyed by (client id, jti).
///
/// Each entry carries its own expiry (`iat + freshness window`), so the map
/// only ever holds pairs whose proofs could still pass the freshness check.
#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    entries: DashMap<(String, String), i64>,
    inserts: AtomicU64,
}

impl InMemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn check_and_store(&self, client_id: &str, jti: &str, expires_at: i64, now: i64) -> bool {
        let key = (client_id.to_string(), jti.to_string());

        // Entry API holds the shard lock across check and insert.
        let first_time = match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if *entry.get() >= now {
                    false
                } else {
                    // Expired but not swept yet.
                    entry.insert(expires_at);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(expires_at);
                true
            }
        };

        if first_time && self.inserts.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1
        {
            self.purge_expired(now);
        }

        first_time
    }

    fn purge_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at >= now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "purged expired replay entries");
        }
        removed
    }
}
