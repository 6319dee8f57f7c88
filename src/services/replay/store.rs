/// Replay window: remembers which (client, jti) pairs were already accepted.
///
/// Implementations must make `check_and_store` a single atomic step per key:
/// of two concurrent presentations of the same pair exactly one gets `true`.
pub trait ReplayStore: Send + Sync {
    // Check whether (`client_id`, `jti`) was already seen and record it otherwise.
    //
    // Returns:
    // - true  => first time (recorded with `expires_at`)
    // - false => replay (an unexpired entry exists)
    fn check_and_store(&self, client_id: &str, jti: &str, expires_at: i64, now: i64) -> bool;

    // Drop entries whose expiry is strictly before `now`. Returns how many were removed.
    fn purge_expired(&self, now: i64) -> usize;
}
