/*
 * Responsibility
 * - What a handler sees after the DPoP middleware accepted the request
 */
use crate::services::dpop::ProofClaims;

#[derive(Debug, Clone)]
pub struct DpopCtx {
    pub client_id: String,
    pub claims: ProofClaims,
}

impl DpopCtx {
    pub fn new(client_id: String, claims: ProofClaims) -> Self {
        Self { client_id, claims }
    }
}
