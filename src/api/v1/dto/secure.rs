use serde::Serialize;

use crate::services::dpop::ProofClaims;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureResponse {
    pub message: &'static str,
    pub client_id: String,
    pub claims: ProofClaims,
}
