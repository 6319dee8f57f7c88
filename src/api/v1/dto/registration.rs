/*
 * Responsibility
 * - Request/response DTOs for POST /register-dpop-key
 * - validate() checks presence only; key structure is checked by the registry
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::dpop::DpopError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeyRequest {
    pub client_id: Option<String>,
    #[serde(alias = "dpopKey")]
    pub public_key: Option<Value>,
}

impl RegisterKeyRequest {
    /// Returns the trimmed client id and the raw JWK.
    pub fn validate(self) -> Result<(String, Value), DpopError> {
        let client_id = self
            .client_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(DpopError::MissingField("clientId"))?;

        let public_key = match self.public_key {
            Some(Value::Null) | None => return Err(DpopError::MissingField("publicKey")),
            Some(key) => key,
        };

        Ok((client_id, public_key))
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterKeyResponse {
    pub status: &'static str,
}

impl RegisterKeyResponse {
    pub fn registered() -> Self {
        Self {
            status: "registered",
        }
    }
}
