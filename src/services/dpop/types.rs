use serde::{Deserialize, Serialize};

/// Literal carried in the `typ` header of every proof.
pub const DPOP_TYP: &str = "dpop+jwt";

/// Protected header of a DPoP proof.
///
/// Field order is the serialization order, which keeps encoding deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofHeader {
    pub typ: String, // must be "dpop+jwt"
    pub alg: String, // "RS256" or "ES256"
}

impl ProofHeader {
    pub fn new(alg: &str) -> Self {
        Self {
            typ: DPOP_TYP.to_string(),
            alg: alg.to_string(),
        }
    }
}

/// Signed payload of a DPoP proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofClaims {
    pub htm: String, // HTTP method, uppercase
    pub htu: String, // normalized target URL
    pub jti: String, // unique proof id (replay detection)
    pub iat: i64,    // issued at (unix seconds)
}

/// A proof split back into its parts.
///
/// `signing_input` borrows the first two segments exactly as received so the
/// signature is checked over the transmitted bytes, never a re-encoding.
#[derive(Debug, Clone)]
pub struct DecodedProof<'a> {
    pub header: ProofHeader,
    pub claims: ProofClaims,
    pub signing_input: &'a str,
    pub signature: Vec<u8>,
}

/// Result of minting: the compact proof plus the claims it carries.
#[derive(Debug, Clone)]
pub struct MintedProof {
    pub proof: String,
    pub claims: ProofClaims,
}
