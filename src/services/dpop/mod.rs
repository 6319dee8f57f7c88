//! DPoP proof lifecycle: key provisioning, minting, verification.

pub mod algorithm;
pub mod codec;
pub mod error;
pub mod htu;
pub mod keys;
pub mod minter;
pub mod types;
pub mod verifier;

pub use algorithm::SigningAlgorithm;
pub use error::DpopError;
pub use keys::{KeyPair, KeyRecord, PrivateKey, PublicKey};
pub use minter::ProofMinter;
pub use types::{DPOP_TYP, DecodedProof, MintedProof, ProofClaims, ProofHeader};
pub use verifier::{DpopPolicy, ProofVerifier};
