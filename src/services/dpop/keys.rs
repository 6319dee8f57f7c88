//! Key pair provisioning and the JWK-shaped interchange record.
//!
//! `KeyRecord` is the only representation of key material that is persisted
//! or transmitted. Public records travel to the registry; private records stay
//! with the holder.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use josekit::jwk::Jwk;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::algorithm::{RSA_MODULUS_BITS, SigningAlgorithm};
use super::error::DpopError;

/// P-256 coordinate / scalar length in bytes.
const P256_FIELD_LEN: usize = 32;
const P256_CURVE: &str = "P-256";

/// JWK-shaped key record (RFC 7517 member names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    // EC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    // RSA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    // private (EC: d; RSA: d, p, q, dp, dq, qi)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl KeyRecord {
    /// Parse an untrusted JSON value (e.g. a registration body).
    pub fn from_json(value: Value) -> Result<Self, DpopError> {
        serde_json::from_value(value).map_err(|_| DpopError::MalformedKey("not a key record"))
    }

    /// Algorithm family declared by this record.
    ///
    /// `kty` selects the family; an explicit `alg` must agree with it.
    pub fn algorithm(&self) -> Result<SigningAlgorithm, DpopError> {
        if self.kty.is_empty() {
            return Err(DpopError::MalformedKey("missing kty"));
        }
        let family = SigningAlgorithm::for_key_type(&self.kty)?;
        match self.alg.as_deref() {
            None => Ok(family),
            Some(alg) => {
                let declared: SigningAlgorithm = alg.parse()?;
                if declared != family || alg != declared.name() {
                    return Err(DpopError::UnsupportedAlgorithm(alg.to_string()));
                }
                Ok(declared)
            }
        }
    }

    pub fn has_private_material(&self) -> bool {
        [&self.d, &self.p, &self.q, &self.dp, &self.dq, &self.qi]
            .iter()
            .any(|v| v.is_some())
    }

    /// Copy of this record with every private member removed.
    pub fn public_part(&self) -> KeyRecord {
        KeyRecord {
            kty: self.kty.clone(),
            alg: self.alg.clone(),
            crv: self.crv.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
            n: self.n.clone(),
            e: self.e.clone(),
            ..KeyRecord::default()
        }
    }

    /// RFC 7638 JWK thumbprint (base64url SHA-256 of the canonical members).
    pub fn thumbprint(&self) -> Result<String, DpopError> {
        // Members in lexicographic order, no whitespace.
        let canonical = match self.algorithm()? {
            SigningAlgorithm::Es256 => format!(
                r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
                required(&self.crv, "missing crv")?,
                required(&self.x, "missing x")?,
                required(&self.y, "missing y")?,
            ),
            SigningAlgorithm::Rs256 => format!(
                r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
                required(&self.e, "missing e")?,
                required(&self.n, "missing n")?,
            ),
        };
        Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes())))
    }

    fn from_jwk(jwk: &Jwk, algorithm: SigningAlgorithm) -> Self {
        let member = |name: &str| {
            jwk.parameter(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        KeyRecord {
            kty: algorithm.key_type().to_string(),
            alg: Some(algorithm.name().to_string()),
            crv: member("crv"),
            x: member("x"),
            y: member("y"),
            n: member("n"),
            e: member("e"),
            d: member("d"),
            p: member("p"),
            q: member("q"),
            dp: member("dp"),
            dq: member("dq"),
            qi: member("qi"),
        }
    }

    fn to_jwk(&self, algorithm: SigningAlgorithm, private: bool) -> Result<Jwk, DpopError> {
        let mut map = Map::new();
        map.insert("kty".into(), Value::String(algorithm.key_type().into()));
        map.insert("alg".into(), Value::String(algorithm.name().into()));

        let mut members: Vec<(&str, &Option<String>)> = match algorithm {
            SigningAlgorithm::Es256 => vec![("crv", &self.crv), ("x", &self.x), ("y", &self.y)],
            SigningAlgorithm::Rs256 => vec![("n", &self.n), ("e", &self.e)],
        };
        if private {
            match algorithm {
                SigningAlgorithm::Es256 => members.push(("d", &self.d)),
                SigningAlgorithm::Rs256 => members.extend([
                    ("d", &self.d),
                    ("p", &self.p),
                    ("q", &self.q),
                    ("dp", &self.dp),
                    ("dq", &self.dq),
                    ("qi", &self.qi),
                ]),
            }
        }
        for (name, value) in members {
            if let Some(v) = value {
                map.insert(name.into(), Value::String(v.clone()));
            }
        }

        Jwk::from_map(map).map_err(|_| DpopError::MalformedKey("not a valid JWK"))
    }

    /// Structural checks that do not need the crypto backend.
    fn validate(&self, algorithm: SigningAlgorithm, private: bool) -> Result<(), DpopError> {
        match algorithm {
            SigningAlgorithm::Es256 => {
                let crv = required(&self.crv, "missing crv")?;
                if crv != P256_CURVE {
                    return Err(DpopError::UnsupportedAlgorithm(format!("EC/{crv}")));
                }
                fixed_len(&self.x, "x", P256_FIELD_LEN)?;
                fixed_len(&self.y, "y", P256_FIELD_LEN)?;
                if private {
                    fixed_len(&self.d, "d", P256_FIELD_LEN)?;
                }
            }
            SigningAlgorithm::Rs256 => {
                let n = decode_member(&self.n, "n")?;
                if bit_length(&n) < RSA_MODULUS_BITS as usize {
                    return Err(DpopError::MalformedKey("RSA modulus shorter than 2048 bits"));
                }
                let e = decode_member(&self.e, "e")?;
                if !valid_public_exponent(&e) {
                    return Err(DpopError::MalformedKey("RSA exponent out of range"));
                }
                if private {
                    for (value, name) in [
                        (&self.d, "d"),
                        (&self.p, "p"),
                        (&self.q, "q"),
                        (&self.dp, "dp"),
                        (&self.dq, "dq"),
                        (&self.qi, "qi"),
                    ] {
                        decode_member(value, name)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Verification half of a key pair.
#[derive(Clone)]
pub struct PublicKey {
    algorithm: SigningAlgorithm,
    record: KeyRecord,
    jwk: Jwk,
}

impl PublicKey {
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn record(&self) -> &KeyRecord {
        &self.record
    }

    pub fn thumbprint(&self) -> Result<String, DpopError> {
        self.record.thumbprint()
    }

    /// Check `signature` over `message`; any failure is `InvalidSignature`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), DpopError> {
        self.algorithm.verify(&self.jwk, message, signature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm)
            .field("record", &self.record)
            .finish()
    }
}

/// Signing half of a key pair. Never serialized except through `export_private`.
#[derive(Clone)]
pub struct PrivateKey {
    algorithm: SigningAlgorithm,
    record: KeyRecord,
    jwk: Jwk,
}

impl PrivateKey {
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Public record derived from this private key.
    pub fn public_record(&self) -> KeyRecord {
        self.record.public_part()
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, DpopError> {
        self.algorithm.sign(&self.jwk, message)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.public_key.algorithm
    }
}

/// Generate a key pair for `algorithm`. Nothing is persisted.
pub fn generate(algorithm: SigningAlgorithm) -> Result<KeyPair, DpopError> {
    let (private_jwk, public_jwk) = algorithm.generate()?;
    Ok(KeyPair {
        public_key: PublicKey {
            algorithm,
            record: KeyRecord::from_jwk(&public_jwk, algorithm).public_part(),
            jwk: public_jwk,
        },
        private_key: PrivateKey {
            algorithm,
            record: KeyRecord::from_jwk(&private_jwk, algorithm),
            jwk: private_jwk,
        },
    })
}

pub fn export_public(key_pair: &KeyPair) -> KeyRecord {
    key_pair.public_key.record.clone()
}

pub fn export_private(key_pair: &KeyPair) -> KeyRecord {
    key_pair.private_key.record.clone()
}

/// Rebuild a verification key from its record.
///
/// Private members, if present, are ignored.
pub fn import_public(record: &KeyRecord) -> Result<PublicKey, DpopError> {
    let algorithm = record.algorithm()?;
    record.validate(algorithm, false)?;
    let jwk = record.to_jwk(algorithm, false)?;
    algorithm.check_verifying_key(&jwk)?;
    Ok(PublicKey {
        algorithm,
        record: KeyRecord::from_jwk(&jwk, algorithm),
        jwk,
    })
}

/// Rebuild a signing key from its record.
pub fn import_private(record: &KeyRecord) -> Result<PrivateKey, DpopError> {
    let algorithm = record.algorithm()?;
    record.validate(algorithm, true)?;
    let jwk = record.to_jwk(algorithm, true)?;
    algorithm.check_signing_key(&jwk)?;
    Ok(PrivateKey {
        algorithm,
        record: KeyRecord::from_jwk(&jwk, algorithm),
        jwk,
    })
}

/// Rebuild both halves from a private record.
pub fn import_key_pair(record: &KeyRecord) -> Result<KeyPair, DpopError> {
    let private_key = import_private(record)?;
    let public_key = import_public(&private_key.public_record())?;
    Ok(KeyPair {
        public_key,
        private_key,
    })
}

fn required<'a>(value: &'a Option<String>, what: &'static str) -> Result<&'a str, DpopError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(DpopError::MalformedKey(what))
}

fn decode_member(value: &Option<String>, name: &'static str) -> Result<Vec<u8>, DpopError> {
    let raw = required(value, name)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|_| DpopError::MalformedKey(name))?;
    if bytes.iter().all(|b| *b == 0) {
        return Err(DpopError::MalformedKey(name));
    }
    Ok(bytes)
}

fn fixed_len(value: &Option<String>, name: &'static str, len: usize) -> Result<(), DpopError> {
    if decode_member(value, name)?.len() != len {
        return Err(DpopError::MalformedKey(name));
    }
    Ok(())
}

/// Bit length of a big-endian unsigned integer.
fn bit_length(bytes: &[u8]) -> usize {
    match bytes.iter().position(|b| *b != 0) {
        Some(i) => (bytes.len() - i) * 8 - bytes[i].leading_zeros() as usize,
        None => 0,
    }
}

/// Odd, at least 3, and fits in 64 bits.
fn valid_public_exponent(bytes: &[u8]) -> bool {
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if significant.is_empty() || significant.len() > 8 {
        return false;
    }
    let value = significant
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    value >= 3 && value % 2 == 1
}
