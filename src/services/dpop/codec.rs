//! Compact three-segment proof encoding.
//!
//! `base64url(header) "." base64url(claims) "." base64url(signature)`, all
//! segments unpadded. Decoding never re-encodes the first two segments: the
//! signing input handed back is a slice of the received string.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;

use super::error::DpopError;
use super::types::{DecodedProof, ProofClaims, ProofHeader};

/// `base64url(header) + "." + base64url(claims)`, the exact bytes that get signed.
pub fn signing_input(header: &ProofHeader, claims: &ProofClaims) -> Result<String, DpopError> {
    Ok(format!("{}.{}", b64url_json(header)?, b64url_json(claims)?))
}

/// Assemble a proof from its parts.
pub fn encode(
    header: &ProofHeader,
    claims: &ProofClaims,
    signature: &[u8],
) -> Result<String, DpopError> {
    Ok(attach_signature(&signing_input(header, claims)?, signature))
}

/// Append the signature segment to an already-built signing input.
pub fn attach_signature(signing_input: &str, signature: &[u8]) -> String {
    format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
}

/// Split and decode a proof.
///
/// Fails with `MalformedProof` unless there are exactly three segments, each
/// valid unpadded base64url, and the first two are JSON with the expected members.
pub fn decode(proof: &str) -> Result<DecodedProof<'_>, DpopError> {
    let mut parts = proof.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DpopError::MalformedProof);
    };

    let header: ProofHeader = serde_json::from_slice(&b64url_decode(header_b64)?)
        .map_err(|_| DpopError::MalformedProof)?;
    let claims: ProofClaims = serde_json::from_slice(&b64url_decode(claims_b64)?)
        .map_err(|_| DpopError::MalformedProof)?;
    if claims.jti.is_empty() || claims.htm.is_empty() || claims.htu.is_empty() {
        return Err(DpopError::MalformedProof);
    }
    let signature = b64url_decode(signature_b64)?;

    Ok(DecodedProof {
        header,
        claims,
        signing_input: &proof[..header_b64.len() + 1 + claims_b64.len()],
        signature,
    })
}

fn b64url_json<T: Serialize>(value: &T) -> Result<String, DpopError> {
    let json = serde_json::to_vec(value).map_err(|_| DpopError::MalformedProof)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn b64url_decode(segment: &str) -> Result<Vec<u8>, DpopError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| DpopError::MalformedProof)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ProofHeader, ProofClaims) {
        (
            ProofHeader::new("ES256"),
            ProofClaims {
                htm: "GET".into(),
                htu: "https://api.example.com/resource".into(),
                jti: "abc".into(),
                iat: 1_700_000_000,
            },
        )
    }

    #[test]
    fn encodes_three_unpadded_url_safe_segments() {
        let (header, claims) = sample();
        let proof = encode(&header, &claims, &[0xfb, 0xff, 0xfe]).unwrap();

        let parts: Vec<&str> = proof.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], "-__-");
        assert!(!proof.contains('='));
        assert!(!proof.contains('+'));
        assert!(!proof.contains('/'));
    }

    #[test]
    fn header_json_is_deterministic() {
        let (header, _) = sample();
        let segment = b64url_json(&header).unwrap();
        let json = URL_SAFE_NO_PAD.decode(segment).unwrap();
        assert_eq!(json, br#"{"typ":"dpop+jwt","alg":"ES256"}"#);
    }

    #[test]
    fn decode_returns_received_signing_input() {
        // Whitespace and member order differ from what our encoder emits.
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{ "alg": "RS256", "typ": "dpop+jwt" }"#);
        let claims_b64 = URL_SAFE_NO_PAD
            .encode(r#"{"iat":1,"jti":"j","htu":"https://a.example/","htm":"GET","nonce":"n"}"#);
        let proof = format!("{header_b64}.{claims_b64}.AQID");

        let decoded = decode(&proof).unwrap();
        assert_eq!(decoded.signing_input, format!("{header_b64}.{claims_b64}"));
        assert_eq!(decoded.header.alg, "RS256");
        assert_eq!(decoded.claims.htm, "GET");
        assert_eq!(decoded.signature, vec![1, 2, 3]);
    }

    #[test]
    fn decode_inverts_encode() {
        let (header, claims) = sample();
        let proof = encode(&header, &claims, b"sig").unwrap();
        let decoded = decode(&proof).unwrap();
        assert_eq!(decoded.header, header);
        assert_eq!(decoded.claims, claims);
        assert_eq!(decoded.signature, b"sig");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert_eq!(decode("a.b").unwrap_err(), DpopError::MalformedProof);
        assert_eq!(decode("a.b.c.d").unwrap_err(), DpopError::MalformedProof);
        assert_eq!(decode("").unwrap_err(), DpopError::MalformedProof);
    }

    #[test]
    fn rejects_bad_base64() {
        let (header, claims) = sample();
        let proof = encode(&header, &claims, b"sig").unwrap();
        let padded = format!("{proof}==");
        assert_eq!(decode(&padded).unwrap_err(), DpopError::MalformedProof);

        let standard_alphabet = proof.replacen('.', "+.", 1);
        assert_eq!(decode(&standard_alphabet).unwrap_err(), DpopError::MalformedProof);
    }

    #[test]
    fn rejects_json_without_expected_members() {
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"typ":"dpop+jwt"}"#);
        let (_, claims) = sample();
        let claims_b64 = b64url_json(&claims).unwrap();
        let proof = format!("{header_b64}.{claims_b64}.AQID");
        assert_eq!(decode(&proof).unwrap_err(), DpopError::MalformedProof);

        let header_b64 = b64url_json(&ProofHeader::new("ES256")).unwrap();
        let claims_b64 = URL_SAFE_NO_PAD.encode(r#"{"htm":"GET","htu":"https://a/","iat":1}"#);
        let proof = format!("{header_b64}.{claims_b64}.AQID");
        assert_eq!(decode(&proof).unwrap_err(), DpopError::MalformedProof);
    }

    #[test]
    fn rejects_non_json_segment() {
        let header_b64 = URL_SAFE_NO_PAD.encode("not json");
        let proof = format!("{header_b64}.{header_b64}.AQID");
        assert_eq!(decode(&proof).unwrap_err(), DpopError::MalformedProof);
    }
}
