use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dpop_binding::services::dpop::{
    KeyPair, KeyRecord, MintedProof, ProofMinter, SigningAlgorithm, keys,
};

/// Client-side helper for the DPoP binding API.
///
/// - `keygen`: create a key pair and store the private JWK
/// - `public`: print the public JWK (or a ready-to-send registration body)
/// - `mint`: sign a proof for one request
#[derive(Parser, Debug)]
#[command(name = "dpop-gen", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and write the private JWK as JSON.
    Keygen {
        /// RS256 or ES256
        #[arg(long, default_value = "ES256")]
        alg: SigningAlgorithm,

        /// Output file. Default: stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Print the public half of a stored private JWK.
    Public {
        #[arg(long, value_name = "FILE")]
        key: PathBuf,

        /// Wrap the key in a `{clientId, publicKey}` registration body.
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Mint a DPoP proof for one request.
    Mint {
        #[arg(long, value_name = "FILE")]
        key: PathBuf,

        /// HTTP method (htm), e.g. GET/POST
        #[arg(long, default_value = "GET")]
        method: String,

        /// Full request URL (htu), e.g. http://localhost:3000/api/v1/secure-endpoint
        #[arg(long)]
        url: String,

        /// Print only the proof
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

fn read_key(path: &PathBuf) -> Result<KeyRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading key file {}", path.display()))?;
    parse_key(&raw)
}

fn parse_key(raw: &str) -> Result<KeyRecord> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("key file is not valid JSON")?;
    Ok(KeyRecord::from_json(value)?)
}

/// Returns (private key file contents, jkt).
fn keygen(alg: SigningAlgorithm) -> Result<(String, String)> {
    let key_pair = keys::generate(alg)?;
    let private = serde_json::to_string_pretty(&keys::export_private(&key_pair))?;
    let jkt = keys::export_public(&key_pair).thumbprint()?;
    Ok((private, jkt))
}

fn public_body(record: &KeyRecord, client_id: Option<String>) -> Result<serde_json::Value> {
    let public = keys::import_public(&record.public_part())?;
    Ok(match client_id {
        Some(client_id) => serde_json::json!({
            "clientId": client_id,
            "publicKey": public.record(),
        }),
        None => serde_json::to_value(public.record())?,
    })
}

fn mint(record: &KeyRecord, method: &str, url: &str) -> Result<(KeyPair, MintedProof)> {
    let key_pair = keys::import_key_pair(record)?;
    let minted = ProofMinter::new().mint_with_claims(
        &key_pair.private_key,
        key_pair.algorithm(),
        method,
        url,
    )?;
    Ok((key_pair, minted))
}

fn main() -> Result<()> {
    match Args::parse().command {
        Command::Keygen { alg, out } => {
            let (private, jkt) = keygen(alg)?;
            match out {
                Some(path) => {
                    fs::write(&path, private)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("wrote {} key to {}", alg, path.display());
                }
                None => println!("{}", private),
            }
            eprintln!("jkt: {}", jkt);
        }

        Command::Public { key, client_id } => {
            let body = public_body(&read_key(&key)?, client_id)?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Command::Mint {
            key,
            method,
            url,
            quiet,
        } => {
            let (key_pair, minted) = mint(&read_key(&key)?, &method, &url)?;

            if quiet {
                println!("{}", minted.proof);
                return Ok(());
            }

            println!("DPoP: {}", minted.proof);
            println!("alg: {}", key_pair.algorithm());
            println!("htm: {}", minted.claims.htm);
            println!("htu: {}", minted.claims.htu);
            println!("iat: {}", minted.claims.iat);
            println!("jti: {}", minted.claims.jti);
            println!("jkt: {}", key_pair.public_key.thumbprint()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dpop_binding::services::dpop::{DpopPolicy, ProofVerifier};
    use dpop_binding::services::replay::InMemoryReplayStore;

    use super::*;

    const URL: &str = "http://localhost:3000/api/v1/secure-endpoint";

    #[test]
    fn key_file_feeds_public_and_mint_for_both_families() {
        for alg in [SigningAlgorithm::Es256, SigningAlgorithm::Rs256] {
            let (file, jkt) = keygen(alg).unwrap();
            let record = parse_key(&file).unwrap();
            assert!(record.has_private_material());

            let body = public_body(&record, Some("my-client-id".into())).unwrap();
            assert_eq!(body["clientId"], "my-client-id");
            let public = KeyRecord::from_json(body["publicKey"].clone()).unwrap();
            assert!(!public.has_private_material());
            assert_eq!(public.thumbprint().unwrap(), jkt);

            let (key_pair, minted) = mint(&record, "get", URL).unwrap();
            assert_eq!(key_pair.algorithm(), alg);
            assert_eq!(minted.claims.htm, "GET");

            let verifier =
                ProofVerifier::new(DpopPolicy::default(), Arc::new(InMemoryReplayStore::new()));
            let registered = keys::import_public(&public).unwrap();
            let claims = verifier
                .verify_now("my-client-id", &minted.proof, "GET", URL, Some(&registered))
                .unwrap();
            assert_eq!(claims.jti, minted.claims.jti);
        }
    }

    #[test]
    fn default_algorithm_is_es256() {
        let args = Args::try_parse_from(["dpop-gen", "keygen"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Keygen {
                alg: SigningAlgorithm::Es256,
                out: None
            }
        ));
    }
}
