use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE as BASE64, Engine};
use ethers::prelude::*;
use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::utils::hex;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

/// Generate HMAC-SHA256 signature for Polymarket CLOB API
///
/// Message format: timestamp + method + path + body
pub fn generate_signature(
    secret: &str,
    timestamp: u64,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String> {
    let secret_bytes = BASE64.decode(secret).context("API secret is not base64")?;

    let message = format!("{}{}{}{}", timestamp, method.to_uppercase(), path, body);

    let mut mac = HmacSha256::new_from_slice(&secret_bytes)?;
    mac.update(message.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Get current timestamp in seconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// L2 headers for an authenticated CLOB request
pub fn generate_headers(
    creds: &ApiCredentials,
    address: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<Vec<(String, String)>> {
    let timestamp = get_timestamp();
    let signature = generate_signature(&creds.secret, timestamp, method, path, body)?;

    Ok(vec![
        // Official header names use UNDERSCORES (per py-clob-client)
        ("POLY_ADDRESS".to_string(), address.to_string()),
        ("POLY_API_KEY".to_string(), creds.api_key.clone()),
        ("POLY_PASSPHRASE".to_string(), creds.passphrase.clone()),
        ("POLY_TIMESTAMP".to_string(), timestamp.to_string()),
        ("POLY_SIGNATURE".to_string(), signature),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}

/// Sign the `ClobAuth` EIP-712 struct that proves wallet ownership
pub fn sign_clob_auth(wallet: &LocalWallet, timestamp: u64, nonce: u64) -> Result<String> {
    let typed_data = json!({
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"}
            ],
            "ClobAuth": [
                {"name": "address", "type": "address"},
                {"name": "timestamp", "type": "string"},
                {"name": "nonce", "type": "uint256"},
                {"name": "message", "type": "string"}
            ]
        },
        "primaryType": "ClobAuth",
        "domain": {
            "name": "ClobAuthDomain",
            "version": "1",
            "chainId": wallet.chain_id()
        },
        "message": {
            "address": format!("{:?}", wallet.address()),
            "timestamp": timestamp.to_string(),
            "nonce": nonce,
            "message": CLOB_AUTH_MESSAGE
        }
    });

    let typed_data: TypedData = serde_json::from_value(typed_data)?;
    let hash = typed_data.encode_eip712()?;
    let signature = wallet.sign_hash(H256::from(hash))?;

    Ok(format!("0x{}", hex::encode(signature.to_vec())))
}

/// L1 headers used to create or derive API credentials
pub fn generate_l1_headers(
    wallet: &LocalWallet,
    timestamp: u64,
    nonce: u64,
) -> Result<Vec<(String, String)>> {
    let signature = sign_clob_auth(wallet, timestamp, nonce)?;

    Ok(vec![
        ("POLY_ADDRESS".to_string(), ethers::utils::to_checksum(&wallet.address(), None)),
        ("POLY_SIGNATURE".to_string(), signature),
        ("POLY_TIMESTAMP".to_string(), timestamp.to_string()),
        ("POLY_NONCE".to_string(), nonce.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known hardhat account #0
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet() -> LocalWallet {
        TEST_KEY.parse::<LocalWallet>().unwrap().with_chain_id(137u64)
    }

    #[test]
    fn test_signature_generation() {
        let secret = BASE64.encode(b"test_secret");

        let a = generate_signature(&secret, 1234567890, "GET", "/markets", "").unwrap();
        let b = generate_signature(&secret, 1234567890, "get", "/markets", "").unwrap();
        let c = generate_signature(&secret, 1234567891, "GET", "/markets", "").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_bad_secret_rejected() {
        assert!(generate_signature("not base64!!", 1, "GET", "/", "").is_err());
    }

    #[test]
    fn test_l2_headers() {
        let creds = ApiCredentials {
            api_key: "key".to_string(),
            secret: BASE64.encode(b"secret"),
            passphrase: "pass".to_string(),
        };
        let headers = generate_headers(&creds, "0xabc", "POST", "/order", "{}").unwrap();
        let get = |name: &str| headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());

        assert_eq!(get("POLY_API_KEY").as_deref(), Some("key"));
        assert_eq!(get("POLY_PASSPHRASE").as_deref(), Some("pass"));
        assert_eq!(get("POLY_ADDRESS").as_deref(), Some("0xabc"));
        assert!(get("POLY_SIGNATURE").is_some());
    }

    #[test]
    fn test_clob_auth_signature_is_deterministic() {
        let wallet = wallet();
        let a = sign_clob_auth(&wallet, 1700000000, 0).unwrap();
        let b = sign_clob_auth(&wallet, 1700000000, 0).unwrap();
        let c = sign_clob_auth(&wallet, 1700000000, 1).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // 65-byte signature, hex encoded
        assert_eq!(a.len(), 2 + 130);
    }

    #[test]
    fn test_l1_headers() {
        let headers = generate_l1_headers(&wallet(), 1700000000, 0).unwrap();
        let names: Vec<&str> = headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["POLY_ADDRESS", "POLY_SIGNATURE", "POLY_TIMESTAMP", "POLY_NONCE"]);
        assert_eq!(headers[0].1, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }
}
