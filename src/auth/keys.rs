//! Opaque API keys: issued once at registration, stored only as a SHA-256
//! hash, presented as `Authorization: Bearer <key>` on every protected call.

use crate::error::AppError;
use axum::http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a fresh `pk_live_` API key from 32 CSPRNG bytes.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("pk_live_{}", hex_encode(&bytes))
}

/// Hex-encoded SHA-256 of a key; the only form ever persisted.
pub fn hash_api_key(key: &str) -> String {
    hex_encode(&Sha256::digest(key.as_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn keys_are_prefixed_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with("pk_live_"));
        assert_eq!(a.len(), "pk_live_".len() + 64);
        assert_ne!(a, b);
    }

    #[test]
    fn hashing_is_deterministic_and_one_way_shaped() {
        let key = "pk_live_test";
        let h1 = hash_api_key(key);
        let h2 = hash_api_key(key);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, key);
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());
    }
}
