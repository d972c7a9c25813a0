// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric key material and token minting for auth tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

pub const TEST_KID: &str = "test-key";
pub const TEST_SECRET: &[u8] = b"orders-server-test-secret-0123456789";
pub const TEST_ISSUER: &str = "https://id.example.com";
pub const TEST_CLIENT_ID: &str = "orders-api";

pub fn oct_jwks() -> JwkSet {
    serde_json::from_value(serde_json::json!({
        "keys": [{
            "kty": "oct",
            "kid": TEST_KID,
            "alg": "HS256",
            "use": "sig",
            "k": URL_SAFE_NO_PAD.encode(TEST_SECRET),
        }]
    }))
    .unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims for a token that the test verifier accepts.
pub fn valid_claims(issuer: &str) -> serde_json::Value {
    serde_json::json!({
        "iss": issuer,
        "sub": "user_123",
        "aud": TEST_CLIENT_ID,
        "iat": now(),
        "exp": now() + 3600,
    })
}

pub fn mint(claims: &serde_json::Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &EncodingKey::from_secret(TEST_SECRET)).unwrap()
}
