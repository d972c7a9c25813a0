// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.
//!
//! [`TokenVerifier`] is the single capability the auth gate depends on.
//! [`OidcVerifier`] implements it against an OIDC provider's JWKS; tests
//! substitute their own implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use super::claims::IdentityClaims;
use super::error::AuthError;
use super::jwks::JwksManager;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Timeout for requests to the identity provider.
const PROVIDER_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Verify a raw bearer token and yield its claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, raw_token: &str) -> Result<IdentityClaims, AuthError>;

    /// Whether key material is available. Used by the readiness probe.
    async fn ready(&self) -> bool {
        true
    }
}

/// Verifies OIDC ID tokens: signature, issuer, audience and expiry.
#[derive(Clone)]
pub struct OidcVerifier {
    jwks: Arc<JwksManager>,
    issuer: String,
    client_id: String,
}

impl OidcVerifier {
    pub fn new(
        jwks: Arc<JwksManager>,
        issuer: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            jwks,
            issuer: issuer.into(),
            client_id: client_id.into(),
        }
    }

    /// Discover the provider at `provider_url` and load its keys.
    ///
    /// Tokens must carry the issuer the provider advertises and audience
    /// `client_id`.
    pub async fn discover(provider_url: &str, client_id: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(PROVIDER_HTTP_TIMEOUT)
            .build()
            .map_err(|e| AuthError::InternalError(format!("failed to build HTTP client: {e}")))?;

        let (jwks, issuer) = JwksManager::discover(provider_url, client).await?;
        Ok(Self::new(Arc::new(jwks), issuer, client_id))
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }

    fn decode_with(
        &self,
        token: &str,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<IdentityClaims, AuthError> {
        let token_data = decode::<IdentityClaims>(token, key, &self.validation(algorithm))?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl TokenVerifier for OidcVerifier {
    async fn verify(&self, raw_token: &str) -> Result<IdentityClaims, AuthError> {
        // Decode header to get kid
        let header = decode_header(raw_token).map_err(|_| AuthError::MalformedToken)?;

        if let Some(kid) = &header.kid {
            let (decoding_key, algorithm) = self.jwks.get_decoding_key(kid).await?;
            return self.decode_with(raw_token, &decoding_key, algorithm);
        }

        // No kid, try every key published for the header's algorithm
        let mut last_error = AuthError::NoMatchingKey;
        for decoding_key in self.jwks.keys_for_algorithm(header.alg).await? {
            match self.decode_with(raw_token, &decoding_key, header.alg) {
                Ok(claims) => return Ok(claims),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    async fn ready(&self) -> bool {
        self.jwks.is_cached().await || self.jwks.refresh().await.is_ok()
    }
}
