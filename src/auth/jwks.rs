// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OIDC discovery and JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behavior
//!
//! - The provider's `/.well-known/openid-configuration` is read once to find
//!   `jwks_uri`; the advertised issuer must match the configured one
//! - Keys are fetched at construction and cached with a configurable TTL
//! - An unknown `kid` forces one refresh (provider key rotation), at most
//!   once per [`MIN_FORCED_REFRESH_INTERVAL`]
//! - Stale cache is used on fetch failure (fail-open for availability)

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use url::Url;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum spacing between refreshes forced by an unknown `kid`.
pub const MIN_FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Path of the discovery document relative to the issuer.
const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Subset of the OIDC provider metadata we rely on.
#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    issuer: String,
    jwks_uri: String,
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS URL (from discovery)
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// When an unknown `kid` last triggered a fetch
    last_forced_refresh: Arc<Mutex<Option<Instant>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager with an empty cache.
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            last_forced_refresh: Arc::new(Mutex::new(None)),
            client,
        }
    }

    /// Create a manager pre-loaded with a fixed key set.
    ///
    /// Refreshes go to `jwks_url`; with an empty URL the set never changes.
    pub fn with_keys(jwks_url: impl Into<String>, jwks: JwkSet) -> Self {
        Self {
            cache: Arc::new(RwLock::new(Some(CacheEntry {
                jwks,
                fetched_at: Instant::now(),
            }))),
            ..Self::new(jwks_url, reqwest::Client::new())
        }
    }

    /// Run OIDC discovery against `issuer` and prime the key cache.
    ///
    /// Returns the manager together with the issuer exactly as the provider
    /// advertises it; tokens carry that value in `iss`. A configured issuer
    /// that differs only by a trailing `/` is accepted.
    ///
    /// Fails if the provider is unreachable, advertises a different issuer,
    /// or serves no usable JWKS.
    pub async fn discover(
        issuer: &str,
        client: reqwest::Client,
    ) -> Result<(Self, String), AuthError> {
        let discovery_url = format!("{}{DISCOVERY_PATH}", issuer.trim_end_matches('/'));
        Url::parse(&discovery_url)
            .map_err(|e| AuthError::DiscoveryError(format!("invalid provider URL: {e}")))?;

        let response = client
            .get(&discovery_url)
            .send()
            .await
            .map_err(|e| AuthError::DiscoveryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::DiscoveryError(format!(
                "HTTP {} from discovery endpoint",
                response.status()
            )));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| AuthError::DiscoveryError(e.to_string()))?;

        if metadata.issuer.trim_end_matches('/') != issuer.trim_end_matches('/') {
            return Err(AuthError::DiscoveryError(format!(
                "issuer did not match: expected {issuer}, provider advertised {}",
                metadata.issuer
            )));
        }

        let manager = Self::new(metadata.jwks_uri, client);
        manager.refresh().await?;
        debug!(
            jwks_url = %manager.jwks_url,
            issuer = %metadata.issuer,
            "OIDC discovery complete"
        );
        Ok((manager, metadata.issuer))
    }

    #[cfg(test)]
    fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        match self.fetch_jwks().await {
            Ok(jwks) => {
                self.store(jwks.clone()).await;
                Ok(jwks)
            }
            Err(e) => {
                let cache = self.cache.read().await;
                match &*cache {
                    Some(entry) => {
                        warn!(error = %e, "JWKS refresh failed, using stale keys");
                        Ok(entry.jwks.clone())
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        if self.jwks_url.is_empty() {
            return Err(AuthError::JwksFetchError("no JWKS URL configured".to_string()));
        }

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        Ok(jwks)
    }

    async fn store(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
    }

    /// Get a decoding key for the given key ID.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        // The provider may have rotated keys since the last fetch
        if !self.claim_forced_refresh().await {
            debug!(kid, "Unknown key id, forced JWKS refresh throttled");
            return Err(AuthError::NoMatchingKey);
        }
        debug!(kid, "Unknown key id, refreshing JWKS");
        let jwks = match self.fetch_jwks().await {
            Ok(jwks) => {
                self.store(jwks.clone()).await;
                jwks
            }
            Err(e) => {
                warn!(error = %e, "JWKS refresh for unknown key id failed");
                return Err(AuthError::NoMatchingKey);
            }
        };

        let jwk = find_key(&jwks, kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    async fn claim_forced_refresh(&self) -> bool {
        let mut last = self.last_forced_refresh.lock().await;
        match *last {
            Some(at) if at.elapsed() < MIN_FORCED_REFRESH_INTERVAL => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }

    /// Get every usable key for `algorithm` (for tokens without kid).
    pub async fn keys_for_algorithm(
        &self,
        algorithm: Algorithm,
    ) -> Result<Vec<DecodingKey>, AuthError> {
        let jwks = self.get_jwks().await?;

        let keys: Vec<DecodingKey> = jwks
            .keys
            .iter()
            .filter_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .filter(|(_, alg)| *alg == algorithm)
            .map(|(key, _)| key)
            .collect();

        if keys.is_empty() {
            return Err(AuthError::NoMatchingKey);
        }
        Ok(keys)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch_jwks().await?;
        self.store(jwks).await;
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert a JWK to a DecodingKey and the algorithm it verifies.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return Err(AuthError::NoMatchingKey);
    }

    let default_alg = match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Algorithm::RS256,
        AlgorithmParameters::EllipticCurve(_) => Algorithm::ES256,
        AlgorithmParameters::OctetKey(_) => Algorithm::HS256,
        AlgorithmParameters::OctetKeyPair(_) => Algorithm::EdDSA,
    };

    let alg = match jwk.common.key_algorithm {
        Some(key_alg) => signing_algorithm(key_alg).ok_or_else(|| {
            AuthError::InternalError(format!("unsupported key algorithm {key_alg:?}"))
        })?,
        None => default_alg,
    };

    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| AuthError::InternalError(format!("failed to create decoding key: {e}")))?;

    Ok((key, alg))
}

fn signing_algorithm(key_alg: KeyAlgorithm) -> Option<Algorithm> {
    match key_alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_keys::{oct_jwks, TEST_KID};

    #[test]
    fn jwks_manager_creation() {
        let manager = JwksManager::new(
            "https://id.example.com/.well-known/jwks.json",
            reqwest::Client::new(),
        );
        assert_eq!(
            manager.jwks_url,
            "https://id.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn custom_cache_ttl() {
        let manager = JwksManager::new("https://id.example.com/jwks", reqwest::Client::new())
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(manager.cache_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = JwksManager::new("https://id.example.com/jwks", reqwest::Client::new());
        assert!(!manager.is_cached().await);
    }

    #[tokio::test]
    async fn preloaded_keys_resolve_by_kid() {
        let manager = JwksManager::with_keys("", oct_jwks());
        assert!(manager.is_cached().await);

        let (_, alg) = manager.get_decoding_key(TEST_KID).await.unwrap();
        assert_eq!(alg, Algorithm::HS256);

        let err = manager.get_decoding_key("rotated-away").await.err();
        assert_eq!(err, Some(AuthError::NoMatchingKey));
    }

    #[tokio::test]
    async fn keys_for_algorithm_filters_by_alg() {
        let manager = JwksManager::with_keys("", oct_jwks());
        let keys = manager.keys_for_algorithm(Algorithm::HS256).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(
            manager.keys_for_algorithm(Algorithm::RS256).await.err(),
            Some(AuthError::NoMatchingKey)
        );
    }

    #[tokio::test]
    async fn stale_keys_are_used_when_refresh_fails() {
        let manager = JwksManager::with_keys("http://127.0.0.1:9/jwks", oct_jwks())
            .with_cache_ttl(Duration::ZERO);
        assert!(!manager.is_cached().await);
        assert!(manager.get_decoding_key(TEST_KID).await.is_ok());
    }

    #[tokio::test]
    async fn discovery_rejects_issuer_mismatch() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DISCOVERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": "https://someone-else.example.com",
                "jwks_uri": format!("{}/jwks", server.uri()),
            })))
            .mount(&server)
            .await;

        let err = JwksManager::discover(&server.uri(), reqwest::Client::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AuthError::DiscoveryError(msg) if msg.contains("issuer did not match")
        ));
    }

    #[tokio::test]
    async fn discovery_fails_when_provider_is_down() {
        use wiremock::MockServer;

        let server = MockServer::start().await;
        let err = JwksManager::discover(&server.uri(), reqwest::Client::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::DiscoveryError(_)));
    }

    #[tokio::test]
    async fn discovery_returns_advertised_issuer() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DISCOVERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": server.uri(),
                "jwks_uri": format!("{}/jwks", server.uri()),
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&oct_jwks()))
            .mount(&server)
            .await;

        let configured = format!("{}/", server.uri());
        let (manager, issuer) = JwksManager::discover(&configured, reqwest::Client::new())
            .await
            .unwrap();
        assert_eq!(issuer, server.uri());
        assert!(manager.is_cached().await);
    }

    #[tokio::test]
    async fn unknown_kid_refreshes_at_most_once_per_interval() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&oct_jwks()))
            .expect(1)
            .mount(&server)
            .await;

        let manager = JwksManager::with_keys(format!("{}/jwks", server.uri()), oct_jwks());
        for kid in ["bogus-1", "bogus-2", "bogus-3"] {
            assert_eq!(
                manager.get_decoding_key(kid).await.err(),
                Some(AuthError::NoMatchingKey)
            );
        }

        // Known keys keep resolving from the cache while refreshes are throttled
        assert!(manager.get_decoding_key(TEST_KID).await.is_ok());
    }
}
