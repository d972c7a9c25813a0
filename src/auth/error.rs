// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Verification failures carry a descriptive message, but the auth gate
//! rejects all of them the same way: 401 with `"invalid token"` and the
//! message in `details`. Only header problems get their own reason string.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Reason for a missing `Authorization` header.
pub const REASON_HEADER_REQUIRED: &str = "authorization header required";
/// Reason for a header that is not exactly `Bearer <token>`.
pub const REASON_INVALID_FORMAT: &str = "invalid authorization header format";
/// Reason for any token the verifier refused.
pub const REASON_INVALID_TOKEN: &str = "invalid token";

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("authorization header is required")]
    MissingAuthHeader,
    /// Invalid authorization header format
    #[error("invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is malformed
    #[error("token is malformed")]
    MalformedToken,
    /// Token signature is invalid
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("token has expired")]
    TokenExpired,
    /// Token issuer is invalid
    #[error("token issuer is invalid")]
    InvalidIssuer,
    /// Token audience is invalid
    #[error("token audience is invalid")]
    InvalidAudience,
    /// Token is not yet valid
    #[error("token is not yet valid")]
    TokenNotYetValid,
    /// Provider discovery document could not be loaded
    #[error("failed to load OIDC discovery document: {0}")]
    DiscoveryError(String),
    /// JWKS fetch failed
    #[error("failed to fetch JWKS: {0}")]
    JwksFetchError(String),
    /// No matching key in JWKS
    #[error("no matching key found in JWKS")]
    NoMatchingKey,
    /// Verification did not finish in time
    #[error("token verification timed out")]
    Timeout,
    /// Internal error
    #[error("internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::DiscoveryError(_) => "discovery_error",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::Timeout => "timeout",
            AuthError::InternalError(_) => "internal_error",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error = match self {
            AuthError::MissingAuthHeader => {
                ApiError::new(StatusCode::UNAUTHORIZED, REASON_HEADER_REQUIRED)
            }
            AuthError::InvalidAuthHeader => {
                ApiError::new(StatusCode::UNAUTHORIZED, REASON_INVALID_FORMAT)
            }
            other => ApiError::new(StatusCode::UNAUTHORIZED, REASON_INVALID_TOKEN)
                .with_details(other.to_string()),
        };
        error.into_response()
    }
}
