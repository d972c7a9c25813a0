// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Apply to a router subtree with
//! `route_layer(axum::middleware::from_fn_with_state(state, require_bearer))`.
//! The request is admitted only when the `Authorization` header is exactly
//! `Bearer <token>` and the configured [`TokenVerifier`] accepts the token.
//! Claims are not attached to the request.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::AuthError;
use crate::state::AppState;

/// Extract the bearer token from the `Authorization` header.
///
/// The header must split on single spaces into exactly two parts, the first
/// being literally `Bearer`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = match headers.get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingAuthHeader),
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    match auth_str.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Authentication middleware function.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            debug!(
                error_code = e.error_code(),
                "Rejected request without usable bearer token"
            );
            return e.into_response();
        }
    };

    let verification = state.verifier.verify(token);
    let verified = match tokio::time::timeout(state.auth_timeout, verification).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Timeout),
    };

    match verified {
        Ok(claims) => {
            debug!(sub = %claims.sub, "Bearer token accepted");
            next.run(request).await
        }
        Err(e) => {
            debug!(error_code = e.error_code(), error = %e, "Bearer token rejected");
            e.into_response()
        }
    }
}
