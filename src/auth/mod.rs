// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides OIDC bearer-token authentication for order endpoints.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider and obtains an ID token
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. Server:
//!    - Discovers the provider's JWKS at startup
//!    - Verifies JWT signature, expiry, issuer, audience (the client id)
//!    - Admits or rejects the request with 401
//!
//! ## Security
//!
//! - Customer registration is public; order endpoints require authentication
//! - All verification failures are reported as the same `invalid token` reason
//! - JWKS is cached with TTL; clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod jwks;
pub mod middleware;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_keys;

pub use claims::IdentityClaims;
pub use error::AuthError;
pub use jwks::JwksManager;
pub use middleware::require_bearer;
pub use verifier::{OidcVerifier, TokenVerifier};
