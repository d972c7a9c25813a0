// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified identity claims.

use serde::{Deserialize, Serialize};

/// Claims decoded from a verified OIDC ID token.
///
/// Produced by a [`TokenVerifier`](super::TokenVerifier) and consumed by the
/// auth gate only. Handlers behind the gate never see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Issuer (the identity provider URL)
    pub iss: String,

    /// Subject (provider-specific user identifier)
    pub sub: String,

    /// Audience (the client id the token was issued for)
    pub aud: Audience,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Email, when the provider includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The `aud` claim, which OIDC allows as a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

#[cfg(test)]
impl Audience {
    pub(crate) fn contains(&self, client_id: &str) -> bool {
        match self {
            Audience::One(aud) => aud == client_id,
            Audience::Many(auds) => auds.iter().any(|a| a == client_id),
        }
    }
}
