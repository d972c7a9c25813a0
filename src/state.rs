// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenVerifier;
use crate::notify::NotificationDispatcher;
use crate::storage::Store;

/// Default bound on a single token verification.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state.
///
/// Every collaborator is constructed once at startup and injected here;
/// handlers and middleware only see the trait objects.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub notifications: NotificationDispatcher,
    /// Upper bound on a single token verification
    pub auth_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        verifier: Arc<dyn TokenVerifier>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            verifier,
            notifications,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }
}
