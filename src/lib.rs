// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Orders Server - order intake with SMS confirmations
//!
//! Customers register publicly; orders require an OIDC bearer token. Each
//! stored order triggers a fire-and-forget SMS to the customer.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - OIDC token verification and the bearer gate
//! - `notify` - Detached SMS notifications (Africa's Talking)
//! - `storage` - Customer and order persistence (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod state;
pub mod storage;
