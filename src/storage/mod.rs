// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistence Module
//!
//! Customers and orders are stored in an embedded redb database. Handlers
//! only see the [`Store`] trait so that the order workflow can be exercised
//! against failing or instrumented stores in tests.
//!
//! ## Guarantees
//!
//! - Each `create_*` call runs in a single write transaction (ACID).
//! - Customer codes are unique; a duplicate code aborts the transaction.
//! - Ids come from a per-table sequence, so identical requests get distinct ids.
//!
//! The store does not check that an order's customer exists. The order
//! workflow performs that lookup before calling `create_order`.

pub mod database;

use crate::models::{Customer, NewCustomer, NewOrder, Order};

pub use database::RedbStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("UNIQUE constraint failed: customers.code ({0})")]
    DuplicateCode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the HTTP handlers.
///
/// Lookups return `Ok(None)` for a missing record; `Err` is reserved for
/// store failures.
pub trait Store: Send + Sync {
    fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer>;

    fn get_customer(&self, id: u64) -> StoreResult<Option<Customer>>;

    fn create_order(&self, order: NewOrder) -> StoreResult<Order>;

    fn get_order(&self, id: u64) -> StoreResult<Option<Order>>;

    /// Cheap availability check for readiness probes.
    fn ping(&self) -> StoreResult<()>;
}
