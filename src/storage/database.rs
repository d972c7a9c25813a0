// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded customer/order database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `customers`: id → serialized Customer
//! - `customer_codes`: code → id (uniqueness index)
//! - `orders`: id → serialized Order
//! - `sequences`: table name → last allocated id

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::{Store, StoreError, StoreResult};
use crate::models::{Customer, NewCustomer, NewOrder, Order};

// =============================================================================
// Table Definitions
// =============================================================================

const CUSTOMERS: TableDefinition<u64, &[u8]> = TableDefinition::new("customers");

const CUSTOMER_CODES: TableDefinition<&str, u64> = TableDefinition::new("customer_codes");

const ORDERS: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const CUSTOMER_SEQ: &str = "customers";
const ORDER_SEQ: &str = "orders";

// =============================================================================
// RedbStore
// =============================================================================

/// Embedded ACID store for customers and orders.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CUSTOMERS)?;
            let _ = write_txn.open_table(CUSTOMER_CODES)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened order database");
        Ok(Self { db })
    }
}

/// Allocate the next id for `sequence` inside an open write transaction.
fn next_id(write_txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let last = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = last + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

impl Store for RedbStore {
    fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let write_txn = self.db.begin_write()?;
        let duplicate = {
            let codes = write_txn.open_table(CUSTOMER_CODES)?;
            let exists = codes.get(customer.code.as_str())?.is_some();
            exists
        };
        if duplicate {
            write_txn.abort()?;
            return Err(StoreError::DuplicateCode(customer.code));
        }

        let created = {
            let id = next_id(&write_txn, CUSTOMER_SEQ)?;
            let created = Customer {
                id,
                name: customer.name,
                code: customer.code,
                phone_number: customer.phone_number,
                created_at: Utc::now(),
            };

            let json = serde_json::to_vec(&created)?;
            let mut table = write_txn.open_table(CUSTOMERS)?;
            table.insert(id, json.as_slice())?;
            let mut codes = write_txn.open_table(CUSTOMER_CODES)?;
            codes.insert(created.code.as_str(), id)?;
            created
        };
        write_txn.commit()?;
        Ok(created)
    }

    fn get_customer(&self, id: u64) -> StoreResult<Option<Customer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let write_txn = self.db.begin_write()?;
        let created = {
            let id = next_id(&write_txn, ORDER_SEQ)?;
            let created = Order {
                id,
                customer_id: order.customer_id,
                item: order.item,
                amount: order.amount,
                time: order.time,
                created_at: Utc::now(),
            };

            let json = serde_json::to_vec(&created)?;
            let mut table = write_txn.open_table(ORDERS)?;
            table.insert(id, json.as_slice())?;
            created
        };
        write_txn.commit()?;
        Ok(created)
    }

    fn get_order(&self, id: u64) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
