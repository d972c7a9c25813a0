// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Persisted entities double as response bodies and derive
//! `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Customers**: registered recipients of order notifications
//! - **Orders**: purchases that reference exactly one customer
//!
//! Request types keep every field optional so that missing fields surface as
//! a validation message rather than a JSON rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Customer Models
// =============================================================================

/// A registered customer.
///
/// Serialized with the record field names (`ID`, `Name`, `PhoneNumber`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    /// Server-assigned identifier.
    #[serde(rename = "ID")]
    pub id: u64,
    /// Display name used in notification messages.
    pub name: String,
    /// Unique business code.
    pub code: String,
    /// Contact address for SMS notifications (E.164 phone number).
    pub phone_number: String,
    /// When the customer was registered.
    pub created_at: DateTime<Utc>,
}

/// Fields of a customer that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub code: String,
    pub phone_number: String,
}

/// Request to register a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub phone_number: Option<String>,
}

impl CreateCustomerRequest {
    /// Check required fields and produce the customer to insert.
    pub fn validate(self) -> Result<NewCustomer, String> {
        Ok(NewCustomer {
            name: required_text("name", self.name)?,
            code: required_text("code", self.code)?,
            phone_number: required_text("phone_number", self.phone_number)?,
        })
    }
}

// =============================================================================
// Order Models
// =============================================================================

/// An order placed on behalf of a customer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    /// Server-assigned identifier.
    #[serde(rename = "ID")]
    pub id: u64,
    /// The customer this order belongs to.
    #[serde(rename = "CustomerID")]
    pub customer_id: u64,
    /// Item description.
    pub item: String,
    /// Order amount.
    pub amount: f64,
    /// Order time, assigned by the server when the order is persisted.
    pub time: DateTime<Utc>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

/// Fields of an order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: u64,
    pub item: String,
    pub amount: f64,
    pub time: DateTime<Utc>,
}

/// Request to create an order.
///
/// Any client-supplied `time` is ignored; unknown fields are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub customer_id: Option<u64>,
}

/// A validated order request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrderRequest {
    pub item: String,
    pub amount: f64,
    pub customer_id: u64,
}

impl CreateOrderRequest {
    /// Check required fields: non-empty item, non-zero amount, positive customer id.
    pub fn validate(self) -> Result<ValidOrderRequest, String> {
        let item = required_text("item", self.item)?;

        let amount = match self.amount {
            Some(amount) if amount.is_finite() && amount != 0.0 => amount,
            Some(_) => return Err("amount must be a non-zero number".to_string()),
            None => return Err("amount is required".to_string()),
        };

        let customer_id = match self.customer_id {
            Some(id) if id > 0 => id,
            Some(_) => return Err("customer_id must be a positive integer".to_string()),
            None => return Err("customer_id is required".to_string()),
        };

        Ok(ValidOrderRequest {
            item,
            amount,
            customer_id,
        })
    }
}

fn required_text(field: &str, value: Option<String>) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("{field} is required")),
    }
}
