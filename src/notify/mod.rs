// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Customer Notifications
//!
//! Notifications are fire-and-forget: the order workflow hands a
//! [`NotificationTask`] to the [`NotificationDispatcher`], which spawns a
//! detached tokio task and returns immediately. Nobody awaits the task and
//! its outcome is only visible in the logs.
//!
//! ## Delivery
//!
//! - At most once: no retry, no queue, nothing persisted
//! - Not cancelled when the originating request finishes
//! - Concurrent sends are bounded by a semaphore; tasks waiting for a
//!   permit never hold up a request

pub mod sms;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info_span, Instrument};

use crate::models::{Customer, Order};

pub use sms::{SmsClient, SmsError, SmsNotifier};

/// Send a human-readable message to a recipient address.
///
/// Implementations report failures through logging only.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, message: &str);
}

/// A single notification to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTask {
    pub recipient: String,
    pub message: String,
}

impl NotificationTask {
    /// Confirmation sent to the customer once their order is stored.
    pub fn order_received(customer: &Customer, order: &Order) -> Self {
        Self {
            recipient: customer.phone_number.clone(),
            message: format!(
                "Dear {}, your order for {} has been received.",
                customer.name, order.item
            ),
        }
    }
}

/// Spawns notification tasks detached from the caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    permits: Option<Arc<Semaphore>>,
}

impl NotificationDispatcher {
    /// Dispatcher allowing at most `max_in_flight` concurrent sends (0 = unbounded).
    pub fn new(notifier: Arc<dyn Notifier>, max_in_flight: usize) -> Self {
        let permits = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        Self { notifier, permits }
    }

    /// Run `task` on its own tokio task and return without waiting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, order_id: u64, task: NotificationTask) {
        let notifier = Arc::clone(&self.notifier);
        let permits = self.permits.clone();

        let job = async move {
            // Held for the duration of the send
            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        tracing::warn!("Notification semaphore closed, dropping notification");
                        return;
                    }
                },
                None => None,
            };
            notifier.send(&task.recipient, &task.message).await;
        };

        tokio::spawn(job.instrument(info_span!("notification", order_id)));
    }
}
