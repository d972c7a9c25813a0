// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Order endpoints (bearer token required, enforced by the router).
//!
//! ## Create flow
//!
//! 1. Validate the body (400)
//! 2. Look up the customer (404)
//! 3. Persist the order with a server-assigned time (500 on failure)
//! 4. Hand the confirmation SMS to the dispatcher and return 201
//!
//! Step 4 never waits for the SMS. A notification is only dispatched once
//! the order is stored.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::{
    error::ApiError,
    models::{CreateOrderRequest, NewOrder, Order},
    notify::NotificationTask,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Order),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Missing, malformed or rejected bearer token"),
        (status = 404, description = "Unknown customer"),
        (status = 500, description = "Persistence error")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload?;
    let request = request.validate().map_err(ApiError::bad_request)?;

    let customer = state
        .store
        .get_customer(request.customer_id)?
        .ok_or_else(|| ApiError::not_found("customer not found"))?;

    let order = state.store.create_order(NewOrder {
        customer_id: customer.id,
        item: request.item,
        amount: request.amount,
        time: Utc::now(),
    })?;
    info!(order_id = order.id, customer_id = customer.id, "Order created");

    state
        .notifications
        .dispatch(order.id, NotificationTask::order_received(&customer, &order));

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(
        ("order_id" = u64, Path, description = "Identifier of the order")
    ),
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Order),
        (status = 401, description = "Missing, malformed or rejected bearer token"),
        (status = 404, description = "Unknown order")
    )
)]
pub async fn get_order(
    Path(order_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
    state
        .store
        .get_order(order_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("order not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{failing_store_state, order_request, seed_customer, test_state};
    use std::time::Duration;

    #[tokio::test]
    async fn create_order_persists_and_notifies() {
        let (state, _dir, mut rx) = test_state();
        let customer = seed_customer(&state);

        let (status, Json(order)) = create_order(
            State(state.clone()),
            Ok(Json(order_request("Laptop", 1500.0, customer.id))),
        )
        .await
        .expect("order creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order.customer_id, customer.id);
        assert_eq!(order.item, "Laptop");
        assert_eq!(state.store.get_order(order.id).unwrap(), Some(order));

        let sent = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("notification dispatched")
            .unwrap();
        assert_eq!(sent.recipient, "+254700000000");
        assert_eq!(
            sent.message,
            "Dear Test User, your order for Laptop has been received."
        );
    }

    #[tokio::test]
    async fn unknown_customer_is_404_without_notification() {
        let (state, _dir, mut rx) = test_state();

        let err = create_order(
            State(state),
            Ok(Json(order_request("Laptop", 1500.0, 999_999))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "customer not found");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn invalid_body_fails_before_lookup() {
        let (state, _dir, mut rx) = test_state();

        let err = create_order(State(state), Ok(Json(order_request("", 10.0, 1))))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "item is required");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn persistence_failure_is_500_without_notification() {
        let (state, mut rx) = failing_store_state();

        let err = create_order(
            State(state),
            Ok(Json(order_request("Laptop", 1500.0, 1))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn repeated_requests_create_distinct_orders() {
        let (state, _dir, _rx) = test_state();
        let customer = seed_customer(&state);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let (_, Json(order)) = create_order(
                State(state.clone()),
                Ok(Json(order_request("Laptop", 1500.0, customer.id))),
            )
            .await
            .unwrap();
            ids.push(order.id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn get_order_not_found() {
        let (state, _dir, _rx) = test_state();
        let err = get_order(Path(5), State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "order not found");
    }
}
