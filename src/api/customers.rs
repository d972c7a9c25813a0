// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Customer registration endpoints (no authentication).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::{CreateCustomerRequest, Customer},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    tag = "Customers",
    responses(
        (status = 201, body = Customer),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Persistence error, including a duplicate code")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(request) = payload?;
    let new_customer = request.validate().map_err(ApiError::bad_request)?;

    let customer = state.store.create_customer(new_customer)?;
    info!(customer_id = customer.id, code = %customer.code, "Customer registered");

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}",
    params(
        ("customer_id" = u64, Path, description = "Identifier of the customer")
    ),
    tag = "Customers",
    responses(
        (status = 200, body = Customer),
        (status = 404, description = "Unknown customer")
    )
)]
pub async fn get_customer(
    Path(customer_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Customer>, ApiError> {
    state
        .store
        .get_customer(customer_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("customer not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{customer_request, test_state};

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (state, _dir, _rx) = test_state();

        let (status, Json(created)) = create_customer(
            State(state.clone()),
            Ok(Json(customer_request("Test User", "TU001", "+254700000000"))),
        )
        .await
        .expect("customer creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert!(created.id > 0);

        let Json(loaded) = get_customer(Path(created.id), State(state))
            .await
            .expect("customer lookup succeeds");
        assert_eq!(loaded.name, "Test User");
        assert_eq!(loaded.code, "TU001");
        assert_eq!(loaded.phone_number, "+254700000000");
    }

    #[tokio::test]
    async fn duplicate_code_fails_second_create() {
        let (state, _dir, _rx) = test_state();
        let _ = create_customer(
            State(state.clone()),
            Ok(Json(customer_request("Test User", "TU001", "+254700000000"))),
        )
        .await
        .expect("first create succeeds");

        let err = create_customer(
            State(state),
            Ok(Json(customer_request("Other User", "TU001", "+254711111111"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let (state, _dir, _rx) = test_state();
        let mut request = customer_request("Test User", "TU001", "+254700000000");
        request.phone_number = None;

        let err = create_customer(State(state), Ok(Json(request)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "phone_number is required");
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let (state, _dir, _rx) = test_state();
        let err = get_customer(Path(42), State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
