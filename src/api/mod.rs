// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP API
//!
//! | Route | Auth |
//! |-------|------|
//! | `POST /api/v1/customers` | public |
//! | `GET /api/v1/customers/{customer_id}` | public |
//! | `POST /api/v1/orders` | bearer |
//! | `GET /api/v1/orders/{order_id}` | bearer |
//! | `GET /health`, `/health/live`, `/health/ready` | public |
//! | `GET /docs` | public |

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_bearer,
    models::{CreateCustomerRequest, CreateOrderRequest, Customer, Order},
    state::AppState,
};

pub mod customers;
pub mod health;
pub mod orders;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/customers", post(customers::create_customer))
        .route("/customers/{customer_id}", get(customers::get_customer));

    let protected_routes = Router::new()
        .route("/orders", post(orders::create_order))
        .route("/orders/{order_id}", get(orders::get_order))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        customers::create_customer,
        customers::get_customer,
        orders::create_order,
        orders::get_order,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Customer,
            Order,
            CreateCustomerRequest,
            CreateOrderRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Customers", description = "Customer registration"),
        (name = "Orders", description = "Order intake and SMS confirmation"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{seed_customer, test_state, VALID_TOKEN};
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn post_json(uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = bearer {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn laptop_order(customer_id: u64) -> Value {
        json!({ "item": "Laptop", "amount": 1500.0, "customer_id": customer_id })
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir, _rx) = test_state();
        let _ = router(state).into_make_service();
    }

    #[tokio::test]
    async fn register_customer_then_order_sends_confirmation() {
        let (state, _dir, mut rx) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/customers",
                json!({ "name": "Test User", "code": "TU001", "phone_number": "+254700000000" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let customer = body_json(response).await;
        let customer_id = customer["ID"].as_u64().unwrap();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/orders",
                laptop_order(customer_id),
                Some(&format!("Bearer {VALID_TOKEN}")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("x-request-id"));
        let order = body_json(response).await;
        assert_eq!(order["CustomerID"], customer_id);
        assert_eq!(order["Item"], "Laptop");
        assert!(order["Time"].is_string());

        let sent = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent.recipient, "+254700000000");
        assert_eq!(
            sent.message,
            "Dear Test User, your order for Laptop has been received."
        );

        let order_id = order["ID"].as_u64().unwrap();
        let response = app
            .oneshot(
                Request::get(format!("/api/v1/orders/{order_id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {VALID_TOKEN}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn orders_require_bearer_token() {
        let (state, _dir, mut rx) = test_state();
        let customer = seed_customer(&state);
        let app = router(state);

        let cases = [
            (None, "authorization header required"),
            (Some("Token abc"), "invalid authorization header format"),
            (Some("Bearer"), "invalid authorization header format"),
            (Some("Bearer badtoken"), "invalid token"),
        ];

        for (authorization, reason) in cases {
            let response = app
                .clone()
                .oneshot(post_json(
                    "/api/v1/orders",
                    laptop_order(customer.id),
                    authorization,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{authorization:?}");
            assert_eq!(body_json(response).await["error"], reason);
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn customer_routes_are_public() {
        let (state, _dir, _rx) = test_state();
        let customer = seed_customer(&state);

        let response = router(state)
            .oneshot(
                Request::get(format!("/api/v1/customers/{}", customer.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["Code"], "TU001");
    }

    #[tokio::test]
    async fn unknown_customer_returns_404_body() {
        let (state, _dir, _rx) = test_state();

        let response = router(state)
            .oneshot(post_json(
                "/api/v1/orders",
                laptop_order(999_999),
                Some(&format!("Bearer {VALID_TOKEN}")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "customer not found" })
        );
    }

    #[tokio::test]
    async fn invalid_bodies_are_rejected() {
        let (state, _dir, _rx) = test_state();
        let app = router(state);

        let cases = [
            json!({ "item": "Laptop", "amount": 0, "customer_id": 1 }),
            json!({ "item": "Laptop", "customer_id": 1 }),
            json!({ "amount": 10.0, "customer_id": 1 }),
            json!({ "item": "Laptop", "amount": "ten", "customer_id": 1 }),
        ];

        for body in cases {
            let response = app
                .clone()
                .oneshot(post_json(
                    "/api/v1/orders",
                    body.clone(),
                    Some(&format!("Bearer {VALID_TOKEN}")),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert!(body_json(response).await["error"].is_string());
        }

        let response = app
            .oneshot(
                Request::post("/api/v1/customers")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_customer_code_is_server_error() {
        let (state, _dir, _rx) = test_state();
        seed_customer(&state);

        let response = router(state)
            .oneshot(post_json(
                "/api/v1/customers",
                json!({ "name": "Someone Else", "code": "TU001", "phone_number": "+254711111111" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].is_string());
    }

    #[test]
    fn openapi_documents_all_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/customers",
            "/api/v1/customers/{customer_id}",
            "/api/v1/orders",
            "/api/v1/orders/{order_id}",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
