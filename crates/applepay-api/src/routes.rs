//! # Routes
//!
//! Axum router configuration for the demo checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - GET  /api/cart - Current cart snapshot
/// - POST /api/apple/validate-merchant - Merchant validation forwarding
/// - POST /api/apple/process-payment - Payment capture
/// - POST /api/cart/shipping-address - Reprice for a proposed address
/// - POST /api/cart/shipping-method - Reprice for a selected method
pub fn create_router(state: AppState) -> Router {
    // The session engine runs in-browser, so the API must answer
    // cross-origin preflights
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let apple_routes = Router::new()
        .route("/validate-merchant", post(handlers::validate_merchant))
        .route("/process-payment", post(handlers::process_payment));

    let cart_routes = Router::new()
        .route("/", get(handlers::get_cart))
        .route("/shipping-address", post(handlers::recalculate_shipping_address))
        .route("/shipping-method", post(handlers::recalculate_shipping_method));

    let api_routes = Router::new()
        .nest("/apple", apple_routes)
        .nest("/cart", cart_routes);

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API
        .nest("/api", api_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppConfig, DemoCheckout};
    use applepay_session::ApplePayConfig;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_state() -> AppState {
        AppState {
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
            },
            merchant: ApplePayConfig::new("merchant.com.enginevector.store", "store.test"),
            store: Arc::new(DemoCheckout::seeded()),
            http_client: reqwest::Client::new(),
        }
    }

    fn test_server() -> TestServer {
        TestServer::new(create_router(test_state())).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = test_server();

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "applepay-checkout");
    }

    #[tokio::test]
    async fn test_cart_snapshot_is_priced() {
        let server = test_server();

        let response = server.get("/api/cart").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["cart"]["id"], "demo-cart");
        assert_eq!(body["cart"]["totalPrice"]["centAmount"], 12500);
        assert_eq!(body["cart"]["taxedPrice"]["totalGross"]["centAmount"], 14040);
        assert_eq!(body["shippingMethods"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_address_recalculation_round_trip() {
        let server = test_server();

        let response = server
            .post("/api/cart/shipping-address")
            .json(&json!({
                "cartId": "demo-cart",
                "cartVersion": 1,
                "address": {
                    "city": "Springfield",
                    "country": "US",
                    "postalCode": "62704",
                    "state": "IL",
                    "streetName": "Main",
                    "streetNumber": "123"
                }
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["cart"]["version"], 2);
        assert_eq!(body["cart"]["shippingAddress"]["city"], "Springfield");
    }

    #[tokio::test]
    async fn test_stale_cart_version_conflicts() {
        let server = test_server();

        let response = server
            .post("/api/cart/shipping-address")
            .json(&json!({
                "cartId": "demo-cart",
                "cartVersion": 99,
                "address": { "city": "Springfield", "country": "US", "postalCode": "62704",
                             "state": "IL", "streetName": "Main", "streetNumber": "123" }
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("version conflict"));
    }

    #[tokio::test]
    async fn test_shipping_method_recalculation_reprices() {
        let server = test_server();

        let response = server
            .post("/api/cart/shipping-method")
            .json(&json!({
                "cartId": "demo-cart",
                "cartVersion": 1,
                "shippingMethodId": "express"
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(
            body["cart"]["shippingInfo"]["shippingMethod"]["id"],
            "express"
        );
        assert_eq!(body["cart"]["taxedPrice"]["totalGross"]["centAmount"], 15120);
    }

    #[tokio::test]
    async fn test_unknown_shipping_method_rejected() {
        let server = test_server();

        let response = server
            .post("/api/cart/shipping-method")
            .json(&json!({
                "cartId": "demo-cart",
                "shippingMethodId": "drone"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_process_payment_issues_order() {
        let server = test_server();

        let response = server
            .post("/api/apple/process-payment")
            .json(&json!({
                "applePayToken": "eyJkYXRhIjoib3BhcXVlIn0=",
                "creditCardBrand": "visa",
                "billingAddress": { "city": "Springfield", "country": "US", "postalCode": "62704",
                                    "state": "IL", "streetName": "Main", "streetNumber": "123" },
                "shippingAddress": { "city": "Springfield", "country": "US", "postalCode": "62704",
                                     "state": "IL", "streetName": "Main", "streetNumber": "123" }
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(!body["orderId"].as_str().unwrap().is_empty());
        assert_eq!(body["status"], "captured");
    }

    #[tokio::test]
    async fn test_process_payment_requires_token() {
        let server = test_server();

        let response = server
            .post("/api/apple/process-payment")
            .json(&json!({
                "applePayToken": "",
                "creditCardBrand": "visa",
                "billingAddress": { "city": "", "country": "", "postalCode": "",
                                    "state": "", "streetName": "", "streetNumber": "" },
                "shippingAddress": { "city": "", "country": "", "postalCode": "",
                                     "state": "", "streetName": "", "streetNumber": "" }
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validate_merchant_forwards_registration() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paymentSession"))
            .and(body_partial_json(json!({
                "merchantIdentifier": "merchant.com.enginevector.store",
                "initiative": "web",
                "initiativeContext": "store.test"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "merchantSessionIdentifier": "ms-1",
                "nonce": "abc"
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let server = test_server();
        let response = server
            .post("/api/apple/validate-merchant")
            .json(&json!({ "url": format!("{}/paymentSession", upstream.uri()) }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["merchantSessionIdentifier"], "ms-1");
    }

    #[tokio::test]
    async fn test_validate_merchant_upstream_failure_maps_to_500() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paymentSession"))
            .respond_with(ResponseTemplate::new(500).set_body_string("certificate rejected"))
            .mount(&upstream)
            .await;

        let server = test_server();
        let response = server
            .post("/api/apple/validate-merchant")
            .json(&json!({ "url": format!("{}/paymentSession", upstream.uri()) }))
            .await;

        response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "Merchant validation failed");
    }
}
