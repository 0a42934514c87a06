//! # Request Handlers
//!
//! Axum request handlers for the demo checkout API: merchant validation
//! forwarding, payment capture, and the two cart recalculation endpoints
//! the session engine calls mid-sheet.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use applepay_core::{CartUpdate, PaymentSubmission, ShippingAddress};

use crate::state::{AppState, StoreError};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Merchant validation request from the session engine
#[derive(Debug, Deserialize)]
pub struct ValidateMerchantRequest {
    /// Validation URL handed out by the browser sheet
    pub url: String,
}

/// Registration payload forwarded to the validation URL
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MerchantRegistration {
    merchant_identifier: String,
    display_name: String,
    initiative: String,
    initiative_context: String,
    domain_name: String,
}

/// Address recalculation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateAddressRequest {
    pub cart_id: String,
    #[serde(default)]
    pub cart_version: Option<i64>,
    pub address: ShippingAddress,
}

/// Shipping method recalculation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateMethodRequest {
    pub cart_id: String,
    #[serde(default)]
    pub cart_version: Option<i64>,
    pub shipping_method_id: String,
}

/// Capture response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentResponse {
    pub order_id: String,
    pub status: String,
    pub captured_at: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "applepay-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Current cart and shipping methods, as the session engine will see them
pub async fn get_cart(State(state): State<AppState>) -> Json<CartUpdate> {
    Json(state.store.snapshot())
}

/// Exchange the browser's validation URL for a merchant session.
///
/// The registration payload carries our merchant identity; the response is
/// opaque and forwarded verbatim to the session engine.
#[instrument(skip(state, request), fields(url = %request.url))]
pub async fn validate_merchant(
    State(state): State<AppState>,
    Json(request): Json<ValidateMerchantRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    if request.url.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing validation URL", 400)),
        ));
    }

    let registration = MerchantRegistration {
        merchant_identifier: state.merchant.merchant_id.clone(),
        display_name: state.merchant.display_name.clone(),
        initiative: "web".to_string(),
        initiative_context: state.merchant.merchant_domain.clone(),
        domain_name: state.merchant.merchant_domain.clone(),
    };

    let response = state
        .http_client
        .post(&request.url)
        .json(&registration)
        .send()
        .await
        .map_err(|e| {
            error!("Merchant validation request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(
                    ErrorResponse::new("Merchant validation failed", 500)
                        .with_details(e.to_string()),
                ),
            )
        })?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        error!("Merchant validation upstream error: {} | {}", status, body);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Merchant validation failed", 500)),
        ));
    }

    let session: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
        error!("Merchant validation returned non-JSON body: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Merchant validation failed", 500)),
        )
    })?;

    info!("Merchant session established");
    Ok(Json(session))
}

/// Demo payment capture: accepts the authorized submission and issues an
/// order id. A real deployment would hand the token to its processor here.
#[instrument(skip(headers, submission), fields(brand = %submission.credit_card_brand))]
pub async fn process_payment(
    headers: HeaderMap,
    Json(submission): Json<PaymentSubmission>,
) -> Result<Json<ProcessPaymentResponse>, (StatusCode, Json<ErrorResponse>)> {
    if submission.apple_pay_token.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing Apple Pay token", 400)),
        ));
    }

    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    let order_id = Uuid::new_v4().to_string();
    info!(
        "Captured payment: order={}, ship_to={}, idempotency_key={}",
        order_id, submission.shipping_address.city, idempotency_key
    );

    Ok(Json(ProcessPaymentResponse {
        order_id,
        status: "captured".to_string(),
        captured_at: Utc::now().to_rfc3339(),
    }))
}

/// Reprice the cart for a proposed shipping address
#[instrument(skip(state, request), fields(cart_id = %request.cart_id))]
pub async fn recalculate_shipping_address(
    State(state): State<AppState>,
    Json(request): Json<RecalculateAddressRequest>,
) -> Result<Json<CartUpdate>, (StatusCode, Json<ErrorResponse>)> {
    let update = state
        .store
        .recalculate_for_address(&request.cart_id, request.cart_version, request.address)
        .map_err(|e| {
            error!("Address recalculation rejected: {}", e);
            store_error_to_response(e)
        })?;

    info!(
        "Cart repriced for address: version={:?}, total={}",
        update.cart.version,
        update.cart.effective_total().to_decimal_string()
    );
    Ok(Json(update))
}

/// Reprice the cart for a selected shipping method
#[instrument(skip(state, request), fields(cart_id = %request.cart_id, method = %request.shipping_method_id))]
pub async fn recalculate_shipping_method(
    State(state): State<AppState>,
    Json(request): Json<RecalculateMethodRequest>,
) -> Result<Json<CartUpdate>, (StatusCode, Json<ErrorResponse>)> {
    let update = state
        .store
        .recalculate_for_shipping_method(
            &request.cart_id,
            request.cart_version,
            &request.shipping_method_id,
        )
        .map_err(|e| {
            error!("Shipping method recalculation rejected: {}", e);
            store_error_to_response(e)
        })?;

    info!(
        "Cart repriced for method: version={:?}, total={}",
        update.cart.version,
        update.cart.effective_total().to_decimal_string()
    );
    Ok(Json(update))
}
