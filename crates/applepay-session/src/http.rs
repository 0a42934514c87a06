//! # Checkout Endpoint Client
//!
//! HTTP implementation of the checkout backend: merchant validation,
//! payment capture and cart recalculation against the checkout service.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use applepay_core::{
    CartRef, CartUpdate, CheckoutBackend, CheckoutError, CheckoutResult, PaymentSubmission,
    ShippingAddress,
};

use crate::config::ApplePayConfig;

/// Checkout backend over HTTP
pub struct HttpCheckoutBackend {
    base_url: String,
    client: Client,
}

impl HttpCheckoutBackend {
    /// Create a new HTTP checkout backend
    pub fn new(config: &ApplePayConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.checkout_base_url.clone(),
            client,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        let config = ApplePayConfig::from_env()?;
        Ok(Self::new(&config))
    }

    /// Builder: set custom base URL (for testing)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        on_reject: fn(String) -> CheckoutError,
    ) -> CheckoutResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Checkout endpoint error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(on_reject(error_response.error));
            }

            return Err(on_reject(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse checkout response: {}", e))
        })
    }
}

#[async_trait]
impl CheckoutBackend for HttpCheckoutBackend {
    #[instrument(skip(self), fields(url = %validation_url))]
    async fn validate_merchant(&self, validation_url: &str) -> CheckoutResult<serde_json::Value> {
        debug!("Requesting merchant session");

        let url = format!("{}/api/apple/validate-merchant", self.base_url);
        let request = self.client.post(&url).json(&ValidateMerchantRequest {
            url: validation_url.to_string(),
        });

        let session: serde_json::Value = self
            .execute(request, CheckoutError::MerchantValidation)
            .await?;

        info!("Merchant session received");
        Ok(session)
    }

    #[instrument(skip(self, submission), fields(brand = %submission.credit_card_brand))]
    async fn capture_payment(
        &self,
        submission: &PaymentSubmission,
    ) -> CheckoutResult<serde_json::Value> {
        // One key per attempt; the checkout service deduplicates retries
        let idempotency_key = Uuid::new_v4().to_string();
        debug!("Submitting payment for capture: key={}", idempotency_key);

        let url = format!("{}/api/apple/process-payment", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("Idempotency-Key", &idempotency_key)
            .json(submission);

        let receipt: serde_json::Value = self.execute(request, CheckoutError::Capture).await?;

        info!("Payment captured");
        Ok(receipt)
    }

    #[instrument(skip(self, address), fields(cart_id = %cart.id))]
    async fn recalculate_for_address(
        &self,
        cart: &CartRef,
        address: &ShippingAddress,
    ) -> CheckoutResult<CartUpdate> {
        debug!("Recalculating cart for shipping address");

        let url = format!("{}/api/cart/shipping-address", self.base_url);
        let request = self.client.post(&url).json(&AddressRecalcRequest {
            cart_id: &cart.id,
            cart_version: cart.version,
            address,
        });

        self.execute(request, CheckoutError::Recalculation).await
    }

    #[instrument(skip(self), fields(cart_id = %cart.id, shipping_method_id = %shipping_method_id))]
    async fn recalculate_for_shipping_method(
        &self,
        cart: &CartRef,
        shipping_method_id: &str,
    ) -> CheckoutResult<CartUpdate> {
        debug!("Recalculating cart for shipping method");

        let url = format!("{}/api/cart/shipping-method", self.base_url);
        let request = self.client.post(&url).json(&MethodRecalcRequest {
            cart_id: &cart.id,
            cart_version: cart.version,
            shipping_method_id,
        });

        self.execute(request, CheckoutError::Recalculation).await
    }
}

// =============================================================================
// Checkout API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ValidateMerchantRequest {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressRecalcRequest<'a> {
    cart_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_version: Option<i64>,
    address: &'a ShippingAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MethodRecalcRequest<'a> {
    cart_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_version: Option<i64>,
    shipping_method_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}
