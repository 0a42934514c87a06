//! # Checkout Backend Contract
//!
//! The remote collaborators every session leans on: merchant validation,
//! payment capture, and the two cart recalculation calls. All four are
//! opaque request/response services; adapters never interpret their payloads
//! beyond the shapes below.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::ShippingAddress;
use crate::cart::{Cart, CartRef, ShippingMethod};
use crate::error::CheckoutResult;

/// Payment submission forwarded to the capture endpoint after authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubmission {
    /// Base64-encoded opaque payment token
    pub apple_pay_token: String,
    /// Card network reported by the sheet
    pub credit_card_brand: String,
    pub billing_address: ShippingAddress,
    pub shipping_address: ShippingAddress,
}

/// Response of a recalculation call: the repriced cart plus the shipping
/// methods now available for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdate {
    pub cart: Cart,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
}

/// Remote checkout services reachable by request/response.
///
/// Implementations must fail fast: a hung recalculation call hangs the
/// payment sheet with it.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Exchange the browser's validation URL for an opaque merchant session
    /// object, forwarded verbatim to the sheet's validation completion.
    async fn validate_merchant(&self, validation_url: &str) -> CheckoutResult<serde_json::Value>;

    /// Forward an authorized payment for capture. The response is
    /// processor-specific and treated as opaque.
    async fn capture_payment(
        &self,
        submission: &PaymentSubmission,
    ) -> CheckoutResult<serde_json::Value>;

    /// Reprice the cart for a proposed shipping address.
    async fn recalculate_for_address(
        &self,
        cart: &CartRef,
        address: &ShippingAddress,
    ) -> CheckoutResult<CartUpdate>;

    /// Reprice the cart for a selected shipping method.
    async fn recalculate_for_shipping_method(
        &self,
        cart: &CartRef,
        shipping_method_id: &str,
    ) -> CheckoutResult<CartUpdate>;
}
