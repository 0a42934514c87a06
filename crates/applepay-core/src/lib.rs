//! # applepay-core
//!
//! Core types and traits for the applepay-checkout session engine.
//!
//! This crate provides:
//! - `Cart`, `ShippingMethod`, and `Money` for the priced cart model
//! - `cart_to_total` / `cart_to_line_items` / `shipping_methods_to_options`
//!   projections into payment-sheet shapes
//! - `contact_to_address` / `address_to_contact` lossy address translation
//! - `SessionDriver` trait implemented by both payment-surface adapters
//! - `CheckoutBackend` trait for the remote checkout collaborators
//! - `CheckoutError` for typed error handling with the user-facing
//!   classification table
//!
//! ## Example
//!
//! ```rust,ignore
//! use applepay_core::{Cart, CartLineItem, Money, ShippingMethod, project_cart};
//!
//! // A priced cart as delivered by the cart service
//! let cart = Cart::new("cart-1")
//!     .with_line_item(CartLineItem::new("Widget", Money::from_cents(12500)))
//!     .with_total(Money::from_cents(12500))
//!     .with_shipping(ShippingMethod::new("standard", "$5 standard", Money::from_cents(500)));
//!
//! // Project it into sheet shapes
//! let snapshot = project_cart(&cart, &methods);
//!
//! // Hand the snapshot to whichever session adapter the orchestrator picked
//! ```

pub mod address;
pub mod backend;
pub mod cart;
pub mod driver;
pub mod error;
pub mod money;
pub mod projection;

// Re-exports for convenience
pub use address::{
    address_to_contact, contact_to_address, payment_address_to_address, split_street_line,
    PaymentAddress, PaymentContact, ShippingAddress, DEFAULT_COUNTRY, LOCAL_PHONE_PREFIX,
};
pub use backend::{CartUpdate, CheckoutBackend, PaymentSubmission};
pub use cart::{Cart, CartLineItem, CartRef, ShippingInfo, ShippingMethod, TaxedPrice};
pub use driver::{
    BoxedSessionDriver, ErrorCallback, SessionApiKind, SessionCreation, SessionDriver,
    SessionPhase, StartOutcome,
};
pub use error::{
    CheckoutError, CheckoutResult, CANNOT_PAY_SECURELY_MESSAGE, DEVICE_NOT_SUPPORTED_MESSAGE,
    NO_USABLE_PAYMENT_METHOD_MESSAGE,
};
pub use money::{Currency, Money};
pub use projection::{
    cart_to_line_items, cart_to_total, project_cart, shipping_methods_to_options, PricingSnapshot,
    SheetItem, SheetShippingOption, SHIPPING_LABEL, TAXES_LABEL, TOTAL_LABEL,
};
