//! # applepay-session
//!
//! Dual-path Apple Pay session engine for applepay-checkout-rs.
//!
//! This crate adapts two browser payment surfaces behind one driver trait:
//!
//! 1. **NativeSessionAdapter** - the native session API
//!    - Event driven: every browser event is answered with a completion call
//!    - Sheet version negotiation (structured updates on v3, positional
//!      status codes on v1/v2)
//!    - Best for: Safari and anything exposing the native surface
//!
//! 2. **RequestSessionAdapter** - the W3C payment request API
//!    - Listener driven, with one blocking `show` call
//!    - Wallet capability probed once per request and cached
//!    - Best for: engines without the native surface
//!
//! The **CheckoutOrchestrator** runs the pay decision order across both,
//! and the **SupportDetector** answers "can this device pay at all?"
//! exactly once per page lifetime.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use applepay_session::{
//!     ApplePayConfig, CheckoutOrchestrator, HttpCheckoutBackend, NativeSessionAdapter,
//!     RequestSessionAdapter, SupportDetector,
//! };
//!
//! // Bind the engine to a browser runtime and the checkout endpoints
//! let config = ApplePayConfig::from_env()?;
//! let backend: Arc<dyn applepay_core::CheckoutBackend> =
//!     Arc::new(HttpCheckoutBackend::new(&config));
//!
//! let orchestrator = CheckoutOrchestrator::new(
//!     NativeSessionAdapter::new(Arc::clone(&native_api), Arc::clone(&backend), config.clone()),
//!     RequestSessionAdapter::new(Arc::clone(&request_api), Arc::clone(&backend), config.clone()),
//!     SupportDetector::new(native_api, request_api, config),
//! );
//!
//! // One call per pay click; user-facing messages arrive on the channel
//! let mut messages = orchestrator.subscribe();
//! orchestrator.pay(&cart, &shipping_methods).await?;
//! ```

pub mod browser;
pub mod config;
pub mod http;
pub mod native;
pub mod orchestrator;
pub mod request;
pub mod support;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use browser::{
    EventFuture, EventHandler, MerchantValidationOutcome, NativeSessionApi, NativeSessionHandle,
    NativeSessionHandlers, PaymentRequestApi, PaymentRequestHandle, PaymentResponseHandle,
    RequestListeners,
};
pub use config::ApplePayConfig;
pub use http::HttpCheckoutBackend;
pub use native::NativeSessionAdapter;
pub use orchestrator::CheckoutOrchestrator;
pub use request::RequestSessionAdapter;
pub use support::{CapabilityState, SupportDetector};
pub use wire::{APPLE_PAY_METHOD_URL, LATEST_SHEET_VERSION, MINIMUM_SHEET_VERSION};
