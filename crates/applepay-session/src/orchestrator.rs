//! # Checkout Orchestrator
//!
//! Ties the two payment adapters and the support detector into one pay
//! action:
//! - Prefers the native session surface whenever it exists
//! - Falls back to the request surface only when the native path declines
//!   or is absent, and the detector has confirmed wallet capability
//! - Classifies every surfaced error through one table before it reaches
//!   the user
//!
//! User-facing messages travel over a watch channel: the UI subscribes
//! once and re-renders whenever the value changes. `None` means no error
//! is showing.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument};

use applepay_core::{
    BoxedSessionDriver, Cart, CheckoutError, CheckoutResult, SessionApiKind, SessionCreation,
    ShippingMethod, StartOutcome,
};

use crate::native::NativeSessionAdapter;
use crate::request::RequestSessionAdapter;
use crate::support::{CapabilityState, SupportDetector};

/// Entry point for a user-initiated pay action
pub struct CheckoutOrchestrator {
    native: BoxedSessionDriver,
    request: BoxedSessionDriver,
    support: Arc<SupportDetector>,
    messages: watch::Sender<Option<String>>,
}

impl CheckoutOrchestrator {
    /// Wire the adapters together. The native adapter's error callback is
    /// attached here so fatal in-session errors reach the same message
    /// channel as errors raised directly by `pay`.
    pub fn new(
        native: NativeSessionAdapter,
        request: RequestSessionAdapter,
        support: SupportDetector,
    ) -> Self {
        let (messages, _) = watch::channel(None);

        let sender = messages.clone();
        native.set_error_callback(Arc::new(move |err| {
            publish_error(&sender, &err);
        }));

        Self {
            native: Arc::new(native),
            request: Arc::new(request),
            support: Arc::new(support),
            messages,
        }
    }

    /// Subscribe to user-facing message changes
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.messages.subscribe()
    }

    /// The message currently showing, if any
    pub fn message(&self) -> Option<String> {
        self.messages.borrow().clone()
    }

    /// Determine (or recall) what this device can do
    pub async fn capabilities(&self) -> CapabilityState {
        self.support.determine().await
    }

    /// Whether any payment path is worth offering in the UI
    pub async fn is_supported(&self) -> bool {
        self.support.determine().await.is_supported()
    }

    /// Run the pay decision order. Returns which surface carried the
    /// attempt: for the native surface this means the sheet is presented
    /// and the session advances on browser events; for the request surface
    /// the call has already run to authorized completion.
    #[instrument(skip(self, cart, shipping_methods), fields(cart_id = %cart.id))]
    pub async fn pay(
        &self,
        cart: &Cart,
        shipping_methods: &[ShippingMethod],
    ) -> CheckoutResult<SessionApiKind> {
        // A fresh attempt clears whatever the last one surfaced
        self.messages.send_replace(None);

        if self.native.is_available() {
            match self.attempt(&self.native, cart, shipping_methods).await {
                Ok(Some(_)) => return Ok(SessionApiKind::NativeSession),
                Ok(None) => {
                    info!("Native surface reports no usable card; considering request surface")
                }
                Err(err) => {
                    publish_error(&self.messages, &err);
                    return Err(err);
                }
            }
        }

        let capabilities = self.support.determine().await;
        if self.request.is_available() && capabilities.can_make_payments {
            match self.attempt(&self.request, cart, shipping_methods).await {
                Ok(Some(_)) => return Ok(SessionApiKind::PaymentRequest),
                Ok(None) => info!("Request surface reports no usable card"),
                Err(err) => {
                    publish_error(&self.messages, &err);
                    return Err(err);
                }
            }
        }

        let err = CheckoutError::NoUsablePaymentMethod;
        publish_error(&self.messages, &err);
        Err(err)
    }

    /// Tear down whichever surface holds a live session
    pub fn end_session(&self) {
        self.native.end_session();
        self.request.end_session();
    }

    /// Create and start a session on one driver. `Ok(None)` means the
    /// device declined with no usable card and the caller may try the
    /// other surface.
    async fn attempt(
        &self,
        driver: &BoxedSessionDriver,
        cart: &Cart,
        shipping_methods: &[ShippingMethod],
    ) -> CheckoutResult<Option<StartOutcome>> {
        match driver.create_session(cart, shipping_methods).await? {
            SessionCreation::Ready => {
                let outcome = driver.start().await?;
                info!(surface = %driver.kind(), ?outcome, "Payment attempt underway");
                Ok(Some(outcome))
            }
            SessionCreation::NoUsableCard => Ok(None),
        }
    }
}

/// Push an error through the classification table. Silenced names are
/// logged and never shown; everything else replaces the current message.
fn publish_error(messages: &watch::Sender<Option<String>>, err: &CheckoutError) {
    match err.user_message() {
        Some(message) => {
            info!(name = err.name(), %message, "Surfacing checkout error");
            messages.send_replace(Some(message));
        }
        None => debug!(name = err.name(), "Suppressed checkout error"),
    }
}
