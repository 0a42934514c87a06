//! # Browser Surface Boundary
//!
//! Trait seams over the two device payment surfaces:
//!
//! - [`NativeSessionApi`] / [`NativeSessionHandle`]: the event-driven native
//!   session surface (variant A)
//! - [`PaymentRequestApi`] / [`PaymentRequestHandle`]: the blocking payment
//!   request surface (variant B)
//!
//! Production embeds a bridge implementing these traits over the real
//! surfaces; tests implement them with scripted mocks. The engine only ever
//! talks through the traits.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use applepay_core::{CheckoutResult, PaymentAddress};

use crate::wire::{
    AuthorizedPayment, MerchantValidationEvent, PaymentAuthorizedEvent, PaymentCompletion,
    PaymentDetailsInit, PaymentDetailsUpdate, PaymentMethodChangeEvent, PaymentMethodCompletion,
    PaymentMethodData, PaymentMethodSelectedEvent, PaymentOptions, PaymentSheetRequest,
    ResponseCompletion, SessionCancelEvent, ShippingContactCompletion,
    ShippingContactSelectedEvent, ShippingMethodCompletion, ShippingMethodSelectedEvent,
    ValidateMerchantEvent,
};

/// Boxed future returned by event handlers
pub type EventFuture<T = ()> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Shared event handler closure
pub type EventHandler<E, T = ()> = Arc<dyn Fn(E) -> EventFuture<T> + Send + Sync>;

fn drop_event<E: 'static>() -> EventHandler<E> {
    Arc::new(|_| Box::pin(async {}))
}

// ---------------------------------------------------------------------------
// Native session surface (variant A)
// ---------------------------------------------------------------------------

/// Handler bundle for native session events. Installed once after session
/// creation; replaced with [`NativeSessionHandlers::noop`] at teardown so a
/// handle the surface still owns can no longer reach the engine.
pub struct NativeSessionHandlers {
    pub on_validate_merchant: EventHandler<ValidateMerchantEvent>,
    pub on_payment_method_selected: EventHandler<PaymentMethodSelectedEvent>,
    pub on_shipping_contact_selected: EventHandler<ShippingContactSelectedEvent>,
    pub on_shipping_method_selected: EventHandler<ShippingMethodSelectedEvent>,
    pub on_payment_authorized: EventHandler<PaymentAuthorizedEvent>,
    /// Cancellation is fire-and-forget; the surface does not await it
    pub on_cancel: Arc<dyn Fn(SessionCancelEvent) + Send + Sync>,
}

impl NativeSessionHandlers {
    /// Handlers that drop every event
    pub fn noop() -> Self {
        Self {
            on_validate_merchant: drop_event(),
            on_payment_method_selected: drop_event(),
            on_shipping_contact_selected: drop_event(),
            on_shipping_method_selected: drop_event(),
            on_payment_authorized: drop_event(),
            on_cancel: Arc::new(|_| {}),
        }
    }
}

/// Entry points of the native session surface
#[async_trait]
pub trait NativeSessionApi: Send + Sync {
    /// Whether the surface exists on this device at all
    fn is_available(&self) -> bool;

    /// Whether the surface supports the given sheet version
    fn supports_version(&self, version: u32) -> bool;

    /// One-shot wallet probe: whether the device holds a usable card for
    /// this merchant
    async fn can_make_payments_with_active_card(&self, merchant_id: &str)
        -> CheckoutResult<bool>;

    /// Construct a session for the negotiated sheet version. The sheet is
    /// not presented until [`NativeSessionHandle::begin`] is called.
    fn open_session(
        &self,
        version: u32,
        request: &PaymentSheetRequest,
    ) -> CheckoutResult<Arc<dyn NativeSessionHandle>>;
}

/// One native session instance.
///
/// Every delivered event must be answered through exactly one of the
/// completion methods below or the sheet spins forever; the engine owns that
/// obligation, the surface only transports it.
pub trait NativeSessionHandle: Send + Sync {
    /// Install the event handler bundle
    fn set_handlers(&self, handlers: NativeSessionHandlers);

    /// Present the sheet; events start flowing after this call
    fn begin(&self);

    /// Dismiss the sheet and invalidate the session
    fn abort(&self);

    /// Answer a merchant validation event with the acquirer's session blob
    fn complete_merchant_validation(&self, merchant_session: serde_json::Value);

    /// Answer a payment-method-selected event
    fn complete_payment_method_selection(&self, completion: PaymentMethodCompletion);

    /// Answer a shipping-contact-selected event
    fn complete_shipping_contact_selection(&self, completion: ShippingContactCompletion);

    /// Answer a shipping-method-selected event
    fn complete_shipping_method_selection(&self, completion: ShippingMethodCompletion);

    /// Answer a payment-authorized event
    fn complete_payment(&self, completion: PaymentCompletion);
}

// ---------------------------------------------------------------------------
// Payment request surface (variant B)
// ---------------------------------------------------------------------------

/// Outcome of the merchant validation listener on the request surface
pub enum MerchantValidationOutcome {
    /// The listener produced (or failed to produce) a merchant session
    Complete(CheckoutResult<serde_json::Value>),
    /// The event addressed a different payment method; left unhandled
    NotHandled,
}

/// Listener bundle for payment request events. Address and option change
/// listeners carry no payload; the current values are read back from the
/// request handle.
pub struct RequestListeners {
    pub on_merchant_validation: EventHandler<MerchantValidationEvent, MerchantValidationOutcome>,
    pub on_payment_method_change: EventHandler<PaymentMethodChangeEvent, PaymentDetailsUpdate>,
    pub on_shipping_address_change: Arc<dyn Fn() -> EventFuture<PaymentDetailsUpdate> + Send + Sync>,
    pub on_shipping_option_change: Arc<dyn Fn() -> EventFuture<PaymentDetailsUpdate> + Send + Sync>,
}

impl RequestListeners {
    /// Listeners that acknowledge every event without repricing
    pub fn noop() -> Self {
        Self {
            on_merchant_validation: Arc::new(|_| {
                Box::pin(async { MerchantValidationOutcome::NotHandled })
            }),
            on_payment_method_change: Arc::new(|_| {
                Box::pin(async { PaymentDetailsUpdate::empty() })
            }),
            on_shipping_address_change: Arc::new(|| {
                Box::pin(async { PaymentDetailsUpdate::empty() })
            }),
            on_shipping_option_change: Arc::new(|| {
                Box::pin(async { PaymentDetailsUpdate::empty() })
            }),
        }
    }
}

/// Entry points of the payment request surface
pub trait PaymentRequestApi: Send + Sync {
    /// Whether the surface exists on this device at all
    fn is_available(&self) -> bool;

    /// Construct a request from method data, initial details and options.
    /// Each presentation attempt requires a fresh request.
    fn create_request(
        &self,
        method_data: Vec<PaymentMethodData>,
        details: PaymentDetailsInit,
        options: PaymentOptions,
    ) -> CheckoutResult<Arc<dyn PaymentRequestHandle>>;
}

/// One payment request instance
#[async_trait]
pub trait PaymentRequestHandle: Send + Sync {
    /// Install the event listener bundle
    fn set_listeners(&self, listeners: RequestListeners);

    /// Probe whether the device can pay with this request's method data
    async fn can_make_payment(&self) -> CheckoutResult<bool>;

    /// Present the sheet and block until authorization or dismissal.
    /// `Ok(None)` means the sheet resolved without a payment response.
    async fn show(&self) -> CheckoutResult<Option<Arc<dyn PaymentResponseHandle>>>;

    /// Address most recently delivered by a shipping address change
    fn shipping_address(&self) -> Option<PaymentAddress>;

    /// Identifier of the currently selected shipping option
    fn shipping_option(&self) -> Option<String>;

    /// Tear the request down without presenting
    fn abort(&self);
}

/// The response resolved by a successful [`PaymentRequestHandle::show`]
#[async_trait]
pub trait PaymentResponseHandle: Send + Sync {
    /// The authorized payment carried by the response
    fn payment(&self) -> AuthorizedPayment;

    /// Resolve the sheet; must be called exactly once per response
    async fn complete(&self, completion: ResponseCompletion) -> CheckoutResult<()>;
}
