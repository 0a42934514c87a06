//! # Native Session Adapter
//!
//! Variant A of the dual-path engine: the event-driven native session
//! surface. An adapter instance owns at most one live session at a time,
//! held in a single slot that is replaced wholesale on creation and
//! released on every terminal path.
//!
//! The load-bearing rule here is completion discipline: every event the
//! surface delivers is answered through exactly one completion call on
//! every exit path, including failed remote calls. A handler that returns
//! without completing leaves the payment sheet spinning forever.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use applepay_core::{
    address_to_contact, contact_to_address, project_cart, Cart, CartRef, CartUpdate,
    CheckoutBackend, CheckoutError, CheckoutResult, ErrorCallback, PaymentContact,
    PaymentSubmission, PricingSnapshot, SessionApiKind, SessionCreation, SessionDriver,
    SessionPhase, ShippingAddress, ShippingMethod, StartOutcome,
};

use crate::browser::{NativeSessionApi, NativeSessionHandle, NativeSessionHandlers};
use crate::config::ApplePayConfig;
use crate::wire::{
    native_line_items, native_total, AuthorizedPayment, PaymentAuthorizedEvent, PaymentCompletion,
    PaymentMethodCompletion, PaymentMethodSelectedEvent, PaymentSheetRequest, SheetError,
    ShippingContactCompletion, ShippingContactSelectedEvent, ShippingMethodCompletion,
    ShippingMethodSelectedEvent, ValidateMerchantEvent, LATEST_SHEET_VERSION,
    MINIMUM_SHEET_VERSION,
};

/// Session driver over the native session surface
pub struct NativeSessionAdapter {
    core: Arc<NativeCore>,
}

struct NativeCore {
    api: Arc<dyn NativeSessionApi>,
    backend: Arc<dyn CheckoutBackend>,
    config: ApplePayConfig,
    phase: Mutex<SessionPhase>,
    /// Arena-of-one: at most one live session per adapter
    active: Mutex<Option<ActiveNativeSession>>,
    error_callback: Mutex<Option<ErrorCallback>>,
}

struct ActiveNativeSession {
    id: Uuid,
    /// Negotiated sheet version; every completion shape branches on it
    version: u32,
    handle: Arc<dyn NativeSessionHandle>,
    /// Last priced cart; replaced after each successful recalculation
    cart: Cart,
    shipping_methods: Vec<ShippingMethod>,
    created_at: DateTime<Utc>,
}

impl NativeSessionAdapter {
    /// Create a new native session adapter
    pub fn new(
        api: Arc<dyn NativeSessionApi>,
        backend: Arc<dyn CheckoutBackend>,
        config: ApplePayConfig,
    ) -> Self {
        Self {
            core: Arc::new(NativeCore {
                api,
                backend,
                config,
                phase: Mutex::new(SessionPhase::Idle),
                active: Mutex::new(None),
                error_callback: Mutex::new(None),
            }),
        }
    }

    /// Register the callback through which fatal in-session errors are
    /// reported after `start` has returned
    pub fn set_error_callback(&self, callback: ErrorCallback) {
        *self.core.error_callback.lock().unwrap() = Some(callback);
    }

    /// Highest sheet version the surface supports, probing downward from
    /// [`LATEST_SHEET_VERSION`]. Returns [`MINIMUM_SHEET_VERSION`] when
    /// nothing reports support.
    pub fn latest_supported_version(&self) -> u32 {
        self.core.latest_supported_version()
    }
}

impl NativeCore {
    fn set_phase(&self, phase: SessionPhase) {
        let mut current = self.phase.lock().unwrap();
        debug!(from = %current, to = %phase, "Native session phase change");
        *current = phase;
    }

    fn current_phase(&self) -> SessionPhase {
        *self.phase.lock().unwrap()
    }

    fn latest_supported_version(&self) -> u32 {
        let mut version = LATEST_SHEET_VERSION;
        while version > MINIMUM_SHEET_VERSION && !self.api.supports_version(version) {
            version -= 1;
        }
        version
    }

    fn report_error(&self, error: CheckoutError) {
        let callback = self.error_callback.lock().unwrap().clone();
        match callback {
            Some(callback) => callback(error),
            None => warn!(error = %error, "No error callback registered; dropping session error"),
        }
    }

    /// Everything a handler needs: negotiated version, the handle, and a
    /// projection of the last priced cart
    fn session_context(
        &self,
    ) -> Option<(u32, Arc<dyn NativeSessionHandle>, PricingSnapshot)> {
        let active = self.active.lock().unwrap();
        active.as_ref().map(|session| {
            (
                session.version,
                Arc::clone(&session.handle),
                project_cart(&session.cart, &session.shipping_methods),
            )
        })
    }

    fn cart_reference(&self) -> Option<CartRef> {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.cart.reference())
    }

    fn session_id(&self) -> Option<Uuid> {
        self.active.lock().unwrap().as_ref().map(|session| session.id)
    }

    /// Store a recalculated cart and return its fresh projection. An empty
    /// method list in the update keeps the previously known methods.
    fn store_reprice(&self, update: CartUpdate) -> Option<PricingSnapshot> {
        let mut active = self.active.lock().unwrap();
        active.as_mut().map(|session| {
            session.cart = update.cart;
            if !update.shipping_methods.is_empty() {
                session.shipping_methods = update.shipping_methods;
            }
            project_cart(&session.cart, &session.shipping_methods)
        })
    }

    /// Detach handlers, abort and release the slot. Handlers are swapped to
    /// no-ops first so no event can re-enter the engine mid-teardown.
    /// Returns whether a session existed.
    fn destroy_session(&self) -> bool {
        let taken = self.active.lock().unwrap().take();
        match taken {
            Some(session) => {
                session.handle.set_handlers(NativeSessionHandlers::noop());
                session.handle.abort();
                debug!(
                    session_id = %session.id,
                    created_at = %session.created_at,
                    "Native session destroyed"
                );
                true
            }
            None => false,
        }
    }

    fn end(&self, phase: SessionPhase) {
        self.destroy_session();
        self.set_phase(phase);
    }

    fn sheet_request(&self, cart: &Cart, shipping_methods: &[ShippingMethod]) -> PaymentSheetRequest {
        let snapshot = project_cart(cart, shipping_methods);
        PaymentSheetRequest {
            country_code: self.config.country_code.clone(),
            currency_code: self.config.currency.code().to_string(),
            supported_networks: self.config.supported_networks.clone(),
            merchant_capabilities: self.config.merchant_capabilities.clone(),
            required_billing_contact_fields: self.config.required_contact_fields.clone(),
            required_shipping_contact_fields: self.config.required_contact_fields.clone(),
            line_items: native_line_items(&snapshot),
            total: native_total(&snapshot),
            shipping_contact: cart.shipping_address.as_ref().map(address_to_contact),
        }
    }

    /// Build the six-handler bundle. Handlers hold a weak reference so a
    /// handle kept alive by the surface cannot keep the engine alive.
    fn handlers(core: &Arc<NativeCore>) -> NativeSessionHandlers {
        let validate = Arc::downgrade(core);
        let method = Arc::downgrade(core);
        let contact = Arc::downgrade(core);
        let shipping = Arc::downgrade(core);
        let authorized = Arc::downgrade(core);
        let cancel = Arc::downgrade(core);

        NativeSessionHandlers {
            on_validate_merchant: Arc::new(move |event| {
                let core = validate.clone();
                Box::pin(async move {
                    if let Some(core) = core.upgrade() {
                        core.on_validate_merchant(event).await;
                    }
                })
            }),
            on_payment_method_selected: Arc::new(move |event| {
                let core = method.clone();
                Box::pin(async move {
                    if let Some(core) = core.upgrade() {
                        core.on_payment_method_selected(event).await;
                    }
                })
            }),
            on_shipping_contact_selected: Arc::new(move |event| {
                let core = contact.clone();
                Box::pin(async move {
                    if let Some(core) = core.upgrade() {
                        core.on_shipping_contact_selected(event).await;
                    }
                })
            }),
            on_shipping_method_selected: Arc::new(move |event| {
                let core = shipping.clone();
                Box::pin(async move {
                    if let Some(core) = core.upgrade() {
                        core.on_shipping_method_selected(event).await;
                    }
                })
            }),
            on_payment_authorized: Arc::new(move |event| {
                let core = authorized.clone();
                Box::pin(async move {
                    if let Some(core) = core.upgrade() {
                        core.on_payment_authorized(event).await;
                    }
                })
            }),
            on_cancel: Arc::new(move |_| {
                if let Some(core) = cancel.upgrade() {
                    core.on_cancel();
                }
            }),
        }
    }

    #[instrument(skip(self, event), fields(url = %event.validation_url))]
    async fn on_validate_merchant(&self, event: ValidateMerchantEvent) {
        let Some((_, handle, _)) = self.session_context() else {
            warn!("Merchant validation event without an active session");
            return;
        };

        match self.backend.validate_merchant(&event.validation_url).await {
            Ok(merchant_session) => {
                debug!("Completing merchant validation");
                handle.complete_merchant_validation(merchant_session);
            }
            Err(err) => {
                // A sheet whose validation failed cannot proceed; kill the
                // session and surface the error
                error!(error = %err, "Merchant validation failed; ending session");
                self.end(SessionPhase::Aborted);
                self.report_error(err);
            }
        }
    }

    #[instrument(skip(self, event), fields(network = %event.payment_method.network))]
    async fn on_payment_method_selected(&self, event: PaymentMethodSelectedEvent) {
        let Some((version, handle, snapshot)) = self.session_context() else {
            return;
        };

        debug!("Payment method selected; completing with current pricing");
        handle.complete_payment_method_selection(PaymentMethodCompletion::from_snapshot(
            version, &snapshot,
        ));
    }

    #[instrument(skip(self, event))]
    async fn on_shipping_contact_selected(&self, event: ShippingContactSelectedEvent) {
        let Some((version, handle, stale)) = self.session_context() else {
            return;
        };
        self.set_phase(SessionPhase::Negotiating);

        let address = contact_to_address(&event.shipping_contact);
        let completion = match self.recalculate_for_address(&address).await {
            Ok(fresh) => ShippingContactCompletion::success(version, &fresh),
            Err(err) => {
                warn!(
                    error = %err,
                    session_id = ?self.session_id(),
                    "Address recalculation failed; completing with last known pricing"
                );
                ShippingContactCompletion::failure(version, &stale, SheetError::unknown(err.to_string()))
            }
        };

        handle.complete_shipping_contact_selection(completion);
        self.set_phase(SessionPhase::Started);
    }

    #[instrument(skip(self, event), fields(shipping_method_id = %event.shipping_method.identifier))]
    async fn on_shipping_method_selected(&self, event: ShippingMethodSelectedEvent) {
        let Some((version, handle, stale)) = self.session_context() else {
            return;
        };
        self.set_phase(SessionPhase::Negotiating);

        let completion = match self
            .recalculate_for_method(&event.shipping_method.identifier)
            .await
        {
            Ok(fresh) => ShippingMethodCompletion::success(version, &fresh),
            Err(err) => {
                warn!(
                    error = %err,
                    session_id = ?self.session_id(),
                    "Shipping method recalculation failed; completing with last known pricing"
                );
                ShippingMethodCompletion::failure(version, &stale)
            }
        };

        handle.complete_shipping_method_selection(completion);
        self.set_phase(SessionPhase::Started);
    }

    async fn recalculate_for_address(
        &self,
        address: &ShippingAddress,
    ) -> CheckoutResult<PricingSnapshot> {
        let cart_ref = self
            .cart_reference()
            .ok_or(CheckoutError::SessionNotCreated)?;
        let update = self
            .backend
            .recalculate_for_address(&cart_ref, address)
            .await?;
        self.store_reprice(update)
            .ok_or(CheckoutError::SessionNotCreated)
    }

    async fn recalculate_for_method(
        &self,
        shipping_method_id: &str,
    ) -> CheckoutResult<PricingSnapshot> {
        let cart_ref = self
            .cart_reference()
            .ok_or(CheckoutError::SessionNotCreated)?;
        let update = self
            .backend
            .recalculate_for_shipping_method(&cart_ref, shipping_method_id)
            .await?;
        self.store_reprice(update)
            .ok_or(CheckoutError::SessionNotCreated)
    }

    #[instrument(skip(self, event))]
    async fn on_payment_authorized(&self, event: PaymentAuthorizedEvent) {
        let Some((version, handle, _)) = self.session_context() else {
            return;
        };
        self.set_phase(SessionPhase::PaymentAuthorized);

        let payment = event.payment;

        // Contact checks precede any capture traffic. The sheet renders the
        // field-level error inline and lets the user correct and
        // re-authorize, so the session stays alive on these paths.
        let Some(shipping_contact) = payment.shipping_contact.clone() else {
            warn!("Authorized payment is missing a shipping contact");
            handle.complete_payment(PaymentCompletion::invalid_shipping(version));
            self.set_phase(SessionPhase::Started);
            return;
        };
        let Some(billing_contact) = payment.billing_contact.clone() else {
            warn!("Authorized payment is missing a billing contact");
            handle.complete_payment(PaymentCompletion::invalid_billing(version));
            self.set_phase(SessionPhase::Started);
            return;
        };

        let submission = match build_submission(&payment, &shipping_contact, &billing_contact) {
            Ok(submission) => submission,
            Err(err) => {
                error!(error = %err, "Could not assemble payment submission; ending session");
                handle.complete_payment(PaymentCompletion::failure(
                    version,
                    vec![SheetError::unknown(err.to_string())],
                ));
                self.end(SessionPhase::Aborted);
                self.report_error(err);
                return;
            }
        };

        match self.backend.capture_payment(&submission).await {
            Ok(_) => {
                info!("Payment captured; session complete");
                handle.complete_payment(PaymentCompletion::success(version));
                self.end(SessionPhase::Completed);
            }
            Err(err) => {
                // Fatal to the session: complete the sheet so it never
                // hangs, then tear down and report. The user must restart
                // the flow.
                error!(error = %err, "Payment capture failed; ending session");
                handle.complete_payment(PaymentCompletion::failure(
                    version,
                    vec![SheetError::unknown(err.to_string())],
                ));
                self.end(SessionPhase::Aborted);
                self.report_error(err);
            }
        }
    }

    fn on_cancel(&self) {
        info!("Payment sheet cancelled by user");
        self.destroy_session();
        self.set_phase(SessionPhase::Cancelled);
    }
}

/// Assemble the capture submission: base64-encoded opaque token, card
/// network, and both contacts translated to domain addresses. Shared with
/// the request adapter, which enforces the same contact requirements.
pub(crate) fn build_submission(
    payment: &AuthorizedPayment,
    shipping_contact: &PaymentContact,
    billing_contact: &PaymentContact,
) -> CheckoutResult<PaymentSubmission> {
    let token_bytes = serde_json::to_vec(&payment.token.payment_data).map_err(|e| {
        CheckoutError::Serialization(format!("Failed to encode payment token: {}", e))
    })?;

    Ok(PaymentSubmission {
        apple_pay_token: BASE64.encode(token_bytes),
        credit_card_brand: payment.token.payment_method.network.clone(),
        billing_address: contact_to_address(billing_contact),
        shipping_address: contact_to_address(shipping_contact),
    })
}

#[async_trait]
impl SessionDriver for NativeSessionAdapter {
    fn kind(&self) -> SessionApiKind {
        SessionApiKind::NativeSession
    }

    fn is_available(&self) -> bool {
        self.core.api.is_available()
    }

    fn phase(&self) -> SessionPhase {
        self.core.current_phase()
    }

    #[instrument(skip(self, cart, shipping_methods), fields(cart_id = %cart.id))]
    async fn create_session(
        &self,
        cart: &Cart,
        shipping_methods: &[ShippingMethod],
    ) -> CheckoutResult<SessionCreation> {
        if self.core.active.lock().unwrap().is_some() {
            return Err(CheckoutError::SessionAlreadyActive);
        }

        self.core.set_phase(SessionPhase::AwaitingCapabilityCheck);

        let has_card = match self
            .core
            .api
            .can_make_payments_with_active_card(&self.core.config.merchant_id)
            .await
        {
            Ok(has_card) => has_card,
            Err(err) => {
                self.core.set_phase(SessionPhase::Idle);
                return Err(err);
            }
        };

        if !has_card {
            info!("Device reports no usable card for this merchant");
            self.core.set_phase(SessionPhase::Idle);
            return Ok(SessionCreation::NoUsableCard);
        }

        let version = self.core.latest_supported_version();
        let request = self.core.sheet_request(cart, shipping_methods);
        let handle = match self.core.api.open_session(version, &request) {
            Ok(handle) => handle,
            Err(err) => {
                self.core.set_phase(SessionPhase::Idle);
                return Err(err);
            }
        };

        handle.set_handlers(NativeCore::handlers(&self.core));

        let session = ActiveNativeSession {
            id: Uuid::new_v4(),
            version,
            handle,
            cart: cart.clone(),
            shipping_methods: shipping_methods.to_vec(),
            created_at: Utc::now(),
        };
        info!(session_id = %session.id, version, "Native session created");
        *self.core.active.lock().unwrap() = Some(session);
        self.core.set_phase(SessionPhase::SessionCreated);

        Ok(SessionCreation::Ready)
    }

    async fn start(&self) -> CheckoutResult<StartOutcome> {
        let handle = self
            .core
            .active
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| Arc::clone(&session.handle));

        match handle {
            Some(handle) => {
                handle.begin();
                self.core.set_phase(SessionPhase::Started);
                Ok(StartOutcome::Presented)
            }
            None => {
                debug!("Start requested with no native session; ignoring");
                Ok(StartOutcome::NotStarted)
            }
        }
    }

    fn end_session(&self) {
        if self.core.destroy_session() {
            self.core.set_phase(SessionPhase::Aborted);
        }
    }
}
