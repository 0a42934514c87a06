//! # Payment Request Adapter
//!
//! Variant B of the dual-path engine: the blocking payment request surface.
//! Where the native adapter answers each event with a distinct completion
//! call, this surface is driven by listeners that resolve an update value,
//! and one `show` call that blocks until the user finishes or dismisses
//! the sheet.
//!
//! A failed repricing resolves the pending update with an empty value so
//! the sheet keeps its last known pricing instead of hanging.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use applepay_core::{
    payment_address_to_address, project_cart, Cart, CartRef, CartUpdate, CheckoutBackend,
    CheckoutError, CheckoutResult, PricingSnapshot, SessionApiKind, SessionCreation,
    SessionDriver, SessionPhase, ShippingAddress, ShippingMethod, StartOutcome,
};

use crate::browser::{
    MerchantValidationOutcome, PaymentRequestApi, PaymentRequestHandle, PaymentResponseHandle,
    RequestListeners,
};
use crate::config::ApplePayConfig;
use crate::native::build_submission;
use crate::wire::{
    request_display_items, request_shipping_options, request_total, ApplePayMethodData,
    MerchantValidationEvent, PaymentDetailsInit, PaymentDetailsUpdate, PaymentMethodData,
    PaymentOptions, ResponseCompletion, APPLE_PAY_METHOD_URL, LATEST_SHEET_VERSION,
};

/// Session driver over the payment request surface
pub struct RequestSessionAdapter {
    core: Arc<RequestCore>,
}

struct RequestCore {
    api: Arc<dyn PaymentRequestApi>,
    backend: Arc<dyn CheckoutBackend>,
    config: ApplePayConfig,
    phase: Mutex<SessionPhase>,
    /// Arena-of-one: at most one live request per adapter
    active: Mutex<Option<ActiveRequest>>,
}

struct ActiveRequest {
    id: Uuid,
    handle: Arc<dyn PaymentRequestHandle>,
    /// Last priced cart; replaced after each successful recalculation
    cart: Cart,
    shipping_methods: Vec<ShippingMethod>,
    /// Wallet probe result, queried once at creation and never again
    can_make_payments: bool,
    created_at: DateTime<Utc>,
}

impl RequestSessionAdapter {
    /// Create a new payment request adapter
    pub fn new(
        api: Arc<dyn PaymentRequestApi>,
        backend: Arc<dyn CheckoutBackend>,
        config: ApplePayConfig,
    ) -> Self {
        Self {
            core: Arc::new(RequestCore {
                api,
                backend,
                config,
                phase: Mutex::new(SessionPhase::Idle),
                active: Mutex::new(None),
            }),
        }
    }

    /// Cached wallet probe for the active request. `None` when no request
    /// is live; the underlying surface is never re-queried.
    pub fn can_make_payments(&self) -> Option<bool> {
        self.core
            .active
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.can_make_payments)
    }
}

impl RequestCore {
    fn set_phase(&self, phase: SessionPhase) {
        let mut current = self.phase.lock().unwrap();
        debug!(from = %current, to = %phase, "Payment request phase change");
        *current = phase;
    }

    fn current_phase(&self) -> SessionPhase {
        *self.phase.lock().unwrap()
    }

    fn session_context(&self) -> Option<(Arc<dyn PaymentRequestHandle>, PricingSnapshot)> {
        let active = self.active.lock().unwrap();
        active.as_ref().map(|session| {
            (
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

    /// Detach listeners, abort and release the slot. Returns whether a
    /// request existed.
    fn destroy_request(&self) -> bool {
        let taken = self.active.lock().unwrap().take();
        match taken {
            Some(session) => {
                session.handle.set_listeners(RequestListeners::noop());
                session.handle.abort();
                debug!(
                    session_id = %session.id,
                    created_at = %session.created_at,
                    "Payment request destroyed"
                );
                true
            }
            None => false,
        }
    }

    fn end(&self, phase: SessionPhase) {
        self.destroy_request();
        self.set_phase(phase);
    }

    fn method_data(&self) -> Vec<PaymentMethodData> {
        vec![PaymentMethodData {
            supported_methods: APPLE_PAY_METHOD_URL.to_string(),
            data: ApplePayMethodData {
                version: LATEST_SHEET_VERSION,
                merchant_identifier: self.config.merchant_id.clone(),
                merchant_capabilities: self.config.merchant_capabilities.clone(),
                supported_networks: self.config.supported_networks.clone(),
                country_code: self.config.country_code.clone(),
                required_billing_contact_fields: self.config.required_contact_fields.clone(),
                required_shipping_contact_fields: self.config.required_contact_fields.clone(),
            },
        }]
    }

    fn details(&self, cart: &Cart, shipping_methods: &[ShippingMethod]) -> PaymentDetailsInit {
        let snapshot = project_cart(cart, shipping_methods);
        PaymentDetailsInit {
            total: request_total(&snapshot, self.config.currency),
            display_items: request_display_items(&snapshot, self.config.currency),
            shipping_options: request_shipping_options(&snapshot, self.config.currency),
        }
    }

    /// Build the listener bundle. Listeners hold a weak reference so a
    /// request kept alive by the surface cannot keep the engine alive.
    fn listeners(core: &Arc<RequestCore>) -> RequestListeners {
        let validation = Arc::downgrade(core);
        let address = Arc::downgrade(core);
        let option = Arc::downgrade(core);

        RequestListeners {
            on_merchant_validation: Arc::new(move |event| {
                let core = validation.clone();
                Box::pin(async move {
                    match core.upgrade() {
                        Some(core) => core.on_merchant_validation(event).await,
                        None => MerchantValidationOutcome::NotHandled,
                    }
                })
            }),
            // Method changes carry no pricing consequence here; acknowledge
            // so the sheet never waits
            on_payment_method_change: Arc::new(move |_event| {
                Box::pin(async { PaymentDetailsUpdate::empty() })
            }),
            on_shipping_address_change: Arc::new(move || {
                let core = address.clone();
                Box::pin(async move {
                    match core.upgrade() {
                        Some(core) => core.on_shipping_address_change().await,
                        None => PaymentDetailsUpdate::empty(),
                    }
                })
            }),
            on_shipping_option_change: Arc::new(move || {
                let core = option.clone();
                Box::pin(async move {
                    match core.upgrade() {
                        Some(core) => core.on_shipping_option_change().await,
                        None => PaymentDetailsUpdate::empty(),
                    }
                })
            }),
        }
    }

    #[instrument(skip(self, event), fields(url = %event.validation_url))]
    async fn on_merchant_validation(
        &self,
        event: MerchantValidationEvent,
    ) -> MerchantValidationOutcome {
        if event.method_name != APPLE_PAY_METHOD_URL {
            debug!(method = %event.method_name, "Validation event for a foreign method; not handling");
            return MerchantValidationOutcome::NotHandled;
        }

        MerchantValidationOutcome::Complete(
            self.backend.validate_merchant(&event.validation_url).await,
        )
    }

    #[instrument(skip(self))]
    async fn on_shipping_address_change(&self) -> PaymentDetailsUpdate {
        let Some((handle, _)) = self.session_context() else {
            return PaymentDetailsUpdate::empty();
        };
        self.set_phase(SessionPhase::Negotiating);

        let update = match handle.shipping_address() {
            Some(address) => {
                let address = payment_address_to_address(&address);
                match self.reprice_for_address(&address).await {
                    Ok(fresh) => PaymentDetailsUpdate::from_snapshot(&fresh, self.config.currency),
                    Err(err) => {
                        warn!(
                            error = %err,
                            session_id = ?self.session_id(),
                            "Address recalculation failed; resolving with empty update"
                        );
                        PaymentDetailsUpdate::empty()
                    }
                }
            }
            None => {
                warn!("Shipping address change without an address; resolving with empty update");
                PaymentDetailsUpdate::empty()
            }
        };

        self.set_phase(SessionPhase::Started);
        update
    }

    #[instrument(skip(self))]
    async fn on_shipping_option_change(&self) -> PaymentDetailsUpdate {
        let Some((handle, _)) = self.session_context() else {
            return PaymentDetailsUpdate::empty();
        };
        self.set_phase(SessionPhase::Negotiating);

        let update = match handle.shipping_option() {
            Some(option_id) => match self.reprice_for_method(&option_id).await {
                Ok(fresh) => PaymentDetailsUpdate::from_snapshot(&fresh, self.config.currency),
                Err(err) => {
                    warn!(
                        error = %err,
                        session_id = ?self.session_id(),
                        "Shipping option recalculation failed; resolving with empty update"
                    );
                    PaymentDetailsUpdate::empty()
                }
            },
            None => {
                warn!("Shipping option change without a selection; resolving with empty update");
                PaymentDetailsUpdate::empty()
            }
        };

        self.set_phase(SessionPhase::Started);
        update
    }

    async fn reprice_for_address(
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

    async fn reprice_for_method(&self, shipping_method_id: &str) -> CheckoutResult<PricingSnapshot> {
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

    /// Drive the response to resolution: contact checks, capture, and the
    /// response's own completion signal on every path
    async fn authorize(&self, response: Arc<dyn PaymentResponseHandle>) -> CheckoutResult<()> {
        let payment = response.payment();

        let Some(shipping_contact) = payment.shipping_contact.clone() else {
            warn!("Payment response is missing a shipping contact");
            self.fail_response(&response).await;
            return Err(CheckoutError::MissingShippingContact);
        };
        let Some(billing_contact) = payment.billing_contact.clone() else {
            warn!("Payment response is missing a billing contact");
            self.fail_response(&response).await;
            return Err(CheckoutError::MissingBillingContact);
        };

        let submission = build_submission(&payment, &shipping_contact, &billing_contact)?;

        match self.backend.capture_payment(&submission).await {
            Ok(_) => {
                info!("Payment captured; resolving response");
                response.complete(ResponseCompletion::Success).await?;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Payment capture failed; failing response");
                self.fail_response(&response).await;
                Err(err)
            }
        }
    }

    /// Resolve the response with a failure signal, never masking the error
    /// that brought us here
    async fn fail_response(&self, response: &Arc<dyn PaymentResponseHandle>) {
        if let Err(err) = response.complete(ResponseCompletion::Fail).await {
            warn!(error = %err, "Could not resolve payment response with failure signal");
        }
    }
}

#[async_trait]
impl SessionDriver for RequestSessionAdapter {
    fn kind(&self) -> SessionApiKind {
        SessionApiKind::PaymentRequest
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

        // Fresh request per attempt; a shown request cannot be reused
        let handle = self.core.api.create_request(
            self.core.method_data(),
            self.core.details(cart, shipping_methods),
            PaymentOptions::default(),
        )?;
        handle.set_listeners(RequestCore::listeners(&self.core));

        self.core.set_phase(SessionPhase::AwaitingCapabilityCheck);
        let can_make_payments = match handle.can_make_payment().await {
            Ok(result) => result,
            Err(err) => {
                handle.set_listeners(RequestListeners::noop());
                handle.abort();
                self.core.set_phase(SessionPhase::Idle);
                return Err(err);
            }
        };

        if !can_make_payments {
            info!("Device reports no payment capability for this request");
            handle.set_listeners(RequestListeners::noop());
            handle.abort();
            self.core.set_phase(SessionPhase::Idle);
            return Ok(SessionCreation::NoUsableCard);
        }

        let session = ActiveRequest {
            id: Uuid::new_v4(),
            handle,
            cart: cart.clone(),
            shipping_methods: shipping_methods.to_vec(),
            can_make_payments,
            created_at: Utc::now(),
        };
        info!(session_id = %session.id, "Payment request created");
        *self.core.active.lock().unwrap() = Some(session);
        self.core.set_phase(SessionPhase::SessionCreated);

        Ok(SessionCreation::Ready)
    }

    /// The single blocking call: presents the sheet and resolves only when
    /// the user finishes or dismisses it
    #[instrument(skip(self))]
    async fn start(&self) -> CheckoutResult<StartOutcome> {
        let handle = self
            .core
            .active
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| Arc::clone(&session.handle))
            .ok_or(CheckoutError::SessionNotCreated)?;

        self.core.set_phase(SessionPhase::Started);

        match handle.show().await {
            Ok(Some(response)) => {
                self.core.set_phase(SessionPhase::PaymentAuthorized);
                match self.core.authorize(response).await {
                    Ok(()) => {
                        self.core.end(SessionPhase::Completed);
                        Ok(StartOutcome::Authorized)
                    }
                    Err(err) => {
                        self.core.end(SessionPhase::Aborted);
                        Err(err)
                    }
                }
            }
            // A resolved sheet without a response is its own failure mode,
            // never a silent success
            Ok(None) => {
                warn!("Payment sheet resolved without a payment response");
                self.core.end(SessionPhase::Aborted);
                Err(CheckoutError::NoPaymentResponse)
            }
            Err(err) => {
                debug!(error = %err, "Payment sheet dismissed");
                self.core.end(SessionPhase::Cancelled);
                Err(err)
            }
        }
    }

    fn end_session(&self) {
        if self.core.destroy_request() {
            self.core.set_phase(SessionPhase::Aborted);
        }
    }
}
