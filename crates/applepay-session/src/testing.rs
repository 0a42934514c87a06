//! Scripted doubles for the browser surfaces and the checkout backend,
//! shared by the adapter, detector and orchestrator tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use applepay_core::{
    Cart, CartLineItem, CartRef, CartUpdate, CheckoutBackend, CheckoutError, CheckoutResult,
    ErrorCallback, Money, PaymentAddress, PaymentContact, PaymentSubmission, ShippingAddress,
    ShippingMethod,
};

use crate::browser::{
    MerchantValidationOutcome, NativeSessionApi, NativeSessionHandle, NativeSessionHandlers,
    PaymentRequestApi, PaymentRequestHandle, PaymentResponseHandle, RequestListeners,
};
use crate::wire::{
    AuthorizedPayment, MerchantValidationEvent, PaymentAuthorizedEvent, PaymentCompletion,
    PaymentDetailsInit, PaymentDetailsUpdate, PaymentMethodChangeEvent, PaymentMethodCompletion,
    PaymentMethodData, PaymentMethodInfo, PaymentMethodSelectedEvent, PaymentOptions,
    PaymentSheetRequest, PaymentToken, ResponseCompletion, SessionCancelEvent,
    ShippingContactCompletion, ShippingContactSelectedEvent, ShippingMethodCompletion,
    ShippingMethodSelectedEvent, ValidateMerchantEvent,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Priced demo cart: 125.00 goods, 5.00 shipping, 10.00 tax, 140.00 gross
pub fn demo_cart() -> Cart {
    Cart::new("cart-1")
        .with_version(5)
        .with_line_item(CartLineItem::new("Widget", Money::from_cents(12500)))
        .with_total(Money::from_cents(12500))
        .with_shipping(ShippingMethod::new(
            "standard",
            "$5 standard",
            Money::from_cents(500),
        ))
        .with_tax(
            Money::from_cents(14000),
            Money::from_cents(13000),
            Money::from_cents(1000),
        )
}

pub fn demo_methods() -> Vec<ShippingMethod> {
    vec![
        ShippingMethod::new("standard", "$5 standard", Money::from_cents(500)).default_method(),
        ShippingMethod::new("express", "$15 express", Money::from_cents(1500)),
    ]
}

/// Recalculation result with the given taxed gross total (in cents)
pub fn repriced_update(total_gross_cents: i64) -> CartUpdate {
    let cart = Cart::new("cart-1")
        .with_version(6)
        .with_line_item(CartLineItem::new("Widget", Money::from_cents(12500)))
        .with_total(Money::from_cents(12500))
        .with_shipping(ShippingMethod::new(
            "standard",
            "$5 standard",
            Money::from_cents(500),
        ))
        .with_tax(
            Money::from_cents(total_gross_cents),
            Money::from_cents(total_gross_cents - 1000),
            Money::from_cents(1000),
        );
    CartUpdate {
        cart,
        shipping_methods: demo_methods(),
    }
}

fn demo_contact() -> PaymentContact {
    PaymentContact {
        address_lines: vec!["123 Main St".to_string()],
        locality: Some("Springfield".to_string()),
        country_code: Some("US".to_string()),
        postal_code: Some("62704".to_string()),
        administrative_area: Some("IL".to_string()),
        email_address: Some("payer@example.com".to_string()),
        phone_number: Some("+15551234567".to_string()),
        given_name: Some("Ada".to_string()),
        family_name: Some("Lovelace".to_string()),
    }
}

/// Authorization event; contacts included per flag
pub fn authorized_payment(shipping: bool, billing: bool) -> PaymentAuthorizedEvent {
    PaymentAuthorizedEvent {
        payment: AuthorizedPayment {
            token: PaymentToken {
                payment_data: serde_json::json!({"data": "opaque", "signature": "sig"}),
                payment_method: PaymentMethodInfo {
                    display_name: "Visa 1234".to_string(),
                    network: "visa".to_string(),
                    method_type: "credit".to_string(),
                },
                transaction_identifier: "txn-1".to_string(),
            },
            billing_contact: billing.then(demo_contact),
            shipping_contact: shipping.then(demo_contact),
        },
    }
}

/// Error callback that collects into a shared vector
pub fn error_sink() -> (ErrorCallback, Arc<Mutex<Vec<CheckoutError>>>) {
    let errors: Arc<Mutex<Vec<CheckoutError>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let callback: ErrorCallback = Arc::new(move |err| sink.lock().unwrap().push(err));
    (callback, errors)
}

// ---------------------------------------------------------------------------
// Checkout backend stub
// ---------------------------------------------------------------------------

/// Scripted checkout backend recording every call
pub struct StubBackend {
    pub validate_result: Mutex<CheckoutResult<serde_json::Value>>,
    pub capture_result: Mutex<CheckoutResult<serde_json::Value>>,
    pub recalc_result: Mutex<CheckoutResult<CartUpdate>>,
    pub validate_calls: Mutex<Vec<String>>,
    pub capture_calls: Mutex<Vec<PaymentSubmission>>,
    pub address_calls: Mutex<Vec<(CartRef, ShippingAddress)>>,
    pub method_calls: Mutex<Vec<(CartRef, String)>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            validate_result: Mutex::new(Ok(serde_json::json!({
                "merchantSessionIdentifier": "ms-1",
                "nonce": "abc"
            }))),
            capture_result: Mutex::new(Ok(serde_json::json!({"orderId": "ord-1"}))),
            recalc_result: Mutex::new(Ok(CartUpdate {
                cart: demo_cart(),
                shipping_methods: demo_methods(),
            })),
            validate_calls: Mutex::new(Vec::new()),
            capture_calls: Mutex::new(Vec::new()),
            address_calls: Mutex::new(Vec::new()),
            method_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_recalc_update(self, update: CartUpdate) -> Self {
        *self.recalc_result.lock().unwrap() = Ok(update);
        self
    }
}

#[async_trait]
impl CheckoutBackend for StubBackend {
    async fn validate_merchant(&self, validation_url: &str) -> CheckoutResult<serde_json::Value> {
        self.validate_calls
            .lock()
            .unwrap()
            .push(validation_url.to_string());
        self.validate_result.lock().unwrap().clone()
    }

    async fn capture_payment(
        &self,
        submission: &PaymentSubmission,
    ) -> CheckoutResult<serde_json::Value> {
        self.capture_calls.lock().unwrap().push(submission.clone());
        self.capture_result.lock().unwrap().clone()
    }

    async fn recalculate_for_address(
        &self,
        cart: &CartRef,
        address: &ShippingAddress,
    ) -> CheckoutResult<CartUpdate> {
        self.address_calls
            .lock()
            .unwrap()
            .push((cart.clone(), address.clone()));
        self.recalc_result.lock().unwrap().clone()
    }

    async fn recalculate_for_shipping_method(
        &self,
        cart: &CartRef,
        shipping_method_id: &str,
    ) -> CheckoutResult<CartUpdate> {
        self.method_calls
            .lock()
            .unwrap()
            .push((cart.clone(), shipping_method_id.to_string()));
        self.recalc_result.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Native session surface mocks
// ---------------------------------------------------------------------------

/// Scripted native session surface
pub struct MockNativeApi {
    pub available: bool,
    pub versions: Vec<u32>,
    pub can_pay: Mutex<CheckoutResult<bool>>,
    pub handle: Arc<MockNativeHandle>,
    pub open_calls: Mutex<Vec<(u32, PaymentSheetRequest)>>,
}

impl MockNativeApi {
    /// Available, all versions supported, wallet holds a usable card
    pub fn new() -> Self {
        Self::with_versions(&[1, 2, 3])
    }

    pub fn with_versions(versions: &[u32]) -> Self {
        Self {
            available: true,
            versions: versions.to_vec(),
            can_pay: Mutex::new(Ok(true)),
            handle: Arc::new(MockNativeHandle::new()),
            open_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        let mut api = Self::new();
        api.available = false;
        api
    }
}

#[async_trait]
impl NativeSessionApi for MockNativeApi {
    fn is_available(&self) -> bool {
        self.available
    }

    fn supports_version(&self, version: u32) -> bool {
        self.versions.contains(&version)
    }

    async fn can_make_payments_with_active_card(
        &self,
        _merchant_id: &str,
    ) -> CheckoutResult<bool> {
        self.can_pay.lock().unwrap().clone()
    }

    fn open_session(
        &self,
        version: u32,
        request: &PaymentSheetRequest,
    ) -> CheckoutResult<Arc<dyn NativeSessionHandle>> {
        self.open_calls
            .lock()
            .unwrap()
            .push((version, request.clone()));
        Ok(Arc::clone(&self.handle) as Arc<dyn NativeSessionHandle>)
    }
}

/// Native session handle recording completions and exposing fire helpers
/// that deliver events through the installed handler bundle
pub struct MockNativeHandle {
    pub handlers: Mutex<Option<NativeSessionHandlers>>,
    pub begin_calls: Mutex<u32>,
    pub abort_calls: Mutex<u32>,
    pub merchant_completions: Mutex<Vec<serde_json::Value>>,
    pub method_completions: Mutex<Vec<PaymentMethodCompletion>>,
    pub contact_completions: Mutex<Vec<ShippingContactCompletion>>,
    pub shipping_completions: Mutex<Vec<ShippingMethodCompletion>>,
    pub payment_completions: Mutex<Vec<PaymentCompletion>>,
}

impl MockNativeHandle {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(None),
            begin_calls: Mutex::new(0),
            abort_calls: Mutex::new(0),
            merchant_completions: Mutex::new(Vec::new()),
            method_completions: Mutex::new(Vec::new()),
            contact_completions: Mutex::new(Vec::new()),
            shipping_completions: Mutex::new(Vec::new()),
            payment_completions: Mutex::new(Vec::new()),
        }
    }

    pub async fn fire_validate_merchant(&self, event: ValidateMerchantEvent) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| Arc::clone(&h.on_validate_merchant));
        if let Some(handler) = handler {
            handler(event).await;
        }
    }

    pub async fn fire_payment_method_selected_default(&self) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| Arc::clone(&h.on_payment_method_selected));
        if let Some(handler) = handler {
            handler(PaymentMethodSelectedEvent {
                payment_method: PaymentMethodInfo {
                    display_name: "Visa 1234".to_string(),
                    network: "visa".to_string(),
                    method_type: "credit".to_string(),
                },
            })
            .await;
        }
    }

    pub async fn fire_shipping_contact_selected(&self, event: ShippingContactSelectedEvent) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| Arc::clone(&h.on_shipping_contact_selected));
        if let Some(handler) = handler {
            handler(event).await;
        }
    }

    pub async fn fire_shipping_method_selected(&self, identifier: &str) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| Arc::clone(&h.on_shipping_method_selected));
        if let Some(handler) = handler {
            handler(ShippingMethodSelectedEvent {
                shipping_method: crate::wire::NativeShippingMethod {
                    label: "$15 express".to_string(),
                    detail: String::new(),
                    amount: "15.00".to_string(),
                    identifier: identifier.to_string(),
                },
            })
            .await;
        }
    }

    pub async fn fire_payment_authorized(&self, event: PaymentAuthorizedEvent) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| Arc::clone(&h.on_payment_authorized));
        if let Some(handler) = handler {
            handler(event).await;
        }
    }

    pub fn fire_cancel(&self) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| Arc::clone(&h.on_cancel));
        if let Some(handler) = handler {
            handler(SessionCancelEvent);
        }
    }
}

impl NativeSessionHandle for MockNativeHandle {
    fn set_handlers(&self, handlers: NativeSessionHandlers) {
        *self.handlers.lock().unwrap() = Some(handlers);
    }

    fn begin(&self) {
        *self.begin_calls.lock().unwrap() += 1;
    }

    fn abort(&self) {
        *self.abort_calls.lock().unwrap() += 1;
    }

    fn complete_merchant_validation(&self, merchant_session: serde_json::Value) {
        self.merchant_completions
            .lock()
            .unwrap()
            .push(merchant_session);
    }

    fn complete_payment_method_selection(&self, completion: PaymentMethodCompletion) {
        self.method_completions.lock().unwrap().push(completion);
    }

    fn complete_shipping_contact_selection(&self, completion: ShippingContactCompletion) {
        self.contact_completions.lock().unwrap().push(completion);
    }

    fn complete_shipping_method_selection(&self, completion: ShippingMethodCompletion) {
        self.shipping_completions.lock().unwrap().push(completion);
    }

    fn complete_payment(&self, completion: PaymentCompletion) {
        self.payment_completions.lock().unwrap().push(completion);
    }
}

// ---------------------------------------------------------------------------
// Payment request surface mocks
// ---------------------------------------------------------------------------

/// How a scripted `show` resolves
pub enum ShowScript {
    Respond(Arc<MockPaymentResponse>),
    NoResponse,
    Fail(CheckoutError),
}

/// Scripted payment request surface
pub struct MockRequestApi {
    pub available: bool,
    pub handle: Arc<MockRequestHandle>,
    pub create_calls: Mutex<Vec<(Vec<PaymentMethodData>, PaymentDetailsInit, PaymentOptions)>>,
}

impl MockRequestApi {
    pub fn new() -> Self {
        Self {
            available: true,
            handle: Arc::new(MockRequestHandle::new()),
            create_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        let mut api = Self::new();
        api.available = false;
        api
    }
}

impl PaymentRequestApi for MockRequestApi {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create_request(
        &self,
        method_data: Vec<PaymentMethodData>,
        details: PaymentDetailsInit,
        options: PaymentOptions,
    ) -> CheckoutResult<Arc<dyn PaymentRequestHandle>> {
        self.create_calls
            .lock()
            .unwrap()
            .push((method_data, details, options));
        Ok(Arc::clone(&self.handle) as Arc<dyn PaymentRequestHandle>)
    }
}

/// Payment request handle with scripted probe/show results and fire helpers
/// returning what the installed listener produced
pub struct MockRequestHandle {
    pub listeners: Mutex<Option<RequestListeners>>,
    pub can_make_payment_result: Mutex<CheckoutResult<bool>>,
    pub can_make_payment_calls: Mutex<u32>,
    pub show_script: Mutex<ShowScript>,
    pub shipping_address: Mutex<Option<PaymentAddress>>,
    pub shipping_option: Mutex<Option<String>>,
    pub abort_calls: Mutex<u32>,
}

impl MockRequestHandle {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(None),
            can_make_payment_result: Mutex::new(Ok(true)),
            can_make_payment_calls: Mutex::new(0),
            show_script: Mutex::new(ShowScript::NoResponse),
            shipping_address: Mutex::new(None),
            shipping_option: Mutex::new(None),
            abort_calls: Mutex::new(0),
        }
    }

    pub async fn fire_merchant_validation(
        &self,
        event: MerchantValidationEvent,
    ) -> Option<MerchantValidationOutcome> {
        let listener = self
            .listeners
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| Arc::clone(&l.on_merchant_validation));
        match listener {
            Some(listener) => Some(listener(event).await),
            None => None,
        }
    }

    pub async fn fire_payment_method_change(
        &self,
        event: PaymentMethodChangeEvent,
    ) -> Option<PaymentDetailsUpdate> {
        let listener = self
            .listeners
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| Arc::clone(&l.on_payment_method_change));
        match listener {
            Some(listener) => Some(listener(event).await),
            None => None,
        }
    }

    pub async fn fire_shipping_address_change(&self) -> Option<PaymentDetailsUpdate> {
        let listener = self
            .listeners
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| Arc::clone(&l.on_shipping_address_change));
        match listener {
            Some(listener) => Some(listener().await),
            None => None,
        }
    }

    pub async fn fire_shipping_option_change(&self) -> Option<PaymentDetailsUpdate> {
        let listener = self
            .listeners
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| Arc::clone(&l.on_shipping_option_change));
        match listener {
            Some(listener) => Some(listener().await),
            None => None,
        }
    }
}

#[async_trait]
impl PaymentRequestHandle for MockRequestHandle {
    fn set_listeners(&self, listeners: RequestListeners) {
        *self.listeners.lock().unwrap() = Some(listeners);
    }

    async fn can_make_payment(&self) -> CheckoutResult<bool> {
        *self.can_make_payment_calls.lock().unwrap() += 1;
        self.can_make_payment_result.lock().unwrap().clone()
    }

    async fn show(&self) -> CheckoutResult<Option<Arc<dyn PaymentResponseHandle>>> {
        let script = std::mem::replace(
            &mut *self.show_script.lock().unwrap(),
            ShowScript::NoResponse,
        );
        match script {
            ShowScript::Respond(response) => {
                Ok(Some(Arc::clone(&response) as Arc<dyn PaymentResponseHandle>))
            }
            ShowScript::NoResponse => Ok(None),
            ShowScript::Fail(err) => Err(err),
        }
    }

    fn shipping_address(&self) -> Option<PaymentAddress> {
        self.shipping_address.lock().unwrap().clone()
    }

    fn shipping_option(&self) -> Option<String> {
        self.shipping_option.lock().unwrap().clone()
    }

    fn abort(&self) {
        *self.abort_calls.lock().unwrap() += 1;
    }
}

/// Scripted payment response
pub struct MockPaymentResponse {
    pub payment: AuthorizedPayment,
    pub complete_result: Mutex<CheckoutResult<()>>,
    pub completions: Mutex<Vec<ResponseCompletion>>,
}

impl MockPaymentResponse {
    pub fn new(payment: AuthorizedPayment) -> Self {
        Self {
            payment,
            complete_result: Mutex::new(Ok(())),
            completions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentResponseHandle for MockPaymentResponse {
    fn payment(&self) -> AuthorizedPayment {
        self.payment.clone()
    }

    async fn complete(&self, completion: ResponseCompletion) -> CheckoutResult<()> {
        self.completions.lock().unwrap().push(completion);
        self.complete_result.lock().unwrap().clone()
    }
}
