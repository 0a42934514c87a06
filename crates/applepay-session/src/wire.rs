//! # Wire Shapes
//!
//! Payload types exchanged with the two browser payment surfaces:
//!
//! - Native session sheet requests, events and completion payloads
//! - Payment request method data, details and update payloads
//!
//! Completion payloads are version-branched: sheet versions below
//! [`STRUCTURED_UPDATE_VERSION`] complete with positional status codes,
//! later versions complete with structured update objects.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use applepay_core::{Currency, PaymentContact, PricingSnapshot};

/// Method identifier for Apple Pay on the payment request surface
pub const APPLE_PAY_METHOD_URL: &str = "https://apple.com/apple-pay";

/// Highest sheet version this engine negotiates down from
pub const LATEST_SHEET_VERSION: u32 = 3;

/// Lowest sheet version the engine will run
pub const MINIMUM_SHEET_VERSION: u32 = 1;

/// First sheet version that completes with structured update objects
/// instead of positional status codes
pub const STRUCTURED_UPDATE_VERSION: u32 = 3;

/// True when the negotiated version completes with update objects
pub fn uses_structured_updates(version: u32) -> bool {
    version >= STRUCTURED_UPDATE_VERSION
}

// ---------------------------------------------------------------------------
// Native session sheet shapes
// ---------------------------------------------------------------------------

/// One display line on the native sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeLineItem {
    pub label: String,
    /// Two-decimal amount string, e.g. "140.00"
    pub amount: String,
    #[serde(rename = "type", default = "final_line_type")]
    pub line_type: String,
}

fn final_line_type() -> String {
    "final".to_string()
}

impl NativeLineItem {
    pub fn new(label: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            amount: amount.into(),
            line_type: final_line_type(),
        }
    }
}

/// One selectable shipping method on the native sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeShippingMethod {
    pub label: String,
    #[serde(default)]
    pub detail: String,
    pub amount: String,
    pub identifier: String,
}

/// The sheet request handed to the native session API at creation.
///
/// Shipping methods are not part of the initial request; they are pushed
/// through the shipping-contact completion once an address is known. A
/// stored cart address pre-fills `shipping_contact` so returning payers do
/// not retype it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSheetRequest {
    pub country_code: String,
    pub currency_code: String,
    pub supported_networks: Vec<String>,
    pub merchant_capabilities: Vec<String>,
    pub required_billing_contact_fields: Vec<String>,
    pub required_shipping_contact_fields: Vec<String>,
    pub line_items: Vec<NativeLineItem>,
    pub total: NativeLineItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_contact: Option<PaymentContact>,
}

/// Native sheet completion status. Serializes as the sheet's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatus {
    Success,
    Failure,
    InvalidBillingPostalAddress,
    InvalidShippingPostalAddress,
    InvalidShippingContact,
    PinRequired,
    PinIncorrect,
    PinLockout,
}

impl NativeStatus {
    /// Numeric status code as defined by the native sheet
    pub fn code(&self) -> i64 {
        match self {
            NativeStatus::Success => 0,
            NativeStatus::Failure => 1,
            NativeStatus::InvalidBillingPostalAddress => 2,
            NativeStatus::InvalidShippingPostalAddress => 3,
            NativeStatus::InvalidShippingContact => 4,
            NativeStatus::PinRequired => 5,
            NativeStatus::PinIncorrect => 6,
            NativeStatus::PinLockout => 7,
        }
    }
}

impl Serialize for NativeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

/// Structured sheet error for version 3 completions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetError {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SheetError {
    pub fn shipping_contact_invalid() -> Self {
        Self {
            code: "shippingContactInvalid".to_string(),
            contact_field: Some("postalAddress".to_string()),
            message: None,
        }
    }

    pub fn billing_contact_invalid() -> Self {
        Self {
            code: "billingContactInvalid".to_string(),
            contact_field: Some("postalAddress".to_string()),
            message: None,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            code: "unknown".to_string(),
            contact_field: None,
            message: Some(message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Native session completion payloads
// ---------------------------------------------------------------------------

/// Version 3 payload for payment-method-selected completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodUpdate {
    pub new_total: NativeLineItem,
    pub new_line_items: Vec<NativeLineItem>,
}

/// Completion for a payment-method-selected event
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentMethodCompletion {
    /// Versions 1-2: positional total and line items
    Legacy {
        new_total: NativeLineItem,
        new_line_items: Vec<NativeLineItem>,
    },
    /// Version 3: structured update object
    Update(PaymentMethodUpdate),
}

impl PaymentMethodCompletion {
    pub fn from_snapshot(version: u32, snapshot: &PricingSnapshot) -> Self {
        let new_total = native_total(snapshot);
        let new_line_items = native_line_items(snapshot);
        if uses_structured_updates(version) {
            PaymentMethodCompletion::Update(PaymentMethodUpdate {
                new_total,
                new_line_items,
            })
        } else {
            PaymentMethodCompletion::Legacy {
                new_total,
                new_line_items,
            }
        }
    }
}

/// Version 3 payload for shipping-contact-selected completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingContactUpdate {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SheetError>,
    pub new_shipping_methods: Vec<NativeShippingMethod>,
    pub new_total: NativeLineItem,
    pub new_line_items: Vec<NativeLineItem>,
}

/// Completion for a shipping-contact-selected event
#[derive(Debug, Clone, PartialEq)]
pub enum ShippingContactCompletion {
    /// Versions 1-2: positional status, methods, total and line items
    Legacy {
        status: NativeStatus,
        new_shipping_methods: Vec<NativeShippingMethod>,
        new_total: NativeLineItem,
        new_line_items: Vec<NativeLineItem>,
    },
    /// Version 3: structured update object, failure signalled via errors
    Update(ShippingContactUpdate),
}

impl ShippingContactCompletion {
    pub fn success(version: u32, snapshot: &PricingSnapshot) -> Self {
        Self::build(version, snapshot, None)
    }

    /// Failure completion carrying the unchanged projection so the sheet
    /// stays consistent with the last priced cart
    pub fn failure(version: u32, snapshot: &PricingSnapshot, error: SheetError) -> Self {
        Self::build(version, snapshot, Some(error))
    }

    fn build(version: u32, snapshot: &PricingSnapshot, error: Option<SheetError>) -> Self {
        let new_shipping_methods = native_shipping_methods(snapshot);
        let new_total = native_total(snapshot);
        let new_line_items = native_line_items(snapshot);
        if uses_structured_updates(version) {
            ShippingContactCompletion::Update(ShippingContactUpdate {
                errors: error.into_iter().collect(),
                new_shipping_methods,
                new_total,
                new_line_items,
            })
        } else {
            ShippingContactCompletion::Legacy {
                status: if error.is_some() {
                    NativeStatus::Failure
                } else {
                    NativeStatus::Success
                },
                new_shipping_methods,
                new_total,
                new_line_items,
            }
        }
    }
}

/// Version 3 payload for shipping-method-selected completion. The sheet
/// carries no error channel for this event; a failed recalculation simply
/// re-sends the stale projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodUpdate {
    pub new_total: NativeLineItem,
    pub new_line_items: Vec<NativeLineItem>,
}

/// Completion for a shipping-method-selected event
#[derive(Debug, Clone, PartialEq)]
pub enum ShippingMethodCompletion {
    /// Versions 1-2: positional status, total and line items
    Legacy {
        status: NativeStatus,
        new_total: NativeLineItem,
        new_line_items: Vec<NativeLineItem>,
    },
    /// Version 3: structured update object
    Update(ShippingMethodUpdate),
}

impl ShippingMethodCompletion {
    pub fn success(version: u32, snapshot: &PricingSnapshot) -> Self {
        Self::build(version, snapshot, NativeStatus::Success)
    }

    pub fn failure(version: u32, snapshot: &PricingSnapshot) -> Self {
        Self::build(version, snapshot, NativeStatus::Failure)
    }

    fn build(version: u32, snapshot: &PricingSnapshot, status: NativeStatus) -> Self {
        let new_total = native_total(snapshot);
        let new_line_items = native_line_items(snapshot);
        if uses_structured_updates(version) {
            ShippingMethodCompletion::Update(ShippingMethodUpdate {
                new_total,
                new_line_items,
            })
        } else {
            ShippingMethodCompletion::Legacy {
                status,
                new_total,
                new_line_items,
            }
        }
    }
}

/// Version 3 payload for the payment authorization completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAuthorizationResult {
    pub status: NativeStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SheetError>,
}

/// Completion for a payment-authorized event
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentCompletion {
    /// Versions 1-2: positional status code
    Legacy { status: NativeStatus },
    /// Version 3: structured result object
    Result(PaymentAuthorizationResult),
}

impl PaymentCompletion {
    pub fn success(version: u32) -> Self {
        if uses_structured_updates(version) {
            PaymentCompletion::Result(PaymentAuthorizationResult {
                status: NativeStatus::Success,
                errors: Vec::new(),
            })
        } else {
            PaymentCompletion::Legacy {
                status: NativeStatus::Success,
            }
        }
    }

    pub fn failure(version: u32, errors: Vec<SheetError>) -> Self {
        if uses_structured_updates(version) {
            PaymentCompletion::Result(PaymentAuthorizationResult {
                status: NativeStatus::Failure,
                errors,
            })
        } else {
            PaymentCompletion::Legacy {
                status: NativeStatus::Failure,
            }
        }
    }

    /// Authorization arrived without a shipping contact
    pub fn invalid_shipping(version: u32) -> Self {
        if uses_structured_updates(version) {
            PaymentCompletion::Result(PaymentAuthorizationResult {
                status: NativeStatus::Failure,
                errors: vec![SheetError::shipping_contact_invalid()],
            })
        } else {
            PaymentCompletion::Legacy {
                status: NativeStatus::InvalidShippingContact,
            }
        }
    }

    /// Authorization arrived without a billing contact
    pub fn invalid_billing(version: u32) -> Self {
        if uses_structured_updates(version) {
            PaymentCompletion::Result(PaymentAuthorizationResult {
                status: NativeStatus::Failure,
                errors: vec![SheetError::billing_contact_invalid()],
            })
        } else {
            PaymentCompletion::Legacy {
                status: NativeStatus::InvalidBillingPostalAddress,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Native session events
// ---------------------------------------------------------------------------

/// Merchant validation event carrying the acquirer's validation URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateMerchantEvent {
    #[serde(rename = "validationURL")]
    pub validation_url: String,
}

/// Card summary attached to selection and authorization events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodInfo {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub network: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodSelectedEvent {
    pub payment_method: PaymentMethodInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingContactSelectedEvent {
    pub shipping_contact: PaymentContact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodSelectedEvent {
    pub shipping_method: NativeShippingMethod,
}

/// Opaque payment token minted by the device at authorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentToken {
    /// Encrypted payment data blob, forwarded verbatim
    pub payment_data: serde_json::Value,
    #[serde(default)]
    pub payment_method: PaymentMethodInfo,
    #[serde(default)]
    pub transaction_identifier: String,
}

/// The authorized payment: token plus the contacts captured on the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedPayment {
    pub token: PaymentToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_contact: Option<PaymentContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_contact: Option<PaymentContact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAuthorizedEvent {
    pub payment: AuthorizedPayment,
}

/// Sheet dismissal event; carries no payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCancelEvent;

// ---------------------------------------------------------------------------
// Payment request surface shapes
// ---------------------------------------------------------------------------

/// Currency-qualified amount used by the request surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: String,
    /// Two-decimal amount string
    pub value: String,
}

impl CurrencyAmount {
    pub fn new(currency: Currency, value: impl Into<String>) -> Self {
        Self {
            currency: currency.code().to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    pub label: String,
    pub amount: CurrencyAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentShippingOption {
    pub id: String,
    pub label: String,
    pub amount: CurrencyAmount,
    #[serde(default)]
    pub selected: bool,
}

/// Apple Pay specific half of the request method data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplePayMethodData {
    pub version: u32,
    pub merchant_identifier: String,
    pub merchant_capabilities: Vec<String>,
    pub supported_networks: Vec<String>,
    pub country_code: String,
    pub required_billing_contact_fields: Vec<String>,
    pub required_shipping_contact_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodData {
    pub supported_methods: String,
    pub data: ApplePayMethodData,
}

/// Initial details for a payment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsInit {
    pub total: PaymentItem,
    pub display_items: Vec<PaymentItem>,
    pub shipping_options: Vec<PaymentShippingOption>,
}

/// Incremental details pushed back through a change listener. All fields
/// optional; an empty update acknowledges the event without repricing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<PaymentItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_items: Option<Vec<PaymentItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<Vec<PaymentShippingOption>>,
}

impl PaymentDetailsUpdate {
    /// Acknowledge-only update
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_none() && self.display_items.is_none() && self.shipping_options.is_none()
    }

    /// Full repricing update from a snapshot
    pub fn from_snapshot(snapshot: &PricingSnapshot, currency: Currency) -> Self {
        Self {
            total: Some(request_total(snapshot, currency)),
            display_items: Some(request_display_items(snapshot, currency)),
            shipping_options: Some(request_shipping_options(snapshot, currency)),
        }
    }
}

/// Request options: which payer fields to collect and whether shipping
/// selection happens on the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptions {
    pub request_payer_name: bool,
    pub request_payer_email: bool,
    pub request_payer_phone: bool,
    pub request_shipping: bool,
    pub shipping_type: String,
}

impl Default for PaymentOptions {
    fn default() -> Self {
        Self {
            request_payer_name: true,
            request_payer_email: true,
            request_payer_phone: true,
            request_shipping: true,
            shipping_type: "shipping".to_string(),
        }
    }
}

/// Merchant validation event on the request surface; scoped to a payment
/// method so foreign methods can be left unhandled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantValidationEvent {
    pub method_name: String,
    #[serde(rename = "validationURL")]
    pub validation_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodChangeEvent {
    pub method_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_details: Option<serde_json::Value>,
}

/// How a blocking sheet response is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCompletion {
    Success,
    Fail,
}

impl ResponseCompletion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCompletion::Success => "success",
            ResponseCompletion::Fail => "fail",
        }
    }
}

impl Serialize for ResponseCompletion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Snapshot conversions
// ---------------------------------------------------------------------------

/// Sheet total line from a pricing snapshot
pub fn native_total(snapshot: &PricingSnapshot) -> NativeLineItem {
    NativeLineItem::new(snapshot.total.label.clone(), snapshot.total.amount.clone())
}

/// Sheet display lines from a pricing snapshot
pub fn native_line_items(snapshot: &PricingSnapshot) -> Vec<NativeLineItem> {
    snapshot
        .line_items
        .iter()
        .map(|item| NativeLineItem::new(item.label.clone(), item.amount.clone()))
        .collect()
}

/// Sheet shipping methods from a pricing snapshot
pub fn native_shipping_methods(snapshot: &PricingSnapshot) -> Vec<NativeShippingMethod> {
    snapshot
        .shipping_options
        .iter()
        .map(|option| NativeShippingMethod {
            label: option.label.clone(),
            detail: String::new(),
            amount: option.amount.clone(),
            identifier: option.id.clone(),
        })
        .collect()
}

/// Request-surface total from a pricing snapshot
pub fn request_total(snapshot: &PricingSnapshot, currency: Currency) -> PaymentItem {
    PaymentItem {
        label: snapshot.total.label.clone(),
        amount: CurrencyAmount::new(currency, snapshot.total.amount.clone()),
    }
}

/// Request-surface display items from a pricing snapshot
pub fn request_display_items(snapshot: &PricingSnapshot, currency: Currency) -> Vec<PaymentItem> {
    snapshot
        .line_items
        .iter()
        .map(|item| PaymentItem {
            label: item.label.clone(),
            amount: CurrencyAmount::new(currency, item.amount.clone()),
        })
        .collect()
}

/// Request-surface shipping options from a pricing snapshot
pub fn request_shipping_options(
    snapshot: &PricingSnapshot,
    currency: Currency,
) -> Vec<PaymentShippingOption> {
    snapshot
        .shipping_options
        .iter()
        .map(|option| PaymentShippingOption {
            id: option.id.clone(),
            label: option.label.clone(),
            amount: CurrencyAmount::new(currency, option.amount.clone()),
            selected: option.selected,
        })
        .collect()
}

// Serialize the legacy completion variants positionally for logging and
// test assertions; the browser boundary itself receives the enum.
impl Serialize for PaymentCompletion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaymentCompletion::Legacy { status } => {
                let mut s = serializer.serialize_struct("PaymentCompletion", 1)?;
                s.serialize_field("status", status)?;
                s.end()
            }
            PaymentCompletion::Result(result) => result.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applepay_core::{SheetItem, SheetShippingOption};
    use serde_json::json;

    fn snapshot() -> PricingSnapshot {
        PricingSnapshot {
            total: SheetItem::new("Total", "140.00"),
            line_items: vec![
                SheetItem::new("Widget", "125.00"),
                SheetItem::new("Shipping", "5.00"),
                SheetItem::new("Taxes", "10.00"),
            ],
            shipping_options: vec![SheetShippingOption {
                id: "standard".to_string(),
                label: "$5 standard".to_string(),
                amount: "5.00".to_string(),
                selected: true,
            }],
        }
    }

    #[test]
    fn test_status_serializes_as_numeric_code() {
        assert_eq!(serde_json::to_value(NativeStatus::Success).unwrap(), json!(0));
        assert_eq!(serde_json::to_value(NativeStatus::Failure).unwrap(), json!(1));
        assert_eq!(
            serde_json::to_value(NativeStatus::InvalidShippingContact).unwrap(),
            json!(4)
        );
    }

    #[test]
    fn test_structured_updates_start_at_version_three() {
        assert!(!uses_structured_updates(1));
        assert!(!uses_structured_updates(2));
        assert!(uses_structured_updates(3));
    }

    #[test]
    fn test_line_item_wire_shape() {
        let item = NativeLineItem::new("Total", "140.00");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"label": "Total", "amount": "140.00", "type": "final"})
        );
    }

    #[test]
    fn test_payment_completion_branches_on_version() {
        match PaymentCompletion::invalid_shipping(2) {
            PaymentCompletion::Legacy { status } => {
                assert_eq!(status, NativeStatus::InvalidShippingContact)
            }
            other => panic!("expected legacy completion, got {other:?}"),
        }

        match PaymentCompletion::invalid_shipping(3) {
            PaymentCompletion::Result(result) => {
                assert_eq!(result.status, NativeStatus::Failure);
                assert_eq!(result.errors[0].code, "shippingContactInvalid");
            }
            other => panic!("expected structured result, got {other:?}"),
        }
    }

    #[test]
    fn test_billing_completion_uses_billing_code() {
        match PaymentCompletion::invalid_billing(2) {
            PaymentCompletion::Legacy { status } => {
                assert_eq!(status, NativeStatus::InvalidBillingPostalAddress)
            }
            other => panic!("expected legacy completion, got {other:?}"),
        }

        match PaymentCompletion::invalid_billing(3) {
            PaymentCompletion::Result(result) => {
                assert_eq!(result.errors[0].code, "billingContactInvalid");
            }
            other => panic!("expected structured result, got {other:?}"),
        }
    }

    #[test]
    fn test_contact_completion_failure_keeps_snapshot() {
        let completion =
            ShippingContactCompletion::failure(2, &snapshot(), SheetError::unknown("recalc"));
        match completion {
            ShippingContactCompletion::Legacy {
                status, new_total, ..
            } => {
                assert_eq!(status, NativeStatus::Failure);
                assert_eq!(new_total.amount, "140.00");
            }
            other => panic!("expected legacy completion, got {other:?}"),
        }

        let completion =
            ShippingContactCompletion::failure(3, &snapshot(), SheetError::unknown("recalc"));
        match completion {
            ShippingContactCompletion::Update(update) => {
                assert_eq!(update.errors.len(), 1);
                assert_eq!(update.new_total.amount, "140.00");
                assert_eq!(update.new_shipping_methods[0].identifier, "standard");
            }
            other => panic!("expected structured update, got {other:?}"),
        }
    }

    #[test]
    fn test_details_update_from_snapshot() {
        let update = PaymentDetailsUpdate::from_snapshot(&snapshot(), Currency::USD);
        assert!(!update.is_empty());
        let total = update.total.unwrap();
        assert_eq!(total.amount.currency, "USD");
        assert_eq!(total.amount.value, "140.00");
        assert_eq!(update.display_items.unwrap().len(), 3);
        assert!(update.shipping_options.unwrap()[0].selected);
    }

    #[test]
    fn test_empty_update_serializes_to_empty_object() {
        assert!(PaymentDetailsUpdate::empty().is_empty());
        assert_eq!(
            serde_json::to_value(PaymentDetailsUpdate::empty()).unwrap(),
            json!({})
        );
    }

    #[test]
    fn test_method_data_wire_shape() {
        let data = PaymentMethodData {
            supported_methods: APPLE_PAY_METHOD_URL.to_string(),
            data: ApplePayMethodData {
                version: LATEST_SHEET_VERSION,
                merchant_identifier: "merchant.com.enginevector.store".to_string(),
                merchant_capabilities: vec!["supports3DS".to_string()],
                supported_networks: vec!["visa".to_string()],
                country_code: "US".to_string(),
                required_billing_contact_fields: vec!["postalAddress".to_string()],
                required_shipping_contact_fields: vec!["postalAddress".to_string()],
            },
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["supportedMethods"], APPLE_PAY_METHOD_URL);
        assert_eq!(value["data"]["merchantIdentifier"], "merchant.com.enginevector.store");
        assert_eq!(value["data"]["version"], 3);
    }

    #[test]
    fn test_validation_event_url_casing() {
        let event: ValidateMerchantEvent =
            serde_json::from_value(json!({"validationURL": "https://apple.test/validate"}))
                .unwrap();
        assert_eq!(event.validation_url, "https://apple.test/validate");
    }
}
