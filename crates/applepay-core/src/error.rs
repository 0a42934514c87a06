//! # Checkout Error Types
//!
//! Typed error handling for the checkout session engine.
//! All session operations return `Result<T, CheckoutError>`.
//!
//! Errors keep a DOM-style `name()` because the user-facing classification
//! table is keyed by error name: some names are deliberately silenced, two
//! map to fixed strings, and the rest surface their raw message.

use thiserror::Error;

/// Fixed message for devices without the native payment surface
pub const DEVICE_NOT_SUPPORTED_MESSAGE: &str = "Your device does not support Apple Pay";

/// Fixed message when the device refuses to pay over an insecure context
pub const CANNOT_PAY_SECURELY_MESSAGE: &str =
    "Your device has determined that it cannot make a payment securely";

/// Message shown when no payment path is viable at all
pub const NO_USABLE_PAYMENT_METHOD_MESSAGE: &str = "Your Apple Pay wallet does not contain any \
     supported payment methods. Please try another payment method, or add a new card to your \
     Apple Pay account.";

/// Core error type for all checkout session operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    /// Error surfaced by a browser payment surface, keyed by its DOM name
    /// (AbortError, SecurityError, ...)
    #[error("{message}")]
    Browser { name: String, message: String },

    /// Configuration errors (missing merchant id, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Merchant validation endpoint failed
    #[error("Merchant validation failed: {0}")]
    MerchantValidation(String),

    /// Cart recalculation endpoint failed
    #[error("Cart recalculation failed: {0}")]
    Recalculation(String),

    /// Payment capture endpoint rejected the submission
    #[error("Payment capture failed: {0}")]
    Capture(String),

    /// Network/HTTP error talking to a checkout endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// A session already occupies this adapter's slot. Carries the DOM's
    /// InvalidStateError name so repeated pay clicks stay silent.
    #[error("A session is already active for this adapter")]
    SessionAlreadyActive,

    /// Start was requested before a session was created
    #[error("No session created for the payment request API")]
    SessionNotCreated,

    /// The blocking sheet call resolved with no payment response
    #[error("A valid payment response was not received")]
    NoPaymentResponse,

    /// Authorized payment arrived without a shipping contact
    #[error("Authorized payment is missing a shipping contact")]
    MissingShippingContact,

    /// Authorized payment arrived without a billing contact
    #[error("Authorized payment is missing a billing contact")]
    MissingBillingContact,

    /// Neither payment path is viable on this device
    #[error("{}", NO_USABLE_PAYMENT_METHOD_MESSAGE)]
    NoUsablePaymentMethod,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CheckoutError {
    /// Construct a browser-surfaced error from its DOM name and message
    pub fn browser(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::Browser {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The DOM-style error name used by the classification table
    pub fn name(&self) -> &str {
        match self {
            CheckoutError::Browser { name, .. } => name,
            CheckoutError::Configuration(_) => "ConfigurationError",
            CheckoutError::MerchantValidation(_) => "MerchantValidationError",
            CheckoutError::Recalculation(_) => "RecalculationError",
            CheckoutError::Capture(_) => "PaymentCaptureError",
            CheckoutError::Network(_) => "NetworkError",
            CheckoutError::SessionAlreadyActive => "InvalidStateError",
            CheckoutError::SessionNotCreated => "SessionNotCreatedError",
            CheckoutError::NoPaymentResponse => "NoPaymentResponseError",
            CheckoutError::MissingShippingContact | CheckoutError::MissingBillingContact => {
                "MissingContactError"
            }
            CheckoutError::NoUsablePaymentMethod => "CannotMakePaymentsError",
            CheckoutError::Serialization(_) => "SerializationError",
        }
    }

    /// Classify into a user-facing message.
    ///
    /// `None` means the error is silenced entirely. AbortError, TypeError and
    /// InvalidStateError carry no actionable information; NotSupportedError
    /// and SecurityError map to fixed strings; everything else surfaces its
    /// raw message. This table is a behavioral contract.
    pub fn user_message(&self) -> Option<String> {
        match self.name() {
            "AbortError" | "TypeError" | "InvalidStateError" => None,
            "NotSupportedError" => Some(DEVICE_NOT_SUPPORTED_MESSAGE.to_string()),
            "SecurityError" => Some(CANNOT_PAY_SECURELY_MESSAGE.to_string()),
            _ => Some(self.to_string()),
        }
    }
}

/// Result type alias for checkout session operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
