//! # Apple Pay Configuration
//!
//! Merchant identity and sheet constants, loaded from environment variables.
//! Values are fixed at session-creation time and never re-read mid-session.

use std::env;

use applepay_core::{CheckoutError, Currency};

/// Apple Pay merchant configuration
#[derive(Debug, Clone)]
pub struct ApplePayConfig {
    /// Merchant identifier (merchant.com.example...)
    pub merchant_id: String,

    /// Domain registered for the merchant identifier
    pub merchant_domain: String,

    /// Display name shown on the payment sheet
    pub display_name: String,

    /// Base URL of the checkout endpoints (validation, capture, recalc)
    pub checkout_base_url: String,

    /// Two-letter country code for the sheet
    pub country_code: String,

    /// Sheet currency
    pub currency: Currency,

    /// Card networks accepted on the sheet
    pub supported_networks: Vec<String>,

    /// Merchant capabilities advertised to the sheet
    pub merchant_capabilities: Vec<String>,

    /// Contact fields required for both shipping and billing
    pub required_contact_fields: Vec<String>,

    /// Outbound request timeout in seconds; a slow checkout endpoint must
    /// fail fast rather than hang the sheet
    pub request_timeout_secs: u64,
}

fn default_networks() -> Vec<String> {
    ["amex", "masterCard", "visa", "discover"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_capabilities() -> Vec<String> {
    ["supportsEMV", "supports3DS", "supportsCredit", "supportsDebit"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_contact_fields() -> Vec<String> {
    ["postalAddress", "email", "name", "phone"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl ApplePayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `APPLE_MERCHANT_ID`
    /// - `APPLE_PAY_DOMAIN`
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let merchant_id = env::var("APPLE_MERCHANT_ID")
            .map_err(|_| CheckoutError::Configuration("APPLE_MERCHANT_ID not set".to_string()))?;

        let merchant_domain = env::var("APPLE_PAY_DOMAIN")
            .map_err(|_| CheckoutError::Configuration("APPLE_PAY_DOMAIN not set".to_string()))?;

        if !merchant_id.starts_with("merchant.") {
            return Err(CheckoutError::Configuration(
                "APPLE_MERCHANT_ID must start with merchant.".to_string(),
            ));
        }

        let display_name = env::var("APPLE_PAY_DISPLAY_NAME")
            .unwrap_or_else(|_| "EngineVector Store".to_string());

        let checkout_base_url = env::var("CHECKOUT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let country_code = env::var("APPLE_PAY_COUNTRY").unwrap_or_else(|_| "US".to_string());

        let currency = match env::var("APPLE_PAY_CURRENCY").as_deref() {
            Ok("EUR") => Currency::EUR,
            Ok("GBP") => Currency::GBP,
            Ok("CAD") => Currency::CAD,
            _ => Currency::USD,
        };

        Ok(Self {
            merchant_id,
            merchant_domain,
            display_name,
            checkout_base_url,
            country_code,
            currency,
            supported_networks: default_networks(),
            merchant_capabilities: default_capabilities(),
            required_contact_fields: default_contact_fields(),
            request_timeout_secs: 10,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(merchant_id: impl Into<String>, merchant_domain: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            merchant_domain: merchant_domain.into(),
            display_name: "EngineVector Store".to_string(),
            checkout_base_url: "http://localhost:3000".to_string(),
            country_code: "US".to_string(),
            currency: Currency::USD,
            supported_networks: default_networks(),
            merchant_capabilities: default_capabilities(),
            required_contact_fields: default_contact_fields(),
            request_timeout_secs: 10,
        }
    }

    /// True when a merchant identifier has been configured
    pub fn has_merchant_id(&self) -> bool {
        !self.merchant_id.is_empty()
    }

    /// Builder: set the payment sheet display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Builder: set custom checkout base URL (for testing)
    pub fn with_checkout_base_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_base_url = url.into();
        self
    }
}
