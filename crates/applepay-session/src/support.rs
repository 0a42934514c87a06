//! # Device Support Detection
//!
//! One-shot probe answering "can this device pay at all?":
//! - Checks both API surfaces for existence
//! - Queries wallet capability through a throwaway zero-value request
//! - Caches the answer for the lifetime of the engine
//!
//! The probe runs at most once. `state()` before the first `determine()`
//! reports `determined: false` so dependent UI can tell "not yet known"
//! apart from "known unsupported."

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::browser::{NativeSessionApi, PaymentRequestApi};
use crate::config::ApplePayConfig;
use crate::wire::{
    ApplePayMethodData, CurrencyAmount, PaymentDetailsInit, PaymentItem, PaymentMethodData,
    PaymentOptions, PaymentShippingOption, APPLE_PAY_METHOD_URL, LATEST_SHEET_VERSION,
};

/// Snapshot of what the device can do. `Copy` so callers never hold a
/// reference into the detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityState {
    /// The native session API surface exists
    pub supports_native_session: bool,
    /// The payment request API surface exists
    pub supports_payment_request: bool,
    /// The wallet probe confirmed an active payment capability
    pub can_make_payments: bool,
    /// The probe has run; `false` means the other fields are placeholders
    pub determined: bool,
}

impl CapabilityState {
    /// Whether any payment path is worth attempting. The native surface
    /// performs its own card check at session creation, so its existence
    /// alone qualifies; the request path additionally needs the wallet
    /// probe to have confirmed capability.
    pub fn is_supported(&self) -> bool {
        self.supports_native_session || (self.supports_payment_request && self.can_make_payments)
    }
}

/// Probes the two payment surfaces once and caches the result
pub struct SupportDetector {
    native: Arc<dyn NativeSessionApi>,
    request: Arc<dyn PaymentRequestApi>,
    config: ApplePayConfig,
    state: OnceCell<CapabilityState>,
}

impl SupportDetector {
    pub fn new(
        native: Arc<dyn NativeSessionApi>,
        request: Arc<dyn PaymentRequestApi>,
        config: ApplePayConfig,
    ) -> Self {
        Self {
            native,
            request,
            config,
            state: OnceCell::new(),
        }
    }

    /// Run the probe, or return the cached result if it already ran.
    /// Subsequent calls never touch the payment surfaces again.
    pub async fn determine(&self) -> CapabilityState {
        *self.state.get_or_init(|| self.probe()).await
    }

    /// Current state without triggering the probe
    pub fn state(&self) -> CapabilityState {
        self.state.get().copied().unwrap_or_default()
    }

    #[instrument(skip(self))]
    async fn probe(&self) -> CapabilityState {
        let supports_native_session = self.native.is_available();
        let supports_payment_request = self.request.is_available();

        // The wallet query needs a configured merchant and the request
        // surface; otherwise the answer is a firm no
        let can_make_payments = if supports_payment_request && self.config.has_merchant_id() {
            self.probe_wallet().await
        } else {
            false
        };

        let state = CapabilityState {
            supports_native_session,
            supports_payment_request,
            can_make_payments,
            determined: true,
        };
        debug!(
            native = state.supports_native_session,
            request = state.supports_payment_request,
            can_pay = state.can_make_payments,
            "Payment capability determined"
        );
        state
    }

    /// Ask the wallet through a zero-value request that is never shown.
    /// Any failure reads as "cannot pay"; the probe has no error channel.
    async fn probe_wallet(&self) -> bool {
        let request = match self.request.create_request(
            self.probe_method_data(),
            self.probe_details(),
            self.probe_options(),
        ) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Could not construct capability probe request");
                return false;
            }
        };

        match request.can_make_payment().await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Wallet capability query failed");
                false
            }
        }
    }

    fn probe_method_data(&self) -> Vec<PaymentMethodData> {
        vec![PaymentMethodData {
            supported_methods: APPLE_PAY_METHOD_URL.to_string(),
            data: ApplePayMethodData {
                version: LATEST_SHEET_VERSION,
                merchant_identifier: self.config.merchant_id.clone(),
                merchant_capabilities: self.config.merchant_capabilities.clone(),
                supported_networks: self.config.supported_networks.clone(),
                country_code: self.config.country_code.clone(),
                // Never shown, so no contact fields are demanded
                required_billing_contact_fields: Vec::new(),
                required_shipping_contact_fields: Vec::new(),
            },
        }]
    }

    fn probe_details(&self) -> PaymentDetailsInit {
        PaymentDetailsInit {
            total: PaymentItem {
                label: "Support Test".to_string(),
                amount: CurrencyAmount::new(self.config.currency, "0.00"),
            },
            display_items: Vec::new(),
            shipping_options: vec![PaymentShippingOption {
                id: "1".to_string(),
                label: "Test shipping".to_string(),
                amount: CurrencyAmount::new(self.config.currency, "0.00"),
                selected: true,
            }],
        }
    }

    fn probe_options(&self) -> PaymentOptions {
        PaymentOptions {
            request_payer_name: false,
            request_payer_email: false,
            request_payer_phone: false,
            request_shipping: false,
            shipping_type: "shipping".to_string(),
        }
    }
}
