//! # Money Types
//!
//! Minor-unit monetary amounts for cart and payment-sheet pricing.
//! Every amount shown on a payment sheet is rendered from cents through
//! [`Money::to_decimal_string`], so the two-decimal formatting rule has a
//! single source of truth.

use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CAD,
}

impl Currency {
    /// Returns the uppercase ISO 4217 currency code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Monetary amount in minor currency units (cents for USD).
///
/// Serializes as `{"centAmount": …}` to stay wire-compatible with the cart
/// service's price objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor currency units
    #[serde(rename = "centAmount")]
    pub cents: i64,
}

impl Money {
    /// Create from minor units (cents)
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Zero amount
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// True if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Render with exactly two decimal places, e.g. `14000` → `"140.00"`.
    ///
    /// Payment sheets expect two decimals regardless of currency.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::from_cents(self.cents + rhs.cents)
    }
}
