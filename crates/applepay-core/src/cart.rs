//! # Cart Types
//!
//! The cart/shipping domain model as delivered by the external cart service.
//! Pricing is never computed here; carts arrive fully priced and are only
//! projected into payment-sheet shapes. Field names stay camelCase on the
//! wire to match the cart service.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One priced line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Line identifier assigned by the cart service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name shown on the payment sheet
    pub name: String,

    /// Quantity
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Line total; absent while the cart service is still resolving pricing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Money>,
}

fn default_quantity() -> u32 {
    1
}

impl CartLineItem {
    /// Create a priced line
    pub fn new(name: impl Into<String>, total_price: Money) -> Self {
        Self {
            id: None,
            name: name.into(),
            quantity: 1,
            total_price: Some(total_price),
        }
    }
}

/// A shipping method offered by the cart service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    /// Stable identifier used when the shopper picks a method on the sheet
    pub id: String,

    /// Display name
    pub name: String,

    /// Shipping cost
    pub amount: Money,

    /// Whether the cart service pre-selects this method
    #[serde(default)]
    pub is_default: bool,
}

impl ShippingMethod {
    pub fn new(id: impl Into<String>, name: impl Into<String>, amount: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount,
            is_default: false,
        }
    }

    /// Builder: mark as the default selection
    pub fn default_method(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// The cart's current shipping selection with its priced cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub shipping_method: ShippingMethod,
    pub price: Money,
}

/// Gross/net totals once the cart service has determined tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxedPrice {
    pub total_gross: Money,
    pub total_net: Money,
}

/// A priced cart snapshot.
///
/// `version` belongs to the cart service's optimistic concurrency scheme; it
/// is carried through recalculation requests unchanged and never enforced
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(default)]
    pub line_items: Vec<CartLineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<crate::address::ShippingAddress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<crate::address::ShippingAddress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ShippingInfo>,

    /// Pre-tax cart total
    pub total_price: Money,

    /// Present once tax has been determined; authoritative over `total_price`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxed_price: Option<TaxedPrice>,

    /// Tax amount, kept by the cart service alongside `taxed_price`
    #[serde(default)]
    pub tax: Money,
}

impl Cart {
    /// Create an empty cart with a zero total
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            line_items: Vec::new(),
            shipping_address: None,
            billing_address: None,
            shipping_info: None,
            total_price: Money::zero(),
            taxed_price: None,
            tax: Money::zero(),
        }
    }

    /// Builder: set the cart service version
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Builder: append a line item
    pub fn with_line_item(mut self, item: CartLineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Builder: set the pre-tax total
    pub fn with_total(mut self, total: Money) -> Self {
        self.total_price = total;
        self
    }

    /// Builder: select a shipping method at its own price
    pub fn with_shipping(mut self, method: ShippingMethod) -> Self {
        let price = method.amount;
        self.shipping_info = Some(ShippingInfo {
            shipping_method: method,
            price,
        });
        self
    }

    /// Builder: set the taxed totals and tax amount
    pub fn with_tax(mut self, total_gross: Money, total_net: Money, tax: Money) -> Self {
        self.taxed_price = Some(TaxedPrice {
            total_gross,
            total_net,
        });
        self.tax = tax;
        self
    }

    /// The total a payment sheet should charge: the taxed gross total when
    /// tax has been determined, the pre-tax total otherwise.
    pub fn effective_total(&self) -> Money {
        self.taxed_price
            .as_ref()
            .map(|t| t.total_gross)
            .unwrap_or(self.total_price)
    }

    /// Identifier of the currently selected shipping method, if any
    pub fn selected_shipping_method_id(&self) -> Option<&str> {
        self.shipping_info
            .as_ref()
            .map(|info| info.shipping_method.id.as_str())
    }

    /// The id/version pair recalculation requests must carry
    pub fn reference(&self) -> CartRef {
        CartRef {
            id: self.id.clone(),
            version: self.version,
        }
    }
}

/// Cart identity for recalculation requests: id plus the last seen version,
/// passed through to the cart service unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}
