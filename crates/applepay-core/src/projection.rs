//! # Cart Projection
//!
//! Pure functions that project a priced cart and its shipping methods into
//! the line-item/option shapes shown on a payment sheet. Stateless and
//! deterministic; callers are responsible for recency of the cart they pass.

use tracing::warn;

use crate::cart::{Cart, ShippingMethod};

/// Label on the sheet's total line
pub const TOTAL_LABEL: &str = "Total";
/// Label on the synthetic shipping line
pub const SHIPPING_LABEL: &str = "Shipping";
/// Label on the synthetic tax line
pub const TAXES_LABEL: &str = "Taxes";

/// One sheet line: label plus a two-decimal amount string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetItem {
    pub label: String,
    pub amount: String,
}

impl SheetItem {
    pub fn new(label: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            amount: amount.into(),
        }
    }
}

/// One selectable shipping option on the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetShippingOption {
    pub id: String,
    pub label: String,
    pub amount: String,
    pub selected: bool,
}

/// Everything both payment surfaces need after a (re)pricing: the total, the
/// display lines, and the selectable shipping options. Each adapter shapes
/// this into its own wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSnapshot {
    pub total: SheetItem,
    pub line_items: Vec<SheetItem>,
    pub shipping_options: Vec<SheetShippingOption>,
}

/// Total line for the sheet: the taxed gross total when tax has been
/// determined, the pre-tax total otherwise. Always labeled "Total".
pub fn cart_to_total(cart: &Cart) -> SheetItem {
    SheetItem::new(TOTAL_LABEL, cart.effective_total().to_decimal_string())
}

/// Display lines for the sheet: one entry per cart line with a resolved
/// total, then a "Shipping" entry only when shipping costs something, then a
/// "Taxes" entry only when a positive taxed total exists.
///
/// The tax gate reads the taxed gross total while the tax amount comes from
/// the cart's separate `tax` field; the cart service keeps the two
/// consistent.
pub fn cart_to_line_items(cart: &Cart) -> Vec<SheetItem> {
    let mut items: Vec<SheetItem> = cart
        .line_items
        .iter()
        .filter_map(|line| {
            line.total_price
                .map(|price| SheetItem::new(line.name.clone(), price.to_decimal_string()))
        })
        .collect();

    if let Some(info) = &cart.shipping_info {
        if info.price.is_positive() {
            items.push(SheetItem::new(
                SHIPPING_LABEL,
                info.price.to_decimal_string(),
            ));
        }
    }

    let taxed_gross_positive = cart
        .taxed_price
        .as_ref()
        .map(|t| t.total_gross.is_positive())
        .unwrap_or(false);
    if taxed_gross_positive {
        if !cart.tax.is_positive() {
            warn!(
                cart_id = %cart.id,
                "taxed total present but tax amount is zero; sheet will show a zero tax line"
            );
        }
        items.push(SheetItem::new(TAXES_LABEL, cart.tax.to_decimal_string()));
    }

    items
}

/// Shipping options for the sheet. The option matching `selected_id` is
/// marked selected; if none matches, none is marked (not an error).
pub fn shipping_methods_to_options(
    methods: &[ShippingMethod],
    selected_id: Option<&str>,
) -> Vec<SheetShippingOption> {
    methods
        .iter()
        .map(|method| SheetShippingOption {
            id: method.id.clone(),
            label: method.name.clone(),
            amount: method.amount.to_decimal_string(),
            selected: selected_id == Some(method.id.as_str()),
        })
        .collect()
}

/// Project a cart and its available shipping methods in one step, using the
/// cart's own shipping selection to mark the selected option.
pub fn project_cart(cart: &Cart, methods: &[ShippingMethod]) -> PricingSnapshot {
    PricingSnapshot {
        total: cart_to_total(cart),
        line_items: cart_to_line_items(cart),
        shipping_options: shipping_methods_to_options(methods, cart.selected_shipping_method_id()),
    }
}
