//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the merchant configuration, the demo checkout store, and the
//! HTTP client used to forward merchant validation upstream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use applepay_core::{
    Cart, CartLineItem, CartUpdate, Money, ShippingAddress, ShippingMethod,
};
use applepay_session::ApplePayConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Apple Pay merchant configuration
    pub merchant: ApplePayConfig,
    /// Demo cart store backing the recalculation endpoints
    pub store: Arc<DemoCheckout>,
    /// Client for the upstream merchant validation call
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Create a new AppState from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let merchant = ApplePayConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load Apple Pay configuration: {}", e))?;

        let store = Arc::new(load_checkout_store()?);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            config,
            merchant,
            store,
            http_client,
        })
    }
}

// =============================================================================
// Demo Checkout Store
// =============================================================================

/// Errors raised by the demo store, mapped onto HTTP status codes by the
/// handlers
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cart not found: {0}")]
    UnknownCart(String),

    #[error("Cart version conflict: store has {expected}, request carried {got}")]
    VersionConflict { expected: i64, got: i64 },

    #[error("Unknown shipping method: {0}")]
    UnknownShippingMethod(String),
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::UnknownCart(_) => 404,
            StoreError::VersionConflict { .. } => 409,
            StoreError::UnknownShippingMethod(_) => 400,
        }
    }
}

/// In-memory cart standing in for the remote cart service. One cart,
/// repriced on every recalculation request, versioned so stale writers get
/// a conflict instead of silently clobbering a newer cart.
pub struct DemoCheckout {
    state: Mutex<StoreState>,
    tax_rate_basis_points: i64,
    tax_exempt_states: Vec<String>,
}

struct StoreState {
    cart: Cart,
    shipping_methods: Vec<ShippingMethod>,
}

impl DemoCheckout {
    /// Build a store from seed data
    pub fn from_seed(seed: CheckoutSeed) -> Self {
        let shipping_methods: Vec<ShippingMethod> = seed
            .shipping_methods
            .iter()
            .map(|method| {
                let built = ShippingMethod::new(
                    method.id.clone(),
                    method.name.clone(),
                    Money::from_cents(method.price_cents),
                );
                if method.default {
                    built.default_method()
                } else {
                    built
                }
            })
            .collect();

        let mut subtotal = Money::zero();
        let mut cart = Cart::new(seed.store.cart_id.clone()).with_version(0);
        for item in &seed.items {
            let line_total = Money::from_cents(item.unit_price_cents * i64::from(item.quantity));
            subtotal = subtotal + line_total;
            let mut line = CartLineItem::new(item.name.clone(), line_total);
            line.quantity = item.quantity;
            cart = cart.with_line_item(line);
        }
        cart = cart.with_total(subtotal);

        if let Some(default) = shipping_methods
            .iter()
            .find(|m| m.is_default)
            .or_else(|| shipping_methods.first())
        {
            cart = cart.with_shipping(default.clone());
        }

        let store = Self {
            state: Mutex::new(StoreState {
                cart,
                shipping_methods,
            }),
            tax_rate_basis_points: seed.store.tax_rate_basis_points,
            tax_exempt_states: seed.store.tax_exempt_states,
        };
        store.with_state(|state| store.reprice(state));
        store
    }

    /// Built-in seed used when no config file is found
    pub fn seeded() -> Self {
        Self::from_seed(CheckoutSeed::default())
    }

    /// Current cart and shipping methods
    pub fn snapshot(&self) -> CartUpdate {
        let state = self.state.lock().unwrap();
        CartUpdate {
            cart: state.cart.clone(),
            shipping_methods: state.shipping_methods.clone(),
        }
    }

    /// Store the proposed address, reprice and bump the cart version
    pub fn recalculate_for_address(
        &self,
        cart_id: &str,
        cart_version: Option<i64>,
        address: ShippingAddress,
    ) -> Result<CartUpdate, StoreError> {
        self.with_state(|state| {
            Self::check_reference(&state.cart, cart_id, cart_version)?;
            state.cart.shipping_address = Some(address);
            self.reprice(state);
            Ok(Self::snapshot_of(state))
        })
    }

    /// Select a shipping method by id, reprice and bump the cart version
    pub fn recalculate_for_shipping_method(
        &self,
        cart_id: &str,
        cart_version: Option<i64>,
        shipping_method_id: &str,
    ) -> Result<CartUpdate, StoreError> {
        self.with_state(|state| {
            Self::check_reference(&state.cart, cart_id, cart_version)?;
            let method = state
                .shipping_methods
                .iter()
                .find(|m| m.id == shipping_method_id)
                .cloned()
                .ok_or_else(|| StoreError::UnknownShippingMethod(shipping_method_id.to_string()))?;
            state.cart = state.cart.clone().with_shipping(method);
            self.reprice(state);
            Ok(Self::snapshot_of(state))
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn check_reference(
        cart: &Cart,
        cart_id: &str,
        cart_version: Option<i64>,
    ) -> Result<(), StoreError> {
        if cart.id != cart_id {
            return Err(StoreError::UnknownCart(cart_id.to_string()));
        }
        if let (Some(expected), Some(got)) = (cart.version, cart_version) {
            if expected != got {
                return Err(StoreError::VersionConflict { expected, got });
            }
        }
        Ok(())
    }

    /// Recompute tax and totals from line items, shipping selection and the
    /// destination state, then bump the version
    fn reprice(&self, state: &mut StoreState) {
        let subtotal = state
            .cart
            .line_items
            .iter()
            .filter_map(|line| line.total_price)
            .fold(Money::zero(), |acc, price| acc + price);
        let shipping = state
            .cart
            .shipping_info
            .as_ref()
            .map(|info| info.price)
            .unwrap_or_else(Money::zero);
        let net = subtotal + shipping;

        let exempt = state
            .cart
            .shipping_address
            .as_ref()
            .map(|address| {
                self.tax_exempt_states
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&address.state))
            })
            .unwrap_or(false);
        let tax = if exempt {
            Money::zero()
        } else {
            Money::from_cents(net.cents * self.tax_rate_basis_points / 10_000)
        };

        state.cart.total_price = subtotal;
        state.cart = state.cart.clone().with_tax(net + tax, net, tax);
        state.cart.version = Some(state.cart.version.unwrap_or(0) + 1);
    }

    fn snapshot_of(state: &StoreState) -> CartUpdate {
        CartUpdate {
            cart: state.cart.clone(),
            shipping_methods: state.shipping_methods.clone(),
        }
    }
}

// =============================================================================
// Seed File
// =============================================================================

/// Shape of `config/checkout.toml`
#[derive(Debug, Deserialize)]
pub struct CheckoutSeed {
    pub store: SeedStore,
    #[serde(default)]
    pub items: Vec<SeedItem>,
    #[serde(default)]
    pub shipping_methods: Vec<SeedShippingMethod>,
}

#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub cart_id: String,
    #[serde(default = "default_tax_rate")]
    pub tax_rate_basis_points: i64,
    #[serde(default = "default_tax_exempt_states")]
    pub tax_exempt_states: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedItem {
    pub name: String,
    #[serde(default = "default_item_quantity")]
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct SeedShippingMethod {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub default: bool,
}

fn default_tax_rate() -> i64 {
    800
}

fn default_tax_exempt_states() -> Vec<String> {
    ["DE", "MT", "NH", "OR"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_item_quantity() -> u32 {
    1
}

impl Default for CheckoutSeed {
    fn default() -> Self {
        Self {
            store: SeedStore {
                cart_id: "demo-cart".to_string(),
                tax_rate_basis_points: default_tax_rate(),
                tax_exempt_states: default_tax_exempt_states(),
            },
            items: vec![SeedItem {
                name: "EngineVector Dev Board".to_string(),
                quantity: 1,
                unit_price_cents: 12500,
            }],
            shipping_methods: vec![
                SeedShippingMethod {
                    id: "standard".to_string(),
                    name: "Standard Shipping".to_string(),
                    price_cents: 500,
                    default: true,
                },
                SeedShippingMethod {
                    id: "express".to_string(),
                    name: "Express Shipping".to_string(),
                    price_cents: 1500,
                    default: false,
                },
            ],
        }
    }
}

/// Load the demo store from config/checkout.toml
fn load_checkout_store() -> anyhow::Result<DemoCheckout> {
    let config_paths = [
        "config/checkout.toml",
        "../config/checkout.toml",
        "../../config/checkout.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let seed: CheckoutSeed = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!(
                "Loaded checkout seed from {} ({} items, {} shipping methods)",
                path,
                seed.items.len(),
                seed.shipping_methods.len()
            );
            return Ok(DemoCheckout::from_seed(seed));
        }
    }

    tracing::warn!("No checkout seed found, using the built-in demo cart");
    Ok(DemoCheckout::seeded())
}
