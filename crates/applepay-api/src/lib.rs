//! # applepay-api
//!
//! Demo checkout HTTP layer for applepay-checkout-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The merchant validation and payment capture endpoints the session
//!   engine calls
//! - Cart recalculation endpoints backing mid-sheet repricing
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/cart` | Current cart snapshot |
//! | POST | `/api/apple/validate-merchant` | Merchant validation forwarding |
//! | POST | `/api/apple/process-payment` | Payment capture |
//! | POST | `/api/cart/shipping-address` | Reprice for a proposed address |
//! | POST | `/api/cart/shipping-method` | Reprice for a selected method |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, DemoCheckout};
