//! # Apple Pay Checkout RS
//!
//! Demo checkout service for the dual-path payment session engine.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export APPLE_MERCHANT_ID=merchant.com.example.store
//! export APPLE_PAY_DOMAIN=store.example.com
//!
//! # Run the server
//! applepay-checkout
//! ```

use applepay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Merchant: {}", state.merchant.merchant_id);
    info!("Domain: {}", state.merchant.merchant_domain);
    info!(
        "Cart: {} ({} shipping methods)",
        state.store.snapshot().cart.id,
        state.store.snapshot().shipping_methods.len()
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🚀 Apple Pay checkout starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🛒 Cart: GET http://{}/api/cart", addr);
        info!("🍎 Validation: POST http://{}/api/apple/validate-merchant", addr);
        info!("💳 Capture: POST http://{}/api/apple/process-payment", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   Apple Pay Checkout RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Dual-path session engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
