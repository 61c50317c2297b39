//! Canteen server
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL and Redis, then
//! DATABASE_URL=postgres://... REDIS_URL=redis://... cargo run --bin canteen-server
//! ```

use canteen_server::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,canteen=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        address = %config.server.bind_addr(),
        public_base_url = %config.server.public_base_url,
        hosted_checkout = config.checkout.secret_key.is_some(),
        admin_routes = config.admin_token.is_some(),
        trust_proxy_headers = config.server.trust_proxy_headers,
        "Configuration loaded"
    );

    canteen_server::install_metrics(config.server.metrics_addr)?;

    let state = canteen_server::build_state(&config).await?;
    tracing::info!("✓ Services initialized");

    canteen_server::serve(&config, state).await
}
