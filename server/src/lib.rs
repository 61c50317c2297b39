//! Canteen server wiring.
//!
//! [`Config`] comes from the environment; [`build_state`] connects the
//! stores and assembles the services; [`serve`] runs the HTTP surface until
//! a shutdown signal arrives.

#![forbid(unsafe_code)]

pub mod config;

pub use config::{Config, ConfigError};

use anyhow::Context;
use canteen_auth::{AccessConfig, AccessServices};
use canteen_core::KeyValueStore;
use canteen_core::environment::{Clock, SystemClock};
use canteen_orders::{
    CheckoutConfig, CheckoutProvider, CheckoutReconciler, HostedCheckoutClient, OrderBuilder,
};
use canteen_postgres::{PostgresOrderStore, PostgresPassRepository};
use canteen_redis::RedisKeyValueStore;
use canteen_web::{AppState, CookieSettings};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Connect the stores and wire every service behind the HTTP surface.
///
/// # Errors
///
/// Returns an error if `PostgreSQL` or Redis is unreachable, migrations
/// fail, or the checkout client cannot be built.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = canteen_postgres::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    canteen_postgres::migrate(&pool)
        .await
        .context("Failed to apply database migrations")?;
    info!("✓ PostgreSQL ready");

    let kv: Arc<dyn KeyValueStore> = Arc::new(
        RedisKeyValueStore::new(&config.redis.url)
            .await
            .context("Failed to connect to Redis")?,
    );
    info!("✓ Redis ready");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let access_config = AccessConfig::default();

    let access = AccessServices::new(
        &access_config,
        Arc::new(PostgresPassRepository::new(pool.clone())),
        Arc::clone(&kv),
        Arc::clone(&clock),
    )?;

    let store = Arc::new(PostgresOrderStore::new(pool));
    let orders = OrderBuilder::new(store.clone(), store, Arc::clone(&clock));

    let provider = match &config.checkout.secret_key {
        Some(key) => {
            let client =
                HostedCheckoutClient::new(key.expose().to_string(), &config.checkout.api_base)?;
            info!(api_base = %config.checkout.api_base, "Hosted checkout enabled");
            Some(Arc::new(client) as Arc<dyn CheckoutProvider>)
        }
        None => {
            warn!("CHECKOUT_SECRET_KEY not set; hosted checkout disabled");
            None
        }
    };
    let checkout = CheckoutReconciler::new(
        provider,
        kv,
        orders.clone(),
        clock,
        CheckoutConfig::new(&config.server.public_base_url)
            .with_currency(config.checkout.currency.clone()),
    );

    // Long enough for the browser to still send the cookie when the session
    // has just lapsed, so the expiry notice can be shown.
    let max_age = (access_config.session_duration + access_config.expired_notice_grace)
        .to_std()
        .unwrap_or(Duration::from_secs(600));

    let mut state = AppState::new(access, orders, checkout).with_cookie(CookieSettings {
        secure: config.server.session_cookie_secure,
        max_age,
    })
    .with_trusted_proxy_headers(config.server.trust_proxy_headers);
    if let Some(token) = &config.admin_token {
        state = state.with_admin_token(token.expose());
    }

    Ok(state)
}

/// Install the Prometheus exporter if an address is configured.
///
/// # Errors
///
/// Returns an error if the exporter cannot bind.
pub fn install_metrics(addr: Option<SocketAddr>) -> anyhow::Result<()> {
    let Some(addr) = addr else {
        return Ok(());
    };
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Serve the router until a shutdown signal, then give in-flight requests
/// up to `shutdown_timeout` to finish.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let app = canteen_web::router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .await
    });

    shutdown_signal().await;
    let _ = stop_tx.send(());

    match tokio::time::timeout(config.server.shutdown_timeout, server).await {
        Ok(joined) => joined.context("Server task failed")??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout.as_secs(),
            "Shutdown timed out with requests still in flight"
        ),
    }

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal, shutting down gracefully..."),
        () = terminate => info!("Received SIGTERM signal, shutting down gracefully..."),
    }
}
