//! Party Palace - API Server Binary
//!
//! This binary starts the HTTP API server for the party booking platform.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin booking-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin booking-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_STRIPE_SECRET_KEY` - Stripe secret API key
//! * `API_WEBHOOK_SECRET` - Webhook endpoint secret for signature verification
//! * `API_CRON_SECRET` - Bearer token for the cron trigger (unset disables it)
//! * `API_CHECKOUT_SUCCESS_URL` / `API_CHECKOUT_CANCEL_URL` - Checkout redirects
//! * `API_BUSINESS_TIMEZONE` - Venue timezone (default: Australia/Brisbane)
//! * `API_PAYMENT_DUE_DAYS` - Balance-due lead time in days (default: 3)
//! * `API_DEPOSIT_PERCENT` - Deposit percentage (default: 30)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{AdapterHealth, HealthCheckable, SystemClock};
use infra_db::{create_pool_from_url, PostgresBookingStore};
use infra_gateway::{LogNotifier, StripeConfig, StripeGateway};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, wires the adapters and
/// services, and starts the HTTP server.
///
/// # Errors
///
/// Returns an error if:
/// - The configured business timezone is unknown
/// - Database connection fails
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    // Load configuration from environment
    let config = load_config();

    // Initialize tracing/logging
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.business_timezone,
        "Starting Party Palace API Server"
    );

    // Create database connection pool and adapters
    let pool = create_pool_from_url(&config.database_url).await?;
    let store = Arc::new(PostgresBookingStore::new(pool));
    verify_store(store.as_ref()).await?;

    let gateway = Arc::new(StripeGateway::new(StripeConfig {
        secret_key: config.stripe_secret_key.clone(),
        success_url: config.checkout_success_url.clone(),
        cancel_url: config.checkout_cancel_url.clone(),
    })?);
    let notifier = Arc::new(LogNotifier::new());
    let clock = Arc::new(SystemClock);

    // Wire services and create the API router
    let state = AppState::new(store, gateway, notifier, clock, config.clone())?;
    let app = create_router(state);

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables.
///
/// Falls back to default values if environment variables are not set.
fn load_config() -> ApiConfig {
    // Try to load from environment with API_ prefix
    ApiConfig::from_env().unwrap_or_else(|_| {
        // Fall back to individual env vars or defaults
        let defaults = ApiConfig::default();
        ApiConfig {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            stripe_secret_key: std::env::var("API_STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: std::env::var("API_WEBHOOK_SECRET").unwrap_or_default(),
            cron_secret: std::env::var("API_CRON_SECRET").ok(),
            checkout_success_url: std::env::var("API_CHECKOUT_SUCCESS_URL")
                .unwrap_or(defaults.checkout_success_url),
            checkout_cancel_url: std::env::var("API_CHECKOUT_CANCEL_URL")
                .unwrap_or(defaults.checkout_cancel_url),
            business_timezone: std::env::var("API_BUSINESS_TIMEZONE")
                .unwrap_or(defaults.business_timezone),
            payment_due_days: std::env::var("API_PAYMENT_DUE_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(defaults.payment_due_days),
            deposit_percent: std::env::var("API_DEPOSIT_PERCENT")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(defaults.deposit_percent),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
        }
    })
}

/// Initializes the tracing subscriber for structured logging.
///
/// # Arguments
///
/// * `log_level` - The minimum log level to output (trace, debug, info, warn, error)
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Checks store connectivity before the server starts accepting traffic.
///
/// The schema itself is applied externally from `migrations/`.
async fn verify_store(store: &PostgresBookingStore) -> anyhow::Result<()> {
    let health = store.health_check().await;
    if health.status == AdapterHealth::Unhealthy {
        anyhow::bail!(
            "Database not ready: {}",
            health.message.unwrap_or_else(|| "unknown".to_string())
        );
    }

    tracing::info!(latency_ms = health.latency_ms, "Database ready");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// This enables graceful shutdown of the server, allowing in-flight
/// requests to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
