//! HTTP API Layer
//!
//! This crate provides the REST API for the party booking platform using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: booking intake, checkout sessions, payment webhooks,
//!   cron-triggered reminder scans, health probes
//! - **Middleware**: request logging and tracing
//! - **DTOs**: response shapes for the public site and the gateway
//! - **Error Handling**: consistent `{error, code}` responses
//!
//! The four services are wired once into [`AppState`] from their ports, so
//! tests drive the same router against the in-memory store and mocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, gateway, notifier, clock, config)?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{Clock, UnknownTimezone};
use domain_billing::PaymentGateway;
use domain_booking::{
    BookingIntakeService, BookingStore, CheckoutService, IntakeConfig, NotificationSender,
    ReminderConfig, ReminderScheduler, WebhookReconciler,
};

use crate::config::ApiConfig;
use crate::handlers::{bookings, checkout, cron, health, webhooks};
use crate::middleware::request_log_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<BookingIntakeService>,
    pub checkout: Arc<CheckoutService>,
    pub reconciler: Arc<WebhookReconciler>,
    pub scheduler: Arc<ReminderScheduler>,
    pub store: Arc<dyn BookingStore>,
    pub clock: Arc<dyn Clock>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the four services from their ports
    ///
    /// # Errors
    ///
    /// Returns an error when the configured business timezone is unknown
    pub fn new(
        store: Arc<dyn BookingStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        config: ApiConfig,
    ) -> Result<Self, UnknownTimezone> {
        let timezone = config.timezone()?;

        let intake = Arc::new(BookingIntakeService::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            IntakeConfig {
                timezone,
                deposit_percent: config.deposit_percent,
                ..IntakeConfig::default()
            },
        ));
        let checkout = Arc::new(CheckoutService::new(store.clone(), gateway));
        let reconciler = Arc::new(WebhookReconciler::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let scheduler = Arc::new(ReminderScheduler::new(
            store.clone(),
            notifier,
            clock.clone(),
            ReminderConfig {
                payment_due_days: config.payment_due_days,
                timezone,
            },
        ));

        Ok(Self {
            intake,
            checkout,
            reconciler,
            scheduler,
            store,
            clock,
            config,
        })
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Wired application state
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no body parsing, no auth)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let api_routes = Router::new()
        .route("/bookings", post(bookings::create_booking))
        .route("/orders/:id/checkout/deposit", post(checkout::start_deposit))
        .route("/orders/:id/checkout/balance", post(checkout::start_balance))
        .route("/webhooks/payment", post(webhooks::handle_payment_event))
        .route("/cron/reminders", post(cron::run_reminders))
        .layer(axum_middleware::from_fn(request_log_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
