//! Stripe Checkout adapter
//!
//! This module provides the outbound half of the payment integration:
//! creating hosted Checkout Sessions over the Stripe HTTP API, and
//! verifying the signature on inbound webhook deliveries before anything
//! downstream decodes them.
//!
//! # Overview
//!
//! The `StripeGateway`:
//!
//! - Form-posts to `/v1/checkout/sessions` with the amount in minor
//!   units and the order correlation data in session metadata
//! - Applies a bounded request timeout so a slow gateway cannot stall
//!   a booking request indefinitely
//! - Maps gateway responses into the port error taxonomy: timeouts and
//!   5xx responses are transient, 4xx rejections are validation errors
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_gateway::{StripeConfig, StripeGateway};
//!
//! let gateway = StripeGateway::new(StripeConfig {
//!     secret_key: secret,
//!     success_url: "https://partypalace.example/booking/success".into(),
//!     cancel_url: "https://partypalace.example/booking/cancelled".into(),
//! })?;
//! let session = gateway.create_checkout_session(request).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
use domain_billing::{CheckoutSession, CheckoutSessionRequest, PaymentGateway};

const CHECKOUT_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum age of a webhook timestamp before the delivery is rejected
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Configuration for the Stripe adapter
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: String,
    /// URL customers land on after paying
    pub success_url: String,
    /// URL customers land on after abandoning checkout
    pub cancel_url: String,
}

/// Stripe-backed implementation of the PaymentGateway trait
///
/// Settlement never comes back on this interface; it arrives later as
/// signed webhook events handled by the reconciler.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    /// Creates a new Stripe gateway with a bounded-timeout HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - API key and checkout redirect URLs
    pub fn new(config: StripeConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { client, config })
    }
}

/// Response body for a created checkout session
#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

/// Error envelope Stripe returns on rejected requests
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl DomainPort for StripeGateway {}

#[async_trait]
impl HealthCheckable for StripeGateway {
    /// Reports adapter health from configuration alone
    ///
    /// No request is made; a live call per health probe would burn API
    /// quota and rate limits.
    async fn health_check(&self) -> HealthCheckResult {
        let configured = !self.config.secret_key.is_empty();
        HealthCheckResult {
            adapter_id: "stripe-gateway".to_string(),
            status: if configured {
                AdapterHealth::Healthy
            } else {
                AdapterHealth::Unhealthy
            },
            latency_ms: 0,
            message: if configured {
                None
            } else {
                Some("Stripe secret key is not configured".to_string())
            },
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(
        skip(self, request),
        fields(order_id = %request.order_id, purpose = %request.purpose)
    )]
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PortError> {
        debug!("Creating checkout session");

        let form: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("customer_email", request.customer_email.clone()),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.amount.currency().code().to_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount.amount_minor().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.description.clone(),
            ),
            ("metadata[orderId]", request.order_id.to_string()),
            ("metadata[type]", request.purpose.as_str().to_string()),
        ];

        let response = self
            .client
            .post(CHECKOUT_SESSIONS_URL)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(request_to_port_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            warn!(%status, %detail, "Stripe rejected checkout session");

            return Err(
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    PortError::ServiceUnavailable {
                        service: "stripe".to_string(),
                    }
                } else {
                    PortError::validation(format!("Stripe rejected session: {}", detail))
                },
            );
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PortError::internal(format!("Stripe response decode: {}", e)))?;
        let url = session
            .url
            .ok_or_else(|| PortError::internal("Stripe session has no redirect URL"))?;

        debug!(session_id = %session.id, "Checkout session created");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}

/// Maps an outbound HTTP failure into the port error taxonomy
fn request_to_port_error(error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Timeout {
            operation: "create_checkout_session".to_string(),
            duration_ms: REQUEST_TIMEOUT.as_millis() as u64,
        }
    } else if error.is_connect() {
        PortError::connection(error.to_string())
    } else {
        PortError::internal(error.to_string())
    }
}

// =============================================================================
// Webhook Signatures
// =============================================================================

/// Why a webhook delivery failed signature verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The header is missing its timestamp or carries no v1 signature
    #[error("Malformed signature header")]
    MalformedHeader,
    /// The timestamp is too far from the current time
    #[error("Signature timestamp outside tolerance")]
    TimestampOutOfTolerance,
    /// No v1 candidate matched the payload
    #[error("No matching signature")]
    NoMatchingSignature,
}

/// Verifies a `Stripe-Signature` header against the raw request body
///
/// The header carries `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The
/// signed string is `"{t}.{payload}"` keyed with the endpoint secret;
/// any one matching v1 candidate passes. Timestamps further than five
/// minutes from `now` are rejected to blunt replay.
///
/// # Arguments
///
/// * `payload` - Raw request body, exactly as received
/// * `header` - Value of the `Stripe-Signature` header
/// * `secret` - Webhook endpoint secret (`whsec_...`)
/// * `now` - Current instant, injected for testability
///
/// # Errors
///
/// Returns a [`SignatureError`] describing the first check that failed.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    // HMAC accepts keys of any length; this cannot fail for SHA-256.
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::NoMatchingSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in candidates {
        let Ok(bytes) = hex::decode(candidate) else {
            continue;
        };
        // verify_slice compares in constant time.
        if mac.clone().verify_slice(&bytes).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::NoMatchingSignature)
}
