//! Payment webhook handler

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use tracing::{info, warn};

use domain_billing::GatewayEvent;
use infra_gateway::verify_webhook_signature;

use crate::dto::payment::WebhookAck;
use crate::{error::ApiError, AppState};

/// Receives a signed gateway event and hands it to the reconciler
///
/// The raw body is verified against the `Stripe-Signature` header before
/// anything decodes it. Accepted events are acknowledged with 200 whatever
/// the settlement outcome; only a transient store failure refuses the
/// delivery, so the gateway redelivers it.
pub async fn handle_payment_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Validation("Missing signature header".to_string()))?;

    verify_webhook_signature(
        &body,
        signature,
        &state.config.webhook_secret,
        state.clock.now(),
    )
    .map_err(|e| {
        warn!(reason = %e, "Webhook signature rejected");
        ApiError::Validation("Invalid signature".to_string())
    })?;

    let event = GatewayEvent::from_json(&body)
        .map_err(|e| ApiError::Validation(format!("Malformed event payload: {}", e)))?;

    let outcome = state.reconciler.process(&event).await?;

    info!(
        event_id = %event.id,
        kind = event.kind_name(),
        outcome = ?outcome,
        "Webhook processed"
    );

    Ok(Json(WebhookAck { received: true }))
}
