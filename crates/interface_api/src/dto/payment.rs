//! Payment DTOs

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

/// Acknowledgement body for accepted webhook deliveries
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
