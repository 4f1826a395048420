//! Gateway webhook event decoding
//!
//! Settlements arrive as JSON events shaped `{id, type, data: {object}}`.
//! Decoding is deliberately tolerant: only the fields this system routes on
//! are extracted, unknown event types decode to [`GatewayEventKind::Unrecognized`]
//! rather than an error, and correlation metadata is kept as the raw strings
//! the gateway echoed back so callers can log exactly what arrived. Signature
//! verification happens before decoding and lives with the gateway adapter.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use core_kernel::OrderId;

use crate::error::BillingError;
use crate::gateway::PaymentPurpose;

/// Correlation metadata echoed back from checkout session creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventMetadata {
    /// Order id as it was written into the session metadata
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
    /// Payment purpose tag, `deposit` or `full_payment`
    #[serde(rename = "type")]
    pub purpose: Option<String>,
}

impl EventMetadata {
    /// Parses the order id, if present and well formed
    pub fn parsed_order_id(&self) -> Option<OrderId> {
        self.order_id.as_deref().and_then(|raw| raw.parse().ok())
    }

    /// Parses the payment purpose, if present and well formed
    pub fn parsed_purpose(&self) -> Option<PaymentPurpose> {
        self.purpose.as_deref().and_then(|raw| raw.parse().ok())
    }
}

/// The checkout session object carried by completion and expiry events
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionPayload {
    /// Gateway session identifier
    #[serde(rename = "id")]
    pub session_id: String,
    /// Payment intent behind the session, once one exists
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Amount collected, in minor units
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// ISO currency code, lowercase on the wire
    #[serde(default)]
    pub currency: Option<String>,
    /// Correlation metadata
    #[serde(default)]
    pub metadata: EventMetadata,
}

/// The payment intent object carried by failure events
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentPayload {
    /// Gateway payment intent identifier
    #[serde(rename = "id")]
    pub intent_id: String,
}

/// The charge object carried by refund events
#[derive(Debug, Clone, Deserialize)]
pub struct ChargePayload {
    /// Gateway charge identifier
    #[serde(rename = "id")]
    pub charge_id: String,
    /// Payment intent the charge settled
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Amount originally charged, in minor units
    pub amount: i64,
    /// Cumulative amount refunded so far, in minor units
    #[serde(default)]
    pub amount_refunded: i64,
    /// ISO currency code, lowercase on the wire
    #[serde(default)]
    pub currency: Option<String>,
}

/// A decoded gateway event, routed by type
#[derive(Debug, Clone)]
pub enum GatewayEventKind {
    /// `checkout.session.completed` - a payment settled
    CheckoutCompleted(CheckoutSessionPayload),
    /// `checkout.session.expired` - a session lapsed unpaid
    CheckoutExpired(CheckoutSessionPayload),
    /// `payment_intent.payment_failed` - an attempt failed, logged only
    PaymentFailed(PaymentIntentPayload),
    /// `charge.refunded` - money went back to the customer
    ChargeRefunded(ChargePayload),
    /// Any event type this system does not act on
    Unrecognized { event_type: String },
}

/// A decoded webhook delivery
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    /// Gateway event id, the idempotency key for settlement
    pub id: String,
    /// Decoded payload
    pub kind: GatewayEventKind,
}

impl GatewayEvent {
    /// Decodes a raw webhook body
    ///
    /// # Errors
    ///
    /// Returns `MalformedEvent` when the envelope or a recognized payload
    /// cannot be decoded. Unknown event types are not an error.
    pub fn from_json(payload: &[u8]) -> Result<GatewayEvent, BillingError> {
        #[derive(Deserialize)]
        struct WireEvent {
            id: String,
            #[serde(rename = "type")]
            event_type: String,
            data: WireData,
        }

        #[derive(Deserialize)]
        struct WireData {
            object: serde_json::Value,
        }

        let wire: WireEvent = serde_json::from_slice(payload)
            .map_err(|err| BillingError::MalformedEvent(err.to_string()))?;

        let kind = match wire.event_type.as_str() {
            "checkout.session.completed" => {
                GatewayEventKind::CheckoutCompleted(decode_object(wire.data.object)?)
            }
            "checkout.session.expired" => {
                GatewayEventKind::CheckoutExpired(decode_object(wire.data.object)?)
            }
            "payment_intent.payment_failed" => {
                GatewayEventKind::PaymentFailed(decode_object(wire.data.object)?)
            }
            "charge.refunded" => {
                GatewayEventKind::ChargeRefunded(decode_object(wire.data.object)?)
            }
            other => GatewayEventKind::Unrecognized {
                event_type: other.to_string(),
            },
        };

        Ok(GatewayEvent { id: wire.id, kind })
    }

    /// Returns the wire name of the event type, for log lines
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            GatewayEventKind::CheckoutCompleted(_) => "checkout.session.completed",
            GatewayEventKind::CheckoutExpired(_) => "checkout.session.expired",
            GatewayEventKind::PaymentFailed(_) => "payment_intent.payment_failed",
            GatewayEventKind::ChargeRefunded(_) => "charge.refunded",
            GatewayEventKind::Unrecognized { event_type } => event_type,
        }
    }
}

fn decode_object<T: DeserializeOwned>(object: serde_json::Value) -> Result<T, BillingError> {
    serde_json::from_value(object).map_err(|err| BillingError::MalformedEvent(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_completed_checkout_with_metadata() {
        let order_id = OrderId::new();
        let body = json!({
            "id": "evt_1A",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_live_123",
                    "object": "checkout.session",
                    "payment_intent": "pi_789",
                    "amount_total": 135000,
                    "currency": "aud",
                    "metadata": {
                        "orderId": order_id.to_string(),
                        "type": "deposit"
                    }
                }
            }
        });

        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        assert_eq!(event.id, "evt_1A");
        let GatewayEventKind::CheckoutCompleted(session) = event.kind else {
            panic!("expected checkout completion");
        };
        assert_eq!(session.session_id, "cs_live_123");
        assert_eq!(session.payment_intent.as_deref(), Some("pi_789"));
        assert_eq!(session.amount_total, Some(135000));
        assert_eq!(session.metadata.parsed_order_id(), Some(order_id));
        assert_eq!(
            session.metadata.parsed_purpose(),
            Some(PaymentPurpose::Deposit)
        );
    }

    #[test]
    fn test_missing_metadata_decodes_to_none() {
        let body = json!({
            "id": "evt_2B",
            "type": "checkout.session.completed",
            "data": {
                "object": { "id": "cs_live_456" }
            }
        });

        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let GatewayEventKind::CheckoutCompleted(session) = event.kind else {
            panic!("expected checkout completion");
        };
        assert_eq!(session.metadata.parsed_order_id(), None);
        assert_eq!(session.metadata.parsed_purpose(), None);
        assert_eq!(session.payment_intent, None);
    }

    #[test]
    fn test_garbage_order_id_decodes_to_none_but_keeps_raw() {
        let body = json!({
            "id": "evt_3C",
            "type": "checkout.session.expired",
            "data": {
                "object": {
                    "id": "cs_live_789",
                    "metadata": { "orderId": "not-a-uuid", "type": "deposit" }
                }
            }
        });

        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let GatewayEventKind::CheckoutExpired(session) = event.kind else {
            panic!("expected checkout expiry");
        };
        assert_eq!(session.metadata.parsed_order_id(), None);
        assert_eq!(session.metadata.order_id.as_deref(), Some("not-a-uuid"));
    }

    #[test]
    fn test_decodes_refund_amounts() {
        let body = json!({
            "id": "evt_4D",
            "type": "charge.refunded",
            "data": {
                "object": {
                    "id": "ch_1",
                    "payment_intent": "pi_789",
                    "amount": 450000,
                    "amount_refunded": 135000,
                    "currency": "aud",
                    "refunded": false
                }
            }
        });

        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let GatewayEventKind::ChargeRefunded(charge) = event.kind else {
            panic!("expected refund");
        };
        assert_eq!(charge.amount, 450000);
        assert_eq!(charge.amount_refunded, 135000);
        assert_eq!(charge.payment_intent.as_deref(), Some("pi_789"));
    }

    #[test]
    fn test_decodes_payment_failure() {
        let body = json!({
            "id": "evt_5E",
            "type": "payment_intent.payment_failed",
            "data": {
                "object": { "id": "pi_bad", "last_payment_error": { "code": "card_declined" } }
            }
        });

        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let GatewayEventKind::PaymentFailed(intent) = event.kind else {
            panic!("expected payment failure");
        };
        assert_eq!(intent.intent_id, "pi_bad");
    }

    #[test]
    fn test_unknown_event_type_is_not_an_error() {
        let body = json!({
            "id": "evt_6F",
            "type": "customer.created",
            "data": { "object": { "id": "cus_1" } }
        });

        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        assert!(matches!(
            event.kind,
            GatewayEventKind::Unrecognized { ref event_type } if event_type == "customer.created"
        ));
        assert_eq!(event.kind_name(), "customer.created");
    }

    #[test]
    fn test_rejects_non_event_body() {
        let err = GatewayEvent::from_json(b"not json").unwrap_err();
        assert!(matches!(err, BillingError::MalformedEvent(_)));

        let missing_data = json!({ "id": "evt_7G", "type": "charge.refunded" });
        let err = GatewayEvent::from_json(missing_data.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, BillingError::MalformedEvent(_)));
    }
}
