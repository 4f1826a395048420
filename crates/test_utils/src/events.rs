//! Gateway Event Constructors
//!
//! Builds the webhook JSON bodies the payment gateway delivers, in the
//! exact wire shape the decoder expects. Tests can post the raw value to
//! the webhook endpoint or decode it straight into a `GatewayEvent`.

use core_kernel::OrderId;
use domain_billing::{GatewayEvent, PaymentPurpose};
use serde_json::{json, Value};

/// A completed checkout session for the given order and purpose
pub fn checkout_completed(event_id: &str, order_id: OrderId, purpose: PaymentPurpose) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": format!("cs_{event_id}"),
            "payment_intent": format!("pi_{event_id}"),
            "currency": "aud",
            "metadata": {
                "orderId": order_id.to_string(),
                "type": purpose.as_str()
            }
        }}
    })
}

/// A checkout session that lapsed unpaid
pub fn checkout_expired(event_id: &str, order_id: OrderId) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.expired",
        "data": { "object": {
            "id": format!("cs_{event_id}"),
            "metadata": {
                "orderId": order_id.to_string(),
                "type": PaymentPurpose::Deposit.as_str()
            }
        }}
    })
}

/// A failed payment attempt note
pub fn payment_failed(event_id: &str, intent: &str) -> Value {
    json!({
        "id": event_id,
        "type": "payment_intent.payment_failed",
        "data": { "object": { "id": intent } }
    })
}

/// A refund against a charge, partial or full
pub fn charge_refunded(event_id: &str, intent: &str, amount: i64, refunded: i64) -> Value {
    json!({
        "id": event_id,
        "type": "charge.refunded",
        "data": { "object": {
            "id": format!("ch_{event_id}"),
            "payment_intent": intent,
            "amount": amount,
            "amount_refunded": refunded,
            "currency": "aud"
        }}
    })
}

/// An event type this system does not act on
pub fn unrecognized(event_id: &str, event_type: &str) -> Value {
    json!({
        "id": event_id,
        "type": event_type,
        "data": { "object": {} }
    })
}

/// Decodes a constructed body the way the webhook endpoint would
pub fn decode(body: &Value) -> GatewayEvent {
    GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_billing::GatewayEventKind;

    #[test]
    fn test_completed_event_round_trips() {
        let order_id = OrderId::new();
        let event = decode(&checkout_completed("evt_1", order_id, PaymentPurpose::Deposit));

        assert_eq!(event.id, "evt_1");
        let GatewayEventKind::CheckoutCompleted(session) = event.kind else {
            panic!("expected checkout completion");
        };
        assert_eq!(session.metadata.parsed_order_id(), Some(order_id));
        assert_eq!(session.metadata.parsed_purpose(), Some(PaymentPurpose::Deposit));
    }

    #[test]
    fn test_refund_event_round_trips() {
        let event = decode(&charge_refunded("evt_2", "pi_42", 450_000, 450_000));

        let GatewayEventKind::ChargeRefunded(charge) = event.kind else {
            panic!("expected refund");
        };
        assert_eq!(charge.payment_intent.as_deref(), Some("pi_42"));
        assert_eq!(charge.amount_refunded, 450_000);
    }

    #[test]
    fn test_unrecognized_event_keeps_its_type() {
        let event = decode(&unrecognized("evt_3", "customer.created"));
        assert!(matches!(
            event.kind,
            GatewayEventKind::Unrecognized { .. }
        ));
    }
}
