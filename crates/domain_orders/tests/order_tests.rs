//! Comprehensive tests for domain_orders

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use core_kernel::{Currency, CustomerId, Money, PartyId, DEFAULT_DEPOSIT_PERCENT};

use domain_orders::{
    Activity, Order, OrderItem, OrderNumber, OrderStatus, Package, Pricing,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, 10, 30, 0).unwrap()
}

fn aud(minor: i64) -> Money {
    Money::from_minor(minor, Currency::AUD)
}

fn test_items() -> Vec<OrderItem> {
    let package = Package {
        id: "superhero-deluxe".to_string(),
        name: "Superhero Deluxe".to_string(),
        price: aud(420_000),
    };
    let activity = Activity {
        id: "face-painting".to_string(),
        name: "Face Painting".to_string(),
        price: aud(30_000),
    };
    vec![OrderItem::from(&package), OrderItem::from(&activity)]
}

fn test_order() -> Order {
    let mut rng = StdRng::seed_from_u64(11);
    let number = OrderNumber::generate(now(), &mut rng);
    let items = test_items();
    let total = items
        .iter()
        .try_fold(Money::zero(Currency::AUD), |acc, item| {
            acc.checked_add(&item.price)
        })
        .unwrap();

    Order::new(
        CustomerId::new(),
        Some(PartyId::new()),
        number,
        items,
        Pricing::from_total(total, DEFAULT_DEPOSIT_PERCENT),
        now(),
    )
}

// ============================================================================
// Payment Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_items_price_the_order() {
        let order = test_order();

        assert_eq!(order.pricing().total, aud(450_000));
        assert_eq!(order.pricing().deposit, aud(135_000));
        assert_eq!(order.pricing().balance_due().unwrap(), aud(315_000));
        assert_eq!(order.items().len(), 2);
    }

    #[test]
    fn test_deposit_then_balance_completes_the_order() {
        let mut order = test_order();

        order
            .confirm_deposit("cs_dep", Some("pi_dep".to_string()), now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);

        order
            .complete_payment("cs_bal", Some("pi_bal".to_string()), now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
        assert!(order.pricing().paid_at.is_some());
    }

    #[test]
    fn test_events_name_each_settlement() {
        let mut order = test_order();
        order.confirm_deposit("cs_dep", None, now()).unwrap();
        order.complete_payment("cs_bal", None, now()).unwrap();

        let names: Vec<&str> = order.take_events().iter().map(|e| e.name()).collect();

        assert_eq!(
            names,
            vec!["order_created", "deposit_confirmed", "payment_completed"]
        );
    }

    #[test]
    fn test_events_are_not_serialized() {
        let order = test_order();
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("events").is_none());
    }
}

// ============================================================================
// Refund Classification Tests
// ============================================================================

mod refund_tests {
    use super::*;

    #[test]
    fn test_deposit_only_refund_cancels_when_full() {
        // Only the deposit was charged, so refunding it in full cancels
        let mut order = test_order();
        order.confirm_deposit("cs_dep", Some("pi_dep".to_string()), now()).unwrap();

        let charged = order.pricing().deposit;
        assert!(Money::is_full_refund(&charged, &aud(135_000)));

        order.apply_refund(aud(135_000), true, now()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_partial_refund_of_full_charge_keeps_order_alive() {
        let mut order = test_order();
        order.confirm_deposit("cs_dep", None, now()).unwrap();
        order.complete_payment("cs_bal", None, now()).unwrap();

        // 135000 back out of 450000 charged is partial
        let charged = aud(450_000);
        let refunded = aud(135_000);
        assert!(!Money::is_full_refund(&charged, &refunded));

        order.apply_refund(refunded, false, now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.pricing().refund_amount, Some(refunded));
        assert!(order.pricing().refunded_at.is_some());
    }
}

// ============================================================================
// Order Number Tests
// ============================================================================

mod number_tests {
    use super::*;

    #[test]
    fn test_same_seed_reproduces_the_number() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);

        assert_eq!(
            OrderNumber::generate(now(), &mut a),
            OrderNumber::generate(now(), &mut b)
        );
    }

    #[test]
    fn test_fresh_draws_give_fresh_suffixes() {
        let mut rng = StdRng::seed_from_u64(99);
        let first = OrderNumber::generate(now(), &mut rng);
        let second = OrderNumber::generate(now(), &mut rng);

        assert_ne!(first, second);
        assert_eq!(&first.as_str()[..7], &second.as_str()[..7]);
    }

    #[test]
    fn test_number_survives_storage_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);
        let number = OrderNumber::generate(now(), &mut rng);

        let stored = number.to_string();
        let restored: OrderNumber = stored.parse().unwrap();

        assert_eq!(restored, number);
    }
}
