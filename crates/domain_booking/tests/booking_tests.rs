//! End-to-end tests for the booking services
//!
//! Each test wires the four services over one shared in-memory store and
//! walks a real customer journey: book, pay the deposit, pay the balance,
//! get reminded, get asked for feedback. Gateway events are fed in as the
//! JSON bodies the webhook endpoint would receive.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::json;

use core_kernel::{Currency, FixedClock, Money, OrderId, Timezone};
use domain_billing::{GatewayEvent, InvoiceType, MockPaymentGateway, PaymentPurpose};
use domain_booking::{
    BookingConfirmation, BookingIntakeService, BookingSubmission, CheckoutService, IntakeConfig,
    MemoryBookingStore, MockNotificationSender, NotificationOutcome, ReconcileOutcome,
    ReminderConfig, ReminderScheduler, ScanReport, WebhookReconciler,
};
use domain_orders::{Activity, OrderStatus, Package};
use domain_party::{ChildInfo, ContactInfo, PartyDetails, PartyStatus};

const BRISBANE: &str = "Australia/Brisbane";

fn brisbane() -> Timezone {
    BRISBANE.parse().unwrap()
}

// 09:00 on 2025-07-14 in Brisbane
fn booking_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 13, 23, 0, 0).unwrap()
}

fn aud(minor: i64) -> Money {
    Money::from_minor(minor, Currency::AUD)
}

struct TestApp {
    store: Arc<MemoryBookingStore>,
    notifier: Arc<MockNotificationSender>,
    gateway: Arc<MockPaymentGateway>,
    clock: Arc<FixedClock>,
    intake: BookingIntakeService,
    checkout: CheckoutService,
    reconciler: WebhookReconciler,
    scheduler: ReminderScheduler,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryBookingStore::with_catalog(
        vec![Package {
            id: "pkg_superhero".to_string(),
            name: "Superhero Spectacular".to_string(),
            price: aud(450_000),
        }],
        vec![
            Activity {
                id: "act_face_painting".to_string(),
                name: "Face Painting".to_string(),
                price: aud(15_000),
            },
            Activity {
                id: "act_magic_show".to_string(),
                name: "Magic Show".to_string(),
                price: aud(25_000),
            },
        ],
    ));
    let notifier = Arc::new(MockNotificationSender::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let clock = Arc::new(FixedClock::new(booking_time()));

    let intake = BookingIntakeService::new(
        store.clone(),
        notifier.clone(),
        clock.clone(),
        IntakeConfig {
            timezone: brisbane(),
            ..IntakeConfig::default()
        },
    );
    let checkout = CheckoutService::new(store.clone(), gateway.clone());
    let reconciler = WebhookReconciler::new(store.clone(), notifier.clone(), clock.clone());
    let scheduler = ReminderScheduler::new(
        store.clone(),
        notifier.clone(),
        clock.clone(),
        ReminderConfig {
            payment_due_days: 3,
            timezone: brisbane(),
        },
    );

    TestApp {
        store,
        notifier,
        gateway,
        clock,
        intake,
        checkout,
        reconciler,
        scheduler,
    }
}

fn submission(party_date: NaiveDate) -> BookingSubmission {
    BookingSubmission {
        package_id: Some("pkg_superhero".to_string()),
        activity_ids: vec![],
        party_details: Some(PartyDetails {
            date: party_date,
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            venue: "Main Hall".to_string(),
            guest_count: 12,
            special_requests: Some("Blue balloons".to_string()),
        }),
        child_info: Some(ChildInfo {
            child_name: "Ruby".to_string(),
            child_age: 7,
            allergies: Some("Peanuts".to_string()),
            special_needs: None,
        }),
        contact: Some(ContactInfo {
            parent_name: "Kim Parker".to_string(),
            parent_email: "kim.parker@example.com".to_string(),
            parent_phone: "0400 111 222".to_string(),
            emergency_contact: "Sam 0400 333 444".to_string(),
        }),
        safety_acknowledged: true,
    }
}

fn completed_session_event(event_id: &str, order_id: OrderId, purpose: &str) -> GatewayEvent {
    let body = json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": format!("cs_{event_id}"),
            "payment_intent": format!("pi_{event_id}"),
            "currency": "aud",
            "metadata": { "orderId": order_id.to_string(), "type": purpose }
        }}
    });
    GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
}

fn expired_session_event(event_id: &str, order_id: OrderId) -> GatewayEvent {
    let body = json!({
        "id": event_id,
        "type": "checkout.session.expired",
        "data": { "object": {
            "id": format!("cs_{event_id}"),
            "metadata": { "orderId": order_id.to_string(), "type": "deposit" }
        }}
    });
    GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
}

fn refund_event(event_id: &str, intent: &str, amount: i64, refunded: i64) -> GatewayEvent {
    let body = json!({
        "id": event_id,
        "type": "charge.refunded",
        "data": { "object": {
            "id": format!("ch_{event_id}"),
            "payment_intent": intent,
            "amount": amount,
            "amount_refunded": refunded,
            "currency": "aud"
        }}
    });
    GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
}

async fn book(app: &TestApp, party_date: NaiveDate) -> BookingConfirmation {
    app.intake.create_booking(submission(party_date)).await.unwrap()
}

// ============================================================================
// Happy Path
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_booking_through_both_payments() {
        let app = test_app();
        let party_date = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();

        // Book
        let confirmation = book(&app, party_date).await;
        assert_eq!(confirmation.notification, NotificationOutcome::Sent);
        assert!(confirmation.order_number.starts_with("PP2507-"));

        // Start the deposit checkout; the gateway sees the deposit amount
        let session = app.checkout.start_deposit(confirmation.order_id).await.unwrap();
        assert!(!session.url.is_empty());
        let request = &app.gateway.requests().await[0];
        assert_eq!(request.amount, aud(135_000));
        assert_eq!(request.purpose, PaymentPurpose::Deposit);

        // The gateway calls back; order and party confirm
        let outcome = app
            .reconciler
            .process(&completed_session_event("evt_dep", confirmation.order_id, "deposit"))
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        let order = app.store.order(confirmation.order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(
            app.store.party(confirmation.party_id).await.unwrap().status,
            PartyStatus::Confirmed
        );

        // Balance checkout charges what remains
        app.checkout.start_full_payment(confirmation.order_id).await.unwrap();
        let request = &app.gateway.requests().await[1];
        assert_eq!(request.amount, aud(315_000));
        assert_eq!(request.purpose, PaymentPurpose::FullPayment);

        // Second callback completes everything
        app.reconciler
            .process(&completed_session_event("evt_bal", confirmation.order_id, "full_payment"))
            .await
            .unwrap();
        let order = app.store.order(confirmation.order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(
            app.store.party(confirmation.party_id).await.unwrap().status,
            PartyStatus::Completed
        );

        // Two invoices, numbered in sequence, totalling the order
        let invoices = app.store.invoices().await;
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].invoice_number.to_string(), "PP-INV-2025-001");
        assert_eq!(invoices[0].invoice_type, InvoiceType::Deposit);
        assert_eq!(invoices[1].invoice_number.to_string(), "PP-INV-2025-002");
        assert_eq!(invoices[1].invoice_type, InvoiceType::Final);
        let invoiced = invoices[0].total.checked_add(&invoices[1].total).unwrap();
        assert_eq!(invoiced, aud(450_000));

        // One confirmation and two receipts went out
        assert_eq!(app.notifier.confirmations().await.len(), 1);
        let receipts = app.notifier.receipts().await;
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].purpose, PaymentPurpose::Deposit);
        assert_eq!(receipts[1].purpose, PaymentPurpose::FullPayment);
    }

    #[tokio::test]
    async fn test_webhook_replays_change_nothing() {
        let app = test_app();
        let confirmation = book(&app, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()).await;
        let event = completed_session_event("evt_dep", confirmation.order_id, "deposit");

        app.reconciler.process(&event).await.unwrap();
        for _ in 0..3 {
            let outcome = app.reconciler.process(&event).await.unwrap();
            assert_eq!(outcome, ReconcileOutcome::Duplicate);
        }

        assert_eq!(app.store.invoices().await.len(), 1);
        assert_eq!(app.notifier.receipts().await.len(), 1);
        let customers = app.store.customers().await;
        assert_eq!(customers[0].total_booked, 1);
    }
}

// ============================================================================
// Abandonment and Refunds
// ============================================================================

mod unwind_tests {
    use super::*;

    #[tokio::test]
    async fn test_abandoned_checkout_cancels_only_the_order() {
        let app = test_app();
        let confirmation = book(&app, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()).await;

        app.reconciler
            .process(&expired_session_event("evt_exp", confirmation.order_id))
            .await
            .unwrap();

        assert_eq!(
            app.store.order(confirmation.order_id).await.unwrap().status(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            app.store.party(confirmation.party_id).await.unwrap().status,
            PartyStatus::Inquiry
        );
        assert!(app.store.invoices().await.is_empty());

        // The same customer can book again
        let again = book(&app, NaiveDate::from_ymd_opt(2025, 8, 9).unwrap()).await;
        assert_ne!(again.order_number, confirmation.order_number);
        assert_eq!(app.store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn test_full_refund_unwinds_booking_and_stops_reminders() {
        let app = test_app();
        // Party later today, already inside the reminder window
        let confirmation = book(&app, NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()).await;

        app.reconciler
            .process(&completed_session_event("evt_dep", confirmation.order_id, "deposit"))
            .await
            .unwrap();
        app.reconciler
            .process(&refund_event("evt_ref", "pi_evt_dep", 135_000, 135_000))
            .await
            .unwrap();

        let order = app.store.order(confirmation.order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.pricing().refund_amount, Some(aud(135_000)));
        assert_eq!(
            app.store.party(confirmation.party_id).await.unwrap().status,
            PartyStatus::Cancelled
        );
        let invoices = app.store.invoices().await;
        assert!(invoices[0].voided_at.is_some());

        // A cancelled party gets no reminder
        let report = app.scheduler.run_party_reminders().await.unwrap();
        assert_eq!(report, ScanReport::default());
        assert!(app.notifier.reminders().await.is_empty());
    }

    #[tokio::test]
    async fn test_partial_refund_keeps_the_party_on() {
        let app = test_app();
        let confirmation = book(&app, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()).await;
        app.reconciler
            .process(&completed_session_event("evt_dep", confirmation.order_id, "deposit"))
            .await
            .unwrap();

        app.reconciler
            .process(&refund_event("evt_ref", "pi_evt_dep", 135_000, 50_000))
            .await
            .unwrap();

        let order = app.store.order(confirmation.order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.pricing().refund_amount, Some(aud(50_000)));
        assert_eq!(
            app.store.party(confirmation.party_id).await.unwrap().status,
            PartyStatus::Confirmed
        );
        assert!(app.store.invoices().await[0].voided_at.is_none());
    }
}

// ============================================================================
// Scheduled Notifications Across Days
// ============================================================================

mod schedule_tests {
    use super::*;

    #[tokio::test]
    async fn test_reminder_day_then_feedback_day() {
        let app = test_app();
        // Booked on the morning of the 14th for an 08:00 party on the 16th
        let mut booked = submission(NaiveDate::from_ymd_opt(2025, 7, 16).unwrap());
        if let Some(details) = booked.party_details.as_mut() {
            details.start_time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        }
        let confirmation = app.intake.create_booking(booked).await.unwrap();
        app.reconciler
            .process(&completed_session_event("evt_dep", confirmation.order_id, "deposit"))
            .await
            .unwrap();

        // Day of booking: party is two days out, nothing fires
        let report = app.scheduler.run_all().await.unwrap();
        assert_eq!(report.party_reminders, ScanReport::default());
        assert_eq!(report.feedback_requests, ScanReport::default());

        // Morning of the 15th: the party is within 24 hours, reminder goes out
        app.clock.advance(Duration::hours(24));
        let report = app.scheduler.run_all().await.unwrap();
        assert_eq!(report.party_reminders.sent, 1);
        let reminders = app.notifier.reminders().await;
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].party_date, NaiveDate::from_ymd_opt(2025, 7, 16).unwrap());
        assert_eq!(
            reminders[0].start_time,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );

        // Morning of the 16th: the party has started, nothing fires
        app.clock.advance(Duration::hours(24));
        let report = app.scheduler.run_all().await.unwrap();
        assert_eq!(report.party_reminders, ScanReport::default());
        assert_eq!(report.feedback_requests, ScanReport::default());

        // The 17th: feedback request for yesterday's party
        app.clock.advance(Duration::hours(24));
        let report = app.scheduler.run_all().await.unwrap();
        assert_eq!(report.feedback_requests.sent, 1);
        let requests = app.notifier.feedback_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].child_name, "Ruby");

        // The 18th: everything has been said
        app.clock.advance(Duration::hours(24));
        let report = app.scheduler.run_all().await.unwrap();
        assert_eq!(report.feedback_requests, ScanReport::default());
    }

    #[tokio::test]
    async fn test_balance_due_notice_three_days_ahead() {
        let app = test_app();
        // Party on the 17th, three days after booking day
        let confirmation = book(&app, NaiveDate::from_ymd_opt(2025, 7, 17).unwrap()).await;
        app.reconciler
            .process(&completed_session_event("evt_dep", confirmation.order_id, "deposit"))
            .await
            .unwrap();

        let report = app.scheduler.run_payment_due().await.unwrap();

        assert_eq!(report.sent, 1);
        let notices = app.notifier.balance_notices().await;
        assert_eq!(notices[0].outstanding, aud(315_000));
        assert_eq!(notices[0].order_number, confirmation.order_number);
        assert_eq!(
            notices[0].due_date,
            NaiveDate::from_ymd_opt(2025, 7, 17).unwrap()
        );

        // Once the balance is settled the order drops out of the scan
        app.reconciler
            .process(&completed_session_event("evt_bal", confirmation.order_id, "full_payment"))
            .await
            .unwrap();
        let report = app.scheduler.run_payment_due().await.unwrap();
        assert_eq!(report, ScanReport::default());
    }
}
