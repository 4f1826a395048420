//! Comprehensive tests for domain_party

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use core_kernel::{Currency, CustomerId, Money, Timezone};

use domain_party::checklist::SafetyChecklist;
use domain_party::customer::{normalize_email, ContactInfo, Customer};
use domain_party::party::{ChildInfo, Party, PartyDetails, PartyStatus};

fn brisbane() -> Timezone {
    Timezone::new(chrono_tz::Australia::Brisbane)
}

fn test_details() -> PartyDetails {
    PartyDetails {
        date: NaiveDate::from_ymd_opt(2025, 7, 19).unwrap(),
        start_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        venue: "Jungle Gym Hall".to_string(),
        guest_count: 15,
        special_requests: Some("Dinosaur theme".to_string()),
    }
}

fn test_child() -> ChildInfo {
    ChildInfo {
        child_name: "Oliver".to_string(),
        child_age: 7,
        allergies: None,
        special_needs: Some("Wheelchair access".to_string()),
    }
}

// ============================================================================
// Party Tests
// ============================================================================

mod party_tests {
    use super::*;

    #[test]
    fn test_party_created_in_inquiry_state() {
        let party = Party::new(
            CustomerId::new(),
            test_details(),
            test_child(),
            "Jess 0400 777 666",
            &brisbane(),
            Utc::now(),
        );

        assert_eq!(party.status, PartyStatus::Inquiry);
        assert_eq!(party.venue, "Jungle Gym Hall");
        assert_eq!(party.guest_count, 15);
        assert_eq!(party.child.child_name, "Oliver");
        assert_eq!(party.special_requests.as_deref(), Some("Dinosaur theme"));
    }

    #[test]
    fn test_party_starts_at_uses_venue_timezone() {
        let party = Party::new(
            CustomerId::new(),
            test_details(),
            test_child(),
            "Jess 0400 777 666",
            &brisbane(),
            Utc::now(),
        );

        // 10:30 in Brisbane (UTC+10) is 00:30 UTC the same day
        assert_eq!(
            party.starts_at,
            Utc.with_ymd_and_hms(2025, 7, 19, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_full_settlement_lifecycle() {
        let mut party = Party::new(
            CustomerId::new(),
            test_details(),
            test_child(),
            "Jess 0400 777 666",
            &brisbane(),
            Utc::now(),
        );
        let now = Utc::now();

        party.confirm(now).unwrap();
        party.complete(now).unwrap();

        assert_eq!(party.status, PartyStatus::Completed);
        assert!(party.status.is_terminal());
    }

    #[test]
    fn test_confirm_twice_is_rejected() {
        let mut party = Party::new(
            CustomerId::new(),
            test_details(),
            test_child(),
            "Jess 0400 777 666",
            &brisbane(),
            Utc::now(),
        );
        let now = Utc::now();

        party.confirm(now).unwrap();
        assert!(party.confirm(now).is_err());
        assert_eq!(party.status, PartyStatus::Confirmed);
    }

    #[test]
    fn test_notification_guards() {
        let mut party = Party::new(
            CustomerId::new(),
            test_details(),
            test_child(),
            "Jess 0400 777 666",
            &brisbane(),
            Utc::now(),
        );
        let now = Utc::now();

        party.mark_reminder_sent(now);
        party.mark_feedback_sent(now);

        assert_eq!(party.reminder_sent_at, Some(now));
        assert_eq!(party.feedback_sent_at, Some(now));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PartyStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }
}

// ============================================================================
// Customer Tests
// ============================================================================

mod customer_tests {
    use super::*;

    #[test]
    fn test_email_is_normalized_on_creation() {
        let customer = Customer::new(
            " Parent@Example.COM ",
            "Alex",
            "0400 111 222",
            Currency::AUD,
            Utc::now(),
        );
        assert_eq!(customer.email, "parent@example.com");
        assert_eq!(customer.email, normalize_email(" Parent@Example.COM "));
    }

    #[test]
    fn test_repeat_bookings_accumulate() {
        let mut customer = Customer::new(
            "parent@example.com",
            "Alex",
            "0400 111 222",
            Currency::AUD,
            Utc::now(),
        );

        for month in 1..=3u32 {
            let date = NaiveDate::from_ymd_opt(2025, month, 10).unwrap();
            customer
                .record_booking(Money::from_minor(200_000, Currency::AUD), date, Utc::now())
                .unwrap();
        }

        assert_eq!(customer.total_booked, 3);
        assert_eq!(
            customer.total_spent,
            Money::from_minor(600_000, Currency::AUD)
        );
        assert_eq!(
            customer.last_event_date,
            NaiveDate::from_ymd_opt(2025, 3, 10)
        );
    }

    #[test]
    fn test_contact_info_requires_all_fields() {
        let missing_phone = ContactInfo {
            parent_name: "Alex".to_string(),
            parent_email: "parent@example.com".to_string(),
            parent_phone: String::new(),
            emergency_contact: "Casey 0400 333 444".to_string(),
        };
        assert!(validator::Validate::validate(&missing_phone).is_err());
    }
}

// ============================================================================
// Safety Checklist Tests
// ============================================================================

mod checklist_tests {
    use super::*;
    use core_kernel::{OrderId, PartyId};

    #[test]
    fn test_checklist_links_order_and_party() {
        let order_id = OrderId::new();
        let party_id = PartyId::new();

        let checklist = SafetyChecklist::capture(
            order_id,
            party_id,
            true,
            Some("Dairy".to_string()),
            "Jess 0400 777 666",
            Some("Wheelchair access".to_string()),
            Utc::now(),
        );

        assert_eq!(checklist.order_id, order_id);
        assert_eq!(checklist.party_id, party_id);
        assert!(checklist.safety_acknowledged);
        assert_eq!(checklist.special_needs.as_deref(), Some("Wheelchair access"));
    }
}
