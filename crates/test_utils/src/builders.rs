//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. These builders allow tests to specify only the relevant fields
//! while using defaults for everything else; names and contact details are
//! generated, so repeated builds never collide on the customer email.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;

use core_kernel::{CustomerId, Money, OrderId, PartyId};
use domain_booking::BookingSubmission;
use domain_orders::{Order, OrderItem, OrderItemKind, OrderNumber, OrderStatus, Pricing};
use domain_party::{ChildInfo, ContactInfo, PartyDetails};

use crate::fixtures::{MoneyFixtures, TemporalFixtures};

/// Builder for booking submissions as the public site would send them
pub struct TestBookingSubmissionBuilder {
    package_id: Option<String>,
    activity_ids: Vec<String>,
    party_details: Option<PartyDetails>,
    child_info: Option<ChildInfo>,
    contact: Option<ContactInfo>,
    safety_acknowledged: bool,
}

impl Default for TestBookingSubmissionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBookingSubmissionBuilder {
    /// Creates a new builder with a complete, valid submission
    pub fn new() -> Self {
        Self {
            package_id: Some("pkg_superhero".to_string()),
            activity_ids: vec![],
            party_details: Some(PartyDetails {
                date: TemporalFixtures::party_date(),
                start_time: TemporalFixtures::party_start_time(),
                venue: "Main Hall".to_string(),
                guest_count: 12,
                special_requests: None,
            }),
            child_info: Some(ChildInfo {
                child_name: FirstName().fake(),
                child_age: 7,
                allergies: None,
                special_needs: None,
            }),
            contact: Some(ContactInfo {
                parent_name: Name().fake(),
                parent_email: SafeEmail().fake(),
                parent_phone: PhoneNumber().fake(),
                emergency_contact: format!("{} {}", Name().fake::<String>(), "0400 000 999"),
            }),
            safety_acknowledged: true,
        }
    }

    /// Sets the package selection
    pub fn with_package(mut self, id: impl Into<String>) -> Self {
        self.package_id = Some(id.into());
        self
    }

    /// Clears the package selection
    pub fn without_package(mut self) -> Self {
        self.package_id = None;
        self
    }

    /// Sets the activity selection
    pub fn with_activities(mut self, ids: Vec<&str>) -> Self {
        self.activity_ids = ids.into_iter().map(String::from).collect();
        self
    }

    /// Clears both package and activities
    pub fn without_selection(mut self) -> Self {
        self.package_id = None;
        self.activity_ids.clear();
        self
    }

    /// Sets the party date
    pub fn with_party_date(mut self, date: NaiveDate) -> Self {
        if let Some(details) = self.party_details.as_mut() {
            details.date = date;
        }
        self
    }

    /// Sets the party start time
    pub fn with_start_time(mut self, time: NaiveTime) -> Self {
        if let Some(details) = self.party_details.as_mut() {
            details.start_time = time;
        }
        self
    }

    /// Sets the guest count
    pub fn with_guest_count(mut self, count: u32) -> Self {
        if let Some(details) = self.party_details.as_mut() {
            details.guest_count = count;
        }
        self
    }

    /// Sets the parent email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        if let Some(contact) = self.contact.as_mut() {
            contact.parent_email = email.into();
        }
        self
    }

    /// Sets the parent name
    pub fn with_parent_name(mut self, name: impl Into<String>) -> Self {
        if let Some(contact) = self.contact.as_mut() {
            contact.parent_name = name.into();
        }
        self
    }

    /// Sets the child name
    pub fn with_child_name(mut self, name: impl Into<String>) -> Self {
        if let Some(child) = self.child_info.as_mut() {
            child.child_name = name.into();
        }
        self
    }

    /// Sets the child's allergies
    pub fn with_allergies(mut self, allergies: impl Into<String>) -> Self {
        if let Some(child) = self.child_info.as_mut() {
            child.allergies = Some(allergies.into());
        }
        self
    }

    /// Drops the scheduling section, making the submission incomplete
    pub fn without_party_details(mut self) -> Self {
        self.party_details = None;
        self
    }

    /// Drops the child section, making the submission incomplete
    pub fn without_child_info(mut self) -> Self {
        self.child_info = None;
        self
    }

    /// Drops the contact section, making the submission incomplete
    pub fn without_contact(mut self) -> Self {
        self.contact = None;
        self
    }

    /// Builds the submission
    pub fn build(self) -> BookingSubmission {
        BookingSubmission {
            package_id: self.package_id,
            activity_ids: self.activity_ids,
            party_details: self.party_details,
            child_info: self.child_info,
            contact: self.contact,
            safety_acknowledged: self.safety_acknowledged,
        }
    }
}

/// Builder for orders in a chosen lifecycle state
///
/// Walks the real state machine rather than assembling rows, so the
/// produced order carries the same pricing timestamps the reconciler
/// would have written.
pub struct TestOrderDataBuilder {
    customer_id: CustomerId,
    party_id: Option<PartyId>,
    total: Money,
    deposit_percent: u8,
    status: OrderStatus,
    payment_intent: Option<String>,
    now: DateTime<Utc>,
}

impl Default for TestOrderDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOrderDataBuilder {
    /// Creates a new builder for a `new` order on the standard package
    pub fn new() -> Self {
        Self {
            customer_id: CustomerId::new(),
            party_id: Some(PartyId::new()),
            total: MoneyFixtures::package_price(),
            deposit_percent: 30,
            status: OrderStatus::New,
            payment_intent: None,
            now: TemporalFixtures::booking_instant(),
        }
    }

    /// Sets the customer the order belongs to
    pub fn with_customer_id(mut self, id: CustomerId) -> Self {
        self.customer_id = id;
        self
    }

    /// Sets or clears the linked party
    pub fn with_party_id(mut self, id: Option<PartyId>) -> Self {
        self.party_id = id;
        self
    }

    /// Sets the order total
    pub fn with_total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    /// Sets the deposit percentage
    pub fn with_deposit_percent(mut self, percent: u8) -> Self {
        self.deposit_percent = percent;
        self
    }

    /// Sets the lifecycle state the built order should be in
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the gateway payment intent recorded on settlement
    pub fn with_payment_intent(mut self, intent: impl Into<String>) -> Self {
        self.payment_intent = Some(intent.into());
        self
    }

    /// Sets the creation instant
    pub fn with_created_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Builds the order, advancing it through the state machine
    pub fn build(self) -> Order {
        let items = vec![OrderItem {
            item_id: "pkg_superhero".to_string(),
            name: "Superhero Spectacular".to_string(),
            price: self.total,
            kind: OrderItemKind::Package,
        }];
        let pricing = Pricing::from_total(self.total, self.deposit_percent);
        let number = OrderNumber::generate(self.now, &mut rand::thread_rng());
        let mut order = Order::new(
            self.customer_id,
            self.party_id,
            number,
            items,
            pricing,
            self.now,
        );

        match self.status {
            OrderStatus::New => {}
            OrderStatus::Confirmed => {
                order
                    .confirm_deposit("cs_test_deposit", self.payment_intent.clone(), self.now)
                    .unwrap();
            }
            OrderStatus::Completed => {
                order
                    .confirm_deposit("cs_test_deposit", None, self.now)
                    .unwrap();
                order
                    .complete_payment("cs_test_balance", self.payment_intent.clone(), self.now)
                    .unwrap();
            }
            OrderStatus::Cancelled => {
                order.expire_checkout(self.now).unwrap();
            }
        }

        // Settled history, not fresh mutations
        let _ = order.take_events();
        order
    }
}
