//! Payment session initiation
//!
//! Builds gateway checkout sessions for the two installments. Nothing here
//! mutates an order; settlement happens when the gateway's webhook comes
//! back through the reconciler.

use std::sync::Arc;

use tracing::instrument;

use core_kernel::{OrderId, DEFAULT_DEPOSIT_PERCENT};
use domain_billing::{CheckoutSession, CheckoutSessionRequest, PaymentGateway, PaymentPurpose};
use domain_orders::OrderStatus;

use crate::error::BookingError;
use crate::ports::BookingStore;

/// Service for starting gateway checkout sessions
pub struct CheckoutService {
    store: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CheckoutService {
    /// Creates a new checkout service
    pub fn new(store: Arc<dyn BookingStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Starts a checkout session for the deposit
    ///
    /// The order must still be `new`. The amount is the deposit cached at
    /// intake, recomputed at the default percentage if that cache is zero.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order and `InvalidState` when the
    /// order has moved past `new`
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn start_deposit(&self, order_id: OrderId) -> Result<CheckoutSession, BookingError> {
        let order = self.store.get_order(order_id).await?;
        if order.status() != OrderStatus::New {
            return Err(BookingError::InvalidState(format!(
                "Deposit checkout requires a new order, found {}",
                order.status()
            )));
        }
        let customer = self.store.get_customer(order.customer_id()).await?;

        let pricing = order.pricing();
        let amount = if pricing.deposit.is_zero() {
            pricing.total.deposit(DEFAULT_DEPOSIT_PERCENT)
        } else {
            pricing.deposit
        };

        let request = CheckoutSessionRequest {
            order_id: order.id(),
            order_number: order.order_number().to_string(),
            purpose: PaymentPurpose::Deposit,
            amount,
            customer_email: customer.email,
            description: format!("Deposit for order {}", order.order_number()),
        };
        Ok(self.gateway.create_checkout_session(request).await?)
    }

    /// Starts a checkout session for the remaining balance
    ///
    /// The order must be `confirmed` with the deposit already settled.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order and `InvalidState` when the
    /// order is not confirmed or the deposit is still outstanding
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn start_full_payment(
        &self,
        order_id: OrderId,
    ) -> Result<CheckoutSession, BookingError> {
        let order = self.store.get_order(order_id).await?;
        if order.status() != OrderStatus::Confirmed {
            return Err(BookingError::InvalidState(format!(
                "Balance checkout requires a confirmed order, found {}",
                order.status()
            )));
        }
        if order.pricing().deposit_paid_at.is_none() {
            return Err(BookingError::InvalidState(
                "Balance checkout requires the deposit to be paid".to_string(),
            ));
        }
        let customer = self.store.get_customer(order.customer_id()).await?;
        let amount = order.pricing().balance_due()?;

        let request = CheckoutSessionRequest {
            order_id: order.id(),
            order_number: order.order_number().to_string(),
            purpose: PaymentPurpose::FullPayment,
            amount,
            customer_email: customer.email,
            description: format!("Balance for order {}", order.order_number()),
        };
        Ok(self.gateway.create_checkout_session(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
    use core_kernel::{Currency, CustomerId, Money, PortError};
    use domain_billing::MockPaymentGateway;
    use domain_orders::{Order, OrderItem, OrderNumber, Package, Pricing};
    use domain_party::Customer;

    use crate::memory::MemoryBookingStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 14, 10, 30, 0).unwrap()
    }

    fn aud(minor: i64) -> Money {
        Money::from_minor(minor, Currency::AUD)
    }

    fn order_with_pricing(customer_id: CustomerId, pricing: Pricing) -> Order {
        let package = Package {
            id: "pkg_superhero".to_string(),
            name: "Superhero Spectacular".to_string(),
            price: pricing.total,
        };
        let number: OrderNumber = "PP2507-K4T9ZA".parse().unwrap();
        Order::new(
            customer_id,
            None,
            number,
            vec![OrderItem::from(&package)],
            pricing,
            now(),
        )
    }

    async fn seeded(pricing: Pricing) -> (MemoryBookingStore, Order) {
        let store = MemoryBookingStore::new();
        let customer = Customer::new("kim@example.com", "Kim", "0400", Currency::AUD, now());
        let order = order_with_pricing(customer.id, pricing);
        store.insert_customer(customer).await;
        store.insert_order(order.clone()).await;
        (store, order)
    }

    fn service(store: MemoryBookingStore) -> (CheckoutService, Arc<MockPaymentGateway>) {
        let gateway = Arc::new(MockPaymentGateway::new());
        let service = CheckoutService::new(Arc::new(store), gateway.clone());
        (service, gateway)
    }

    #[tokio::test]
    async fn test_deposit_session_uses_cached_deposit() {
        let (store, order) = seeded(Pricing::from_total(aud(450_000), 30)).await;
        let (service, gateway) = service(store);

        let session = service.start_deposit(order.id()).await.unwrap();

        assert!(session.url.contains(&session.id));
        let requests = gateway.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, aud(135_000));
        assert_eq!(requests[0].purpose, PaymentPurpose::Deposit);
        assert_eq!(requests[0].customer_email, "kim@example.com");
        assert_eq!(requests[0].description, "Deposit for order PP2507-K4T9ZA");
    }

    #[tokio::test]
    async fn test_zero_cached_deposit_is_recomputed() {
        let (store, order) = seeded(Pricing::from_total(aud(450_000), 0)).await;
        let (service, gateway) = service(store);

        service.start_deposit(order.id()).await.unwrap();

        assert_eq!(gateway.requests().await[0].amount, aud(135_000));
    }

    #[tokio::test]
    async fn test_deposit_rejected_once_order_confirmed() {
        let (store, mut order) = seeded(Pricing::from_total(aud(450_000), 30)).await;
        order
            .confirm_deposit("cs_1", Some("pi_1".to_string()), now())
            .unwrap();
        store.insert_order(order.clone()).await;
        let (service, gateway) = service(store);

        let err = service.start_deposit(order.id()).await.unwrap_err();

        assert_eq!(
            err,
            BookingError::InvalidState(
                "Deposit checkout requires a new order, found confirmed".to_string()
            )
        );
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let (service, _) = service(MemoryBookingStore::new());

        let err = service.start_deposit(OrderId::new()).await.unwrap_err();

        assert!(matches!(err, BookingError::NotFound { ref entity, .. } if entity == "Order"));
    }

    #[tokio::test]
    async fn test_balance_session_charges_remaining_amount() {
        let (store, mut order) = seeded(Pricing::from_total(aud(450_000), 30)).await;
        order
            .confirm_deposit("cs_1", Some("pi_1".to_string()), now())
            .unwrap();
        store.insert_order(order.clone()).await;
        let (service, gateway) = service(store);

        service.start_full_payment(order.id()).await.unwrap();

        let requests = gateway.requests().await;
        assert_eq!(requests[0].amount, aud(315_000));
        assert_eq!(requests[0].purpose, PaymentPurpose::FullPayment);
        assert_eq!(requests[0].description, "Balance for order PP2507-K4T9ZA");
    }

    #[tokio::test]
    async fn test_balance_rejected_while_order_new() {
        let (store, order) = seeded(Pricing::from_total(aud(450_000), 30)).await;
        let (service, _) = service(store);

        let err = service.start_full_payment(order.id()).await.unwrap_err();

        assert_eq!(
            err,
            BookingError::InvalidState(
                "Balance checkout requires a confirmed order, found new".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_gateway_outage_maps_to_transient() {
        let (store, order) = seeded(Pricing::from_total(aud(450_000), 30)).await;
        let (service, gateway) = service(store);
        gateway
            .fail_with(PortError::ServiceUnavailable {
                service: "stripe".to_string(),
            })
            .await;

        let err = service.start_deposit(order.id()).await.unwrap_err();

        assert!(matches!(err, BookingError::Transient(_)));
    }
}
