//! Payment gateway port
//!
//! The gateway collects money through hosted checkout sessions: the caller
//! creates a session for a specific payment purpose and redirects the
//! customer to its URL. Settlement never comes back on this interface; it
//! arrives asynchronously as signed webhook events (see [`crate::webhook`]).
//!
//! Implementations:
//!
//! - **Stripe adapter**: Checkout Sessions over the Stripe HTTP API
//!   (infra_gateway)
//! - **Mock adapter**: records requests in memory for testing

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, Money, OrderId, PortError};

use crate::error::BillingError;

/// Which installment a checkout session collects
///
/// The purpose travels to the gateway as session metadata and comes back
/// verbatim in webhook events, which is how settlements are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPurpose {
    /// The upfront deposit installment
    Deposit,
    /// The remaining balance
    FullPayment,
}

impl PaymentPurpose {
    /// Returns the metadata tag used on gateway sessions
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPurpose::Deposit => "deposit",
            PaymentPurpose::FullPayment => "full_payment",
        }
    }
}

impl fmt::Display for PaymentPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentPurpose {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(PaymentPurpose::Deposit),
            "full_payment" => Ok(PaymentPurpose::FullPayment),
            other => Err(BillingError::UnknownPaymentPurpose(other.to_string())),
        }
    }
}

/// Everything the gateway needs to open a checkout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    /// Order the payment belongs to; round-trips through session metadata
    pub order_id: OrderId,
    /// Human-facing order number, shown on the payment page
    pub order_number: String,
    /// Which installment this session collects
    pub purpose: PaymentPurpose,
    /// Amount to collect
    pub amount: Money,
    /// Email the gateway pre-fills and sends its receipt to
    pub customer_email: String,
    /// Line description shown on the payment page
    pub description: String,
}

/// A hosted checkout session created by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Gateway session identifier, e.g. `cs_...`
    pub id: String,
    /// URL the customer is redirected to
    pub url: String,
}

/// Port for the external payment gateway
#[async_trait]
pub trait PaymentGateway: DomainPort + HealthCheckable {
    /// Opens a hosted checkout session for one installment
    ///
    /// # Arguments
    ///
    /// * `request` - Amount, purpose, and correlation metadata
    ///
    /// # Errors
    ///
    /// Returns a transient `PortError` when the gateway is unreachable or
    /// times out, `Validation` when it rejects the request
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PortError>;
}

/// Mock implementation of PaymentGateway for testing
///
/// Records every session request and can be scripted to fail, so services
/// can be tested without a gateway account.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// In-memory mock implementation of PaymentGateway
    #[derive(Debug, Default)]
    pub struct MockPaymentGateway {
        requests: Arc<RwLock<Vec<CheckoutSessionRequest>>>,
        fail_with: Arc<RwLock<Option<PortError>>>,
    }

    impl MockPaymentGateway {
        /// Creates a new mock gateway
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next call fail with the given error
        pub async fn fail_with(&self, error: PortError) {
            *self.fail_with.write().await = Some(error);
        }

        /// Returns the session requests seen so far
        pub async fn requests(&self) -> Vec<CheckoutSessionRequest> {
            self.requests.read().await.clone()
        }
    }

    impl DomainPort for MockPaymentGateway {}

    #[async_trait]
    impl HealthCheckable for MockPaymentGateway {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-payment-gateway".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: chrono::Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockPaymentGateway {
        async fn create_checkout_session(
            &self,
            request: CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PortError> {
            if let Some(error) = self.fail_with.write().await.take() {
                return Err(error);
            }

            let mut requests = self.requests.write().await;
            requests.push(request);
            let id = format!("cs_test_{}", requests.len());
            Ok(CheckoutSession {
                url: format!("https://checkout.mock.local/pay/{id}"),
                id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPaymentGateway;
    use super::*;
    use core_kernel::{Currency, Money};

    fn deposit_request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            order_id: OrderId::new(),
            order_number: "PP2507-K4T9ZA".to_string(),
            purpose: PaymentPurpose::Deposit,
            amount: Money::from_minor(135_000, Currency::AUD),
            customer_email: "jane@example.com".to_string(),
            description: "Deposit for order PP2507-K4T9ZA".to_string(),
        }
    }

    #[test]
    fn test_purpose_round_trips_through_metadata_tag() {
        for purpose in [PaymentPurpose::Deposit, PaymentPurpose::FullPayment] {
            assert_eq!(purpose.as_str().parse::<PaymentPurpose>().unwrap(), purpose);
        }
        assert!("instalment".parse::<PaymentPurpose>().is_err());
    }

    #[tokio::test]
    async fn test_mock_gateway_records_requests() {
        let gateway = MockPaymentGateway::new();

        let session = gateway
            .create_checkout_session(deposit_request())
            .await
            .unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert!(session.url.contains(&session.id));
        let requests = gateway.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].purpose, PaymentPurpose::Deposit);
    }

    #[tokio::test]
    async fn test_mock_gateway_can_be_scripted_to_fail() {
        let gateway = MockPaymentGateway::new();
        gateway
            .fail_with(PortError::ServiceUnavailable {
                service: "payment-gateway".to_string(),
            })
            .await;

        let result = gateway.create_checkout_session(deposit_request()).await;

        assert!(matches!(result, Err(PortError::ServiceUnavailable { .. })));
        assert!(gateway.requests().await.is_empty());
    }
}
