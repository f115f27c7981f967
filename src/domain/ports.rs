use super::balance::AppointmentBalance;
use super::capture::{CaptureKey, CapturePayload};
use super::money::Money;
use super::payment::{NewPayment, PaymentRecord};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order to be captured later and returns its identifier.
    async fn create_order(
        &self,
        amount: Money,
        description: &str,
    ) -> std::result::Result<String, GatewayError>;

    async fn capture_order(
        &self,
        order_id: &CaptureKey,
    ) -> std::result::Result<CapturePayload, GatewayError>;
}

/// Appointment and payment backend; the source of truth for balances.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    async fn balance(&self, appointment: &str) -> Result<Option<AppointmentBalance>>;
    async fn balances(&self) -> Result<Vec<AppointmentBalance>>;
    async fn record_payment(&self, payment: NewPayment) -> Result<PaymentRecord>;
}

pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type BillingBackendRef = Arc<dyn BillingBackend>;
