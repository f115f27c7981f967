use super::aggregator::{PendingSummary, summarize};
use super::coordinator::CaptureCoordinator;
use super::resolver::{CaptureFlow, resolve};
use crate::config::BillingConfig;
use crate::domain::balance::AppointmentBalance;
use crate::domain::capture::{CaptureKey, CaptureOutcome};
use crate::domain::payment::{NewPayment, PaymentRecord};
use crate::domain::ports::{BillingBackendRef, PaymentGatewayRef};
use crate::error::{BillingError, Result};
use tracing::info;

/// A gateway order created for an appointment, ready to be captured.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCapture {
    pub appointment: String,
    pub order_id: CaptureKey,
    pub flow: CaptureFlow,
}

/// Result of a completed capture after the backend has recorded it.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledCapture {
    pub outcome: CaptureOutcome,
    pub payment: PaymentRecord,
    /// Balance as re-read from the backend after recording the payment.
    pub balance: Option<AppointmentBalance>,
}

/// Drives an appointment from its balance to a recorded payment.
///
/// Order creation goes straight to the gateway; captures always go through the
/// shared [`CaptureCoordinator`].
pub struct BillingService {
    gateway: PaymentGatewayRef,
    backend: BillingBackendRef,
    coordinator: CaptureCoordinator,
    config: BillingConfig,
}

impl BillingService {
    /// Wires the service to its gateway, backend and shared coordinator.
    pub fn new(
        gateway: PaymentGatewayRef,
        backend: BillingBackendRef,
        coordinator: CaptureCoordinator,
        config: BillingConfig,
    ) -> Self {
        Self {
            gateway,
            backend,
            coordinator,
            config,
        }
    }

    /// The coordinator every capture from this service goes through.
    pub fn coordinator(&self) -> &CaptureCoordinator {
        &self.coordinator
    }

    /// Resolves the flow for `appointment` and creates the matching gateway order.
    ///
    /// Settled appointments, and flows that would charge more than the pending
    /// balance, are rejected before the gateway is contacted.
    pub async fn prepare(
        &self,
        appointment: &str,
        description: Option<&str>,
    ) -> Result<PreparedCapture> {
        let balance = self.backend.balance(appointment).await?;
        let flow = resolve(appointment, balance.as_ref(), description)?;

        if !flow.is_chargeable() {
            return Err(BillingError::ValidationError(format!(
                "Appointment {appointment} has nothing left to charge"
            )));
        }

        let pending = balance.as_ref().map(AppointmentBalance::pending);
        if pending.is_some_and(|pending| flow.amount() > pending) {
            return Err(BillingError::ValidationError(format!(
                "Charge of {} for appointment {appointment} exceeds pending balance of {}",
                flow.amount(),
                pending.unwrap_or_default()
            )));
        }

        let description = match &flow {
            CaptureFlow::FullCreation { description, .. } => description.clone(),
            CaptureFlow::AdvanceCompletion { .. } => {
                format!("Balance for appointment {appointment}")
            }
        };
        let order_id = self
            .gateway
            .create_order(flow.amount(), &description)
            .await?;
        let order_id = CaptureKey::new(order_id)?;

        info!(
            appointment,
            order_id = %order_id,
            flow = flow.name(),
            amount = %flow.amount(),
            "created gateway order"
        );

        Ok(PreparedCapture {
            appointment: appointment.to_string(),
            order_id,
            flow,
        })
    }

    /// Captures a prepared order and forwards the payment to the backend.
    pub async fn complete(&self, prepared: &PreparedCapture) -> Result<SettledCapture> {
        let key = prepared.order_id.as_str();
        let outcome = match self.config.wait_timeout {
            Some(wait) => self.coordinator.capture_with_timeout(key, wait).await?,
            None => self.coordinator.capture(key).await?,
        };
        let capture = outcome.clone().into_result()?;

        let payment = self
            .backend
            .record_payment(NewPayment {
                appointment: prepared.appointment.clone(),
                amount: prepared.flow.amount(),
                currency: self.config.currency.clone(),
                kind: prepared.flow.payment_kind(),
                order_id: prepared.order_id.clone(),
                capture,
            })
            .await?;
        let balance = self.backend.balance(&prepared.appointment).await?;

        info!(
            appointment = %prepared.appointment,
            order_id = %prepared.order_id,
            payment_id = %payment.id,
            settled = balance.as_ref().is_some_and(AppointmentBalance::is_settled),
            "payment recorded"
        );

        Ok(SettledCapture {
            outcome,
            payment,
            balance,
        })
    }

    /// Aggregates every appointment that still has something to pay.
    pub async fn pending_summary(&self) -> Result<PendingSummary> {
        let balances = self.backend.balances().await?;
        let pending = balances.iter().filter(|b| !b.is_settled());
        Ok(summarize(Some(pending)))
    }
}
