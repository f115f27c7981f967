use crate::domain::balance::AppointmentBalance;
use crate::domain::capture::CaptureKey;
use crate::domain::payment::{NewPayment, PaymentKind, PaymentRecord, PaymentStatus};
use crate::domain::ports::BillingBackend;
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct BackendState {
    balances: HashMap<String, AppointmentBalance>,
    payments: Vec<PaymentRecord>,
    /// Order id → index into `payments`, so a capture is recorded once.
    by_order: HashMap<CaptureKey, usize>,
}

/// A thread-safe in-memory stand-in for the appointment/payment backend.
///
/// Uses `Arc<RwLock<..>>` so clones share state. Recording a payment is idempotent
/// per gateway order id.
#[derive(Default, Clone)]
pub struct InMemoryBillingBackend {
    state: Arc<RwLock<BackendState>>,
}

impl InMemoryBillingBackend {
    /// Creates a new, empty in-memory billing backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend seeded with `balances`, keyed by appointment id.
    pub fn with_balances(balances: impl IntoIterator<Item = AppointmentBalance>) -> Self {
        let state = BackendState {
            balances: balances
                .into_iter()
                .map(|b| (b.appointment().to_string(), b))
                .collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Inserts or replaces the balance for its appointment.
    pub async fn upsert_balance(&self, balance: AppointmentBalance) {
        let mut state = self.state.write().await;
        state
            .balances
            .insert(balance.appointment().to_string(), balance);
    }

    /// Every payment recorded so far, in recording order.
    pub async fn payments(&self) -> Vec<PaymentRecord> {
        self.state.read().await.payments.clone()
    }
}

#[async_trait]
impl BillingBackend for InMemoryBillingBackend {
    async fn balance(&self, appointment: &str) -> Result<Option<AppointmentBalance>> {
        let state = self.state.read().await;
        Ok(state.balances.get(appointment).cloned())
    }

    async fn balances(&self) -> Result<Vec<AppointmentBalance>> {
        let state = self.state.read().await;
        let mut balances: Vec<_> = state.balances.values().cloned().collect();
        balances.sort_by(|a, b| a.appointment().cmp(b.appointment()));
        Ok(balances)
    }

    async fn record_payment(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let mut state = self.state.write().await;

        if let Some(&index) = state.by_order.get(&payment.order_id) {
            return Ok(state.payments[index].clone());
        }

        let current = state
            .balances
            .get(&payment.appointment)
            .cloned()
            .ok_or_else(|| BillingError::MissingBalance(payment.appointment.clone()))?;

        let updated = AppointmentBalance::new(
            current.appointment(),
            current.total(),
            current.paid() + payment.amount,
            current.advance_paid() || payment.kind == PaymentKind::Advance,
        )?;

        let now = Utc::now();
        let mut record = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            appointment: payment.appointment.clone(),
            amount: payment.amount,
            currency: payment.currency,
            kind: payment.kind,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        record.transition(PaymentStatus::Completed)?;

        state.balances.insert(payment.appointment, updated);
        state.payments.push(record.clone());
        let index = state.payments.len() - 1;
        state.by_order.insert(payment.order_id, index);

        Ok(record)
    }
}
