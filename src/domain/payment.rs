use super::capture::{CaptureKey, CapturePayload};
use super::money::Money;
use crate::error::BillingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Normal,
    Advance,
    Balance,
}

/// Lifecycle of a payment record on the backend.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Failed, Pending)
                | (Completed, Refunded)
        )
    }

    /// Returns the next status, or a validation error for a forbidden move.
    pub fn transition_to(self, next: PaymentStatus) -> Result<PaymentStatus, BillingError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BillingError::ValidationError(format!(
                "Payment cannot move from {self:?} to {next:?}"
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Cancelled | PaymentStatus::Refunded)
    }
}

/// Payment as persisted by the backend.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRecord {
    pub id: String,
    pub appointment: String,
    pub amount: Money,
    pub currency: String,
    pub kind: PaymentKind,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Applies a status change, refreshing `updated_at`.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<(), BillingError> {
        self.status = self.status.transition_to(next)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Creation request forwarded to the backend after a successful capture.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct NewPayment {
    pub appointment: String,
    pub amount: Money,
    pub currency: String,
    pub kind: PaymentKind,
    pub order_id: CaptureKey,
    pub capture: CapturePayload,
}
