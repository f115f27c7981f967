use crate::domain::balance::AppointmentBalance;
use crate::domain::money::Money;
use crate::domain::payment::PaymentKind;
use crate::error::{BillingError, Result};

/// Which capture flow applies to an appointment, and for how much.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureFlow {
    /// An advance was already paid; charge the remaining balance.
    AdvanceCompletion { amount: Money },
    /// Nothing was paid up front; charge the full amount as a new payment.
    FullCreation { amount: Money, description: String },
}

impl CaptureFlow {
    pub fn amount(&self) -> Money {
        match self {
            CaptureFlow::AdvanceCompletion { amount } => *amount,
            CaptureFlow::FullCreation { amount, .. } => *amount,
        }
    }

    /// A zero-amount flow is still routed, but must not reach the gateway.
    pub fn is_chargeable(&self) -> bool {
        !self.amount().is_zero()
    }

    pub fn payment_kind(&self) -> PaymentKind {
        match self {
            CaptureFlow::AdvanceCompletion { .. } => PaymentKind::Balance,
            CaptureFlow::FullCreation { .. } => PaymentKind::Normal,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaptureFlow::AdvanceCompletion { .. } => "advance_completion",
            CaptureFlow::FullCreation { .. } => "full_creation",
        }
    }
}

pub fn default_description(balance: &AppointmentBalance) -> String {
    format!("Payment for appointment {}", balance.appointment())
}

/// Picks the capture flow for a balance.
///
/// `appointment` only names the missing record in the `MissingBalance` error.
pub fn resolve(
    appointment: &str,
    balance: Option<&AppointmentBalance>,
    description: Option<&str>,
) -> Result<CaptureFlow> {
    let balance = balance.ok_or_else(|| BillingError::MissingBalance(appointment.to_string()))?;
    Ok(resolve_balance(balance, description))
}

/// Infallible core of [`resolve`] for callers already holding a balance.
pub fn resolve_balance(balance: &AppointmentBalance, description: Option<&str>) -> CaptureFlow {
    if balance.advance_paid() {
        CaptureFlow::AdvanceCompletion {
            amount: balance.pending(),
        }
    } else {
        CaptureFlow::FullCreation {
            amount: balance.total(),
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| default_description(balance)),
        }
    }
}
