use super::money::Money;
use crate::error::BillingError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw balance row as the backend (or a CSV export) provides it.
///
/// Any `pending` figure the backend sends is ignored; it is always derived locally.
#[derive(Debug, Deserialize)]
struct BalanceRow {
    appointment: String,
    total: Money,
    paid: Money,
    advance_paid: bool,
}

/// Payment state of a single appointment.
///
/// `pending` is always `total - paid` and never negative. A balance is read from the
/// backend and replaced wholesale after every capture; it is not mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BalanceRow")]
pub struct AppointmentBalance {
    appointment: String,
    total: Money,
    paid: Money,
    pending: Money,
    advance_paid: bool,
    percentage_paid: Decimal,
}

impl AppointmentBalance {
    pub fn new(
        appointment: impl Into<String>,
        total: Money,
        paid: Money,
        advance_paid: bool,
    ) -> Result<Self, BillingError> {
        let appointment = appointment.into();
        let pending = total.checked_sub(paid).map_err(|_| {
            BillingError::ValidationError(format!(
                "Appointment {appointment}: paid {paid} exceeds total {total}"
            ))
        })?;

        let percentage_paid = if total.is_zero() {
            Decimal::ZERO
        } else {
            (paid.value() / total.value() * Decimal::ONE_HUNDRED).round_dp(2)
        };

        Ok(Self {
            appointment,
            total,
            paid,
            pending,
            advance_paid,
            percentage_paid,
        })
    }

    pub fn appointment(&self) -> &str {
        &self.appointment
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn paid(&self) -> Money {
        self.paid
    }

    pub fn pending(&self) -> Money {
        self.pending
    }

    pub fn advance_paid(&self) -> bool {
        self.advance_paid
    }

    pub fn percentage_paid(&self) -> Decimal {
        self.percentage_paid
    }

    /// True once nothing remains to be charged.
    pub fn is_settled(&self) -> bool {
        self.pending.is_zero()
    }
}

impl TryFrom<BalanceRow> for AppointmentBalance {
    type Error = BillingError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        Self::new(row.appointment, row.total, row.paid, row.advance_paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(d: Decimal) -> Money {
        Money::new(d).unwrap()
    }

    #[test]
    fn test_pending_is_derived() {
        let balance =
            AppointmentBalance::new("apt-1", money(dec!(1000)), money(dec!(500)), true).unwrap();
        assert_eq!(balance.pending(), money(dec!(500)));
        assert_eq!(balance.percentage_paid(), dec!(50));
        assert!(!balance.is_settled());
    }

    #[test]
    fn test_overpaid_balance_is_rejected() {
        let result = AppointmentBalance::new("apt-1", money(dec!(100)), money(dec!(150)), true);
        assert!(matches!(result, Err(BillingError::ValidationError(_))));
    }

    #[test]
    fn test_zero_total_balance() {
        let balance =
            AppointmentBalance::new("apt-0", Money::ZERO, Money::ZERO, false).unwrap();
        assert_eq!(balance.percentage_paid(), Decimal::ZERO);
        assert!(balance.is_settled());
    }

    #[test]
    fn test_percentage_is_rounded() {
        let balance =
            AppointmentBalance::new("apt-3", money(dec!(300)), money(dec!(100)), true).unwrap();
        assert_eq!(balance.percentage_paid(), dec!(33.33));
    }

    #[test]
    fn test_deserialize_ignores_backend_pending() {
        let json = r#"{"appointment":"apt-9","total":"800","paid":"200","pending":"1","advance_paid":true}"#;
        let balance: AppointmentBalance = serde_json::from_str(json).unwrap();
        assert_eq!(balance.pending(), money(dec!(600)));
    }

    #[test]
    fn test_deserialize_rejects_overpayment() {
        let json = r#"{"appointment":"apt-9","total":"100","paid":"200","advance_paid":true}"#;
        assert!(serde_json::from_str::<AppointmentBalance>(json).is_err());
    }
}
