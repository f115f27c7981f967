use crate::domain::balance::AppointmentBalance;
use crate::domain::money::Money;
use serde::Serialize;

/// Dashboard figures over appointments with outstanding balances.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PendingSummary {
    pub total: usize,
    pub with_advance: usize,
    pub without_advance: usize,
    pub total_pending: Money,
}

/// Summarizes `balances`; an absent collection yields an all-zero summary.
pub fn summarize<'a, I>(balances: Option<I>) -> PendingSummary
where
    I: IntoIterator<Item = &'a AppointmentBalance>,
{
    balances
        .into_iter()
        .flatten()
        .fold(PendingSummary::default(), |mut summary, balance| {
            summary.total += 1;
            if balance.advance_paid() {
                summary.with_advance += 1;
            } else {
                summary.without_advance += 1;
            }
            summary.total_pending += balance.pending();
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn balance(id: &str, total: Decimal, paid: Decimal, advance: bool) -> AppointmentBalance {
        AppointmentBalance::new(
            id,
            Money::new(total).unwrap(),
            Money::new(paid).unwrap(),
            advance,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_counts_and_totals() {
        let balances = vec![
            balance("apt-1", dec!(1000), dec!(500), true),
            balance("apt-2", dec!(400), dec!(400), true),
            balance("apt-3", dec!(300), dec!(0), false),
        ];

        let summary = summarize(Some(&balances));
        assert_eq!(
            summary,
            PendingSummary {
                total: 3,
                with_advance: 2,
                without_advance: 1,
                total_pending: Money::new(dec!(800)).unwrap(),
            }
        );
    }

    #[test]
    fn test_absent_collection_is_empty() {
        assert_eq!(
            summarize::<&Vec<AppointmentBalance>>(None),
            PendingSummary::default()
        );
        assert_eq!(summarize(Some(&Vec::new())), PendingSummary::default());
    }
}
