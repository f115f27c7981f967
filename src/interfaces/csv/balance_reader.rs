use crate::domain::balance::AppointmentBalance;
use crate::error::{BillingError, Result};
use std::io::Read;

/// Reads appointment balances from a CSV export.
///
/// Expected columns: `appointment,total,paid,advance_paid`. Whitespace is trimmed and
/// extra columns (such as a backend-supplied `pending`) are ignored.
pub struct BalanceReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> BalanceReader<R> {
    /// Wraps `source` in a trimming CSV reader with a header row.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes balances; a bad row yields an error and reading continues.
    pub fn balances(self) -> impl Iterator<Item = Result<AppointmentBalance>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(BillingError::from))
    }
}
