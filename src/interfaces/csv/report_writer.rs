use crate::application::aggregator::PendingSummary;
use crate::application::resolver::CaptureFlow;
use crate::domain::balance::AppointmentBalance;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PlanRow<'a> {
    appointment: &'a str,
    flow: &'static str,
    amount: String,
    chargeable: bool,
}

#[derive(Serialize)]
struct SummaryRow {
    total: usize,
    with_advance: usize,
    without_advance: usize,
    total_pending: String,
}

/// Writes billing reports as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    /// Creates a writer that emits CSV rows to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the summary as a single row under a header.
    pub fn write_summary(&mut self, summary: &PendingSummary) -> Result<()> {
        self.writer.serialize(SummaryRow {
            total: summary.total,
            with_advance: summary.with_advance,
            without_advance: summary.without_advance,
            total_pending: summary.total_pending.to_string(),
        })?;
        self.writer.flush()?;
        Ok(())
    }

    /// One row per appointment with the flow the resolver picked for it.
    pub fn write_plan<'a>(
        &mut self,
        plan: impl IntoIterator<Item = (&'a AppointmentBalance, CaptureFlow)>,
    ) -> Result<()> {
        for (balance, flow) in plan {
            self.writer.serialize(PlanRow {
                appointment: balance.appointment(),
                flow: flow.name(),
                amount: flow.amount().to_string(),
                chargeable: flow.is_chargeable(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
