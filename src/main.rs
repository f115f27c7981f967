use billing_capture::application::aggregator::summarize;
use billing_capture::application::resolver::resolve_balance;
use billing_capture::domain::balance::AppointmentBalance;
use billing_capture::interfaces::csv::balance_reader::BalanceReader;
use billing_capture::interfaces::csv::report_writer::ReportWriter;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print pending-balance statistics for a balances CSV file
    Summary {
        /// Input balances CSV file
        input: PathBuf,
    },
    /// Print the capture flow each appointment resolves to
    Plan {
        /// Input balances CSV file
        input: PathBuf,
        /// Description used for full-payment orders
        #[arg(long)]
        description: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());

    match cli.command {
        Command::Summary { input } => {
            let balances = read_balances(&input)?;
            let pending = balances.iter().filter(|b| !b.is_settled());
            writer.write_summary(&summarize(Some(pending))).into_diagnostic()?;
        }
        Command::Plan { input, description } => {
            let balances = read_balances(&input)?;
            let plan = balances
                .iter()
                .map(|b| (b, resolve_balance(b, description.as_deref())));
            writer.write_plan(plan).into_diagnostic()?;
        }
    }

    Ok(())
}

fn read_balances(path: &Path) -> Result<Vec<AppointmentBalance>> {
    let file = File::open(path).into_diagnostic()?;
    let mut balances = Vec::new();
    for result in BalanceReader::new(file).balances() {
        match result {
            Ok(balance) => balances.push(balance),
            Err(e) => eprintln!("Error reading balance: {}", e),
        }
    }
    debug!(path = %path.display(), count = balances.len(), "loaded balances");
    Ok(balances)
}
