//! Custody and staking fee calculator
//!
//! Computes one month of invoices from the six report exports (CSV) and
//! prints them as JSON.
//!
//! # Usage
//! ```sh
//! custody-fees --invoice-date 2023-01-31 --first-external-id 1000 \
//!     --master-fee-rates mfr.csv --rewards rewards.csv \
//!     --unclaimed-balances unclaimed.csv --balance-adjustments adjustments.csv \
//!     --operations-statuses statuses.csv --daily-balances daily.csv --pretty
//! ```
//!
//! # Environment Variables
//! - `CALC_TABLE_PATH`, `ASSET_TYPES_PATH` - Replace the embedded reference data
//! - `FEES_DEBUG` - Include the debug trail in the output (default: false)
//! - `MFR_HEADER_ROW`, `REWARDS_HEADER_ROW`, `REPORT_HEADER_ROW` - Leading rows to skip

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use custody_fees::application::FeeService;
use custody_fees::config::Config;
use custody_fees::domain::debug_log::{DebugLog, DebugMessage};
use custody_fees::domain::fees::{OrgResult, Warning};
use custody_fees::domain::ports::Report;
use custody_fees::domain::sanitize::parse_date;
use custody_fees::infrastructure::CsvTableSource;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Custody and staking fee calculator", long_about = None)]
struct Cli {
    /// Invoice date (YYYY-MM-DD or M/D/YYYY)
    #[arg(long, value_parser = parse_invoice_date)]
    invoice_date: NaiveDate,

    /// First external ID and invoice sequence number of the run
    #[arg(long, default_value = "1")]
    first_external_id: u64,

    /// Master Fee Rates export
    #[arg(long)]
    master_fee_rates: PathBuf,

    /// Delegation and Staking Rewards Activity export
    #[arg(long)]
    rewards: PathBuf,

    /// Unclaimed Balances export
    #[arg(long)]
    unclaimed_balances: Option<PathBuf>,

    /// Balance Adjustments export
    #[arg(long)]
    balance_adjustments: Option<PathBuf>,

    /// Client Operations Statuses export
    #[arg(long)]
    operations_statuses: Option<PathBuf>,

    /// Daily Balances export
    #[arg(long)]
    daily_balances: Option<PathBuf>,

    /// Include the debug trail in the output
    #[arg(long)]
    debug: bool,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Output {
    data: Vec<OrgResult>,
    warn: Vec<Warning>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    debug: Vec<DebugMessage>,
}

fn parse_invoice_date(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).ok_or_else(|| format!("'{}' is not a date", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    info!("Custody fees {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let reference = Arc::new(config.reference_data()?);

    let mut source = CsvTableSource::new(config.header_rows)
        .with_path(Report::MasterFeeRates, &cli.master_fee_rates)
        .with_path(Report::Rewards, &cli.rewards);
    let optional = [
        (Report::UnclaimedBalances, &cli.unclaimed_balances),
        (Report::BalanceAdjustments, &cli.balance_adjustments),
        (Report::OperationsStatuses, &cli.operations_statuses),
        (Report::DailyBalances, &cli.daily_balances),
    ];
    for (report, path) in optional {
        if let Some(path) = path {
            source = source.with_path(report, path);
        }
    }

    let debug = DebugLog::new(cli.debug || config.debug);
    let service = FeeService::new(Arc::new(source), reference);
    let run = service
        .calculate(cli.invoice_date, cli.first_external_id, debug)
        .await?;

    let output = Output {
        data: run.fees.summary,
        warn: run.fees.warnings,
        debug: run.debug,
    };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Invoices written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
