//! Fee calculation runs.
//!
//! Tables are fetched one after another, bound, and then handed to the
//! staking and custody calculators, which run side by side on the blocking
//! pool. Their reports land in a shared accumulator and are merged once both
//! have finished.

use crate::domain::databind::{
    BalanceAdjustments, DailyBalances, MasterFeeRates, OperationsStatuses, Rewards, UnclaimedBalances,
};
use crate::domain::debug_log::{DebugLog, DebugMessage};
use crate::domain::errors::{CalculationError, DatabindError};
use crate::domain::fees::{
    CalculatedFees, CalculatorReport, FeeInputs, RunContext, calculate_custody_fees, calculate_staking_fees,
    merge_summaries,
};
use crate::domain::ports::{Report, TableSource};
use crate::domain::reference::ReferenceData;
use crate::domain::table::RowTable;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

const FAILURE_SEPARATOR: &str = " | ";

#[derive(Debug, Default)]
struct Accumulator {
    staking: Option<Result<CalculatorReport, CalculationError>>,
    custody: Option<Result<CalculatorReport, CalculationError>>,
}

/// Runs both calculators concurrently and merges their output.
///
/// If either calculator fails, or its task panics, the run fails with every
/// failure joined into one error; no partial result is returned.
pub async fn calculate_fees(inputs: Arc<FeeInputs>, ctx: RunContext) -> Result<CalculatedFees, CalculationError> {
    let accumulator = Arc::new(Mutex::new(Accumulator::default()));

    let staking = {
        let (inputs, ctx, accumulator) = (inputs.clone(), ctx.clone(), accumulator.clone());
        tokio::task::spawn_blocking(move || {
            let report = calculate_staking_fees(&inputs, &ctx);
            accumulator.blocking_lock().staking = Some(report);
        })
    };
    let custody = {
        let (inputs, ctx, accumulator) = (inputs.clone(), ctx.clone(), accumulator.clone());
        tokio::task::spawn_blocking(move || {
            let report = calculate_custody_fees(&inputs, &ctx);
            accumulator.blocking_lock().custody = Some(report);
        })
    };

    let staking_joined = join_calculator(staking, "staking").await;
    let custody_joined = join_calculator(custody, "custody").await;

    let mut acc = accumulator.lock().await;
    let staking = settle(acc.staking.take(), staking_joined, CalculationError::Staking);
    let custody = settle(acc.custody.take(), custody_joined, CalculationError::Custody);

    match (staking, custody) {
        (Ok(staking), Ok(custody)) => {
            let mut warnings = staking.warnings;
            warnings.extend(custody.warnings);
            Ok(CalculatedFees {
                summary: merge_summaries(staking.summary, custody.summary),
                warnings,
            })
        }
        (staking, custody) => {
            let failures: Vec<String> = [staking.err(), custody.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect();
            let combined = failures.join(FAILURE_SEPARATOR);
            error!("Fee calculation failed: {}", combined);
            Err(CalculationError::Combined(combined))
        }
    }
}

async fn join_calculator(handle: JoinHandle<()>, name: &str) -> Result<(), String> {
    handle.await.map_err(|e| {
        error!("{} calculator task failed: {}", name, e);
        format!("calculator task failed: {}", e)
    })
}

/// Resolves one calculator's outcome from what it stored and how its task ended.
fn settle(
    stored: Option<Result<CalculatorReport, CalculationError>>,
    joined: Result<(), String>,
    fail: fn(String) -> CalculationError,
) -> Result<CalculatorReport, CalculationError> {
    match (stored, joined) {
        (_, Err(e)) => Err(fail(e)),
        (Some(result), Ok(())) => result,
        (None, Ok(())) => Err(fail("calculator produced no result".to_string())),
    }
}

/// Outcome of `FeeService::calculate`
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeeRun {
    pub fees: CalculatedFees,
    /// Buffered debug trail; empty unless the run had debugging enabled
    pub debug: Vec<DebugMessage>,
}

/// End-to-end fee calculation over a table source.
#[derive(Clone)]
pub struct FeeService {
    source: Arc<dyn TableSource>,
    reference: Arc<ReferenceData>,
}

impl FeeService {
    pub fn new(source: Arc<dyn TableSource>, reference: Arc<ReferenceData>) -> Self {
        Self { source, reference }
    }

    pub async fn calculate(&self, invoice_date: NaiveDate, first_external_id: u64, debug: DebugLog) -> Result<FeeRun> {
        let tables = self.fetch_tables(&debug).await?;
        let inputs = bind_tables(tables)?;

        let ctx = RunContext::new(invoice_date, first_external_id, self.reference.clone(), debug.clone());
        let fees = calculate_fees(Arc::new(inputs), ctx).await?;

        info!(
            "Fees calculated for {} organizations with {} warnings",
            fees.summary.len(),
            fees.warnings.len()
        );
        Ok(FeeRun {
            fees,
            debug: debug.messages(),
        })
    }

    async fn fetch_tables(&self, debug: &DebugLog) -> Result<HashMap<Report, RowTable>> {
        let mut tables = HashMap::new();
        for report in Report::ALL {
            debug.record(format!("Start parse \"{}\" file.", report));
            let table = self
                .source
                .fetch_table(report)
                .await
                .with_context(|| format!("Failed to fetch {}", report))?;
            debug.record(format!("End parse \"{}\" file. {} rows", report, table.len()));
            tables.insert(report, table);
        }
        Ok(tables)
    }
}

/// Binds fetched tables into the calculator inputs. An empty fee schedule or
/// rewards table ends the run.
pub fn bind_tables(mut tables: HashMap<Report, RowTable>) -> Result<FeeInputs> {
    let mut take = |report: Report| tables.remove(&report).unwrap_or_default();

    let master_fee_rates =
        MasterFeeRates::from_rows(&take(Report::MasterFeeRates)).context("Failed to bind Master Fee Rates")?;
    if master_fee_rates.is_empty() {
        return Err(DatabindError::empty_table(Report::MasterFeeRates).into());
    }

    let rewards = Rewards::from_rows(&take(Report::Rewards));
    if rewards.is_empty() {
        return Err(DatabindError::empty_table(Report::Rewards).into());
    }

    Ok(FeeInputs {
        master_fee_rates,
        rewards,
        unclaimed_balances: UnclaimedBalances::from_rows(&take(Report::UnclaimedBalances)),
        balance_adjustments: BalanceAdjustments::from_rows(&take(Report::BalanceAdjustments)),
        operations_statuses: OperationsStatuses::from_rows(&take(Report::OperationsStatuses)),
        daily_balances: DailyBalances::from_rows(&take(Report::DailyBalances)),
    })
}
