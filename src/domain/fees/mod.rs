//! Fee engine: staking and custody calculators plus the merge of their output.

pub mod custody;
pub mod invoice;
pub mod merge;
pub mod staking;
pub mod tiering;
pub mod types;

pub use custody::calculate_custody_fees;
pub use merge::{merge_accounts, merge_summaries};
pub use staking::calculate_staking_fees;
pub use types::{AccountResult, CalculatedFees, LineItem, OrgResult, Summary, Warning};

use crate::domain::databind::{
    BalanceAdjustments, DailyBalances, MasterFeeRates, OperationsStatuses, Rewards, UnclaimedBalances,
};
use crate::domain::debug_log::DebugLog;
use crate::domain::reference::ReferenceData;
use chrono::NaiveDate;
use std::sync::Arc;

/// The six databinds of one calculation run
#[derive(Debug, Clone, Default)]
pub struct FeeInputs {
    pub master_fee_rates: MasterFeeRates,
    pub rewards: Rewards,
    pub unclaimed_balances: UnclaimedBalances,
    pub balance_adjustments: BalanceAdjustments,
    pub operations_statuses: OperationsStatuses,
    pub daily_balances: DailyBalances,
}

/// Per-run parameters shared by both calculators
#[derive(Debug, Clone)]
pub struct RunContext {
    pub invoice_date: NaiveDate,
    /// Seed for external IDs and invoice sequence numbers
    pub first_external_id: u64,
    pub reference: Arc<ReferenceData>,
    pub debug: DebugLog,
}

impl RunContext {
    pub fn new(invoice_date: NaiveDate, first_external_id: u64, reference: Arc<ReferenceData>, debug: DebugLog) -> Self {
        Self {
            invoice_date,
            first_external_id,
            reference,
            debug,
        }
    }
}

/// What a single calculator produces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculatorReport {
    pub summary: Summary,
    pub warnings: Vec<Warning>,
}
