use crate::domain::table::RowTable;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// The six input reports of a calculation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Report {
    MasterFeeRates,
    Rewards,
    UnclaimedBalances,
    BalanceAdjustments,
    OperationsStatuses,
    DailyBalances,
}

impl Report {
    /// Fetch order of a run
    pub const ALL: [Report; 6] = [
        Report::MasterFeeRates,
        Report::Rewards,
        Report::UnclaimedBalances,
        Report::BalanceAdjustments,
        Report::OperationsStatuses,
        Report::DailyBalances,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Report::MasterFeeRates => "Master Fee Rates",
            Report::Rewards => "Delegation and Staking Rewards Activity Report",
            Report::UnclaimedBalances => "Unclaimed Balances Report",
            Report::BalanceAdjustments => "Balance Adjustments Report",
            Report::OperationsStatuses => "Client Operations Statuses Report",
            Report::DailyBalances => "Daily Balances Report",
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where report tables come from. Returned rows exclude header rows.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_table(&self, report: Report) -> Result<RowTable>;
}
