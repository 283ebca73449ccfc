//! Typed indices built from raw row tables.
//!
//! Each binder reads a fixed column layout, skips rows missing a required
//! field and keys organizations and accounts by sanitized names so the
//! reports join even when punctuation differs between exports.

pub mod balance_adjustments;
pub mod daily_balances;
pub mod master_fee_rates;
pub mod operations_statuses;
pub mod rewards;
pub mod unclaimed_balances;

pub use balance_adjustments::BalanceAdjustments;
pub use daily_balances::DailyBalances;
pub use master_fee_rates::MasterFeeRates;
pub use operations_statuses::OperationsStatuses;
pub use rewards::Rewards;
pub use unclaimed_balances::UnclaimedBalances;
