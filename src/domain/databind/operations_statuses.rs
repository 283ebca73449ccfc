//! Validator / delegation status snapshots per account.
//!
//! Used to detect delegations to 100%-commission validators, which are billed
//! on the delegated balance instead of on rewards.

use crate::domain::sanitize::{parse_date, parse_decimal, sanitize_name};
use crate::domain::table::{Column, RowTable, cell, has_blank_field};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

pub const COL_ACCOUNT_NAME: Column = 0;
/// Active delegated value in USD
pub const COL_ACTIVE_DELEGATED_VALUE: Column = 2;
pub const COL_ASSET_TYPE: Column = 5;
pub const COL_DATE: Column = 7;
pub const COL_VALIDATOR_RATE: Column = 24;

pub const ROW_WIDTH: usize = 25;

/// Assets whose validators may charge 100% commission
pub const COSMOS_ASSETS: &[&str] = &["OSMO", "HASH", "ATOM", "AXL", "EVMOS", "SEI", "SUI"];

const FULL_RATE_LABELS: &[&str] = &["100.00%", "100%", "1"];

#[derive(Debug, Clone, Default)]
pub struct OperationsStatuses {
    accounts: BTreeMap<String, Vec<Status>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub asset: String,
    pub date: NaiveDate,
    pub active_delegated_value: Decimal,
    /// Validator commission rate as exported, e.g. "100.00%"
    pub validator_rate: String,
}

impl Status {
    /// True for a cosmos-style asset delegated to a validator keeping 100% commission.
    pub fn is_from_external_validator(&self) -> bool {
        let asset = self.asset.to_uppercase();
        COSMOS_ASSETS.contains(&asset.as_str()) && FULL_RATE_LABELS.contains(&self.validator_rate.as_str())
    }
}

impl OperationsStatuses {
    pub fn from_rows(table: &RowTable) -> Self {
        let mut accounts: BTreeMap<String, Vec<Status>> = BTreeMap::new();

        for row in table {
            if has_blank_field(row, &[COL_ACCOUNT_NAME, COL_ASSET_TYPE, COL_DATE]) {
                continue;
            }
            let Some(date) = parse_date(cell(row, COL_DATE)) else {
                continue;
            };

            accounts
                .entry(sanitize_name(cell(row, COL_ACCOUNT_NAME)))
                .or_default()
                .push(Status {
                    asset: cell(row, COL_ASSET_TYPE).trim().to_string(),
                    date,
                    active_delegated_value: parse_decimal(cell(row, COL_ACTIVE_DELEGATED_VALUE)),
                    validator_rate: cell(row, COL_VALIDATOR_RATE).trim().to_string(),
                });
        }

        debug!("Operations Statuses bound {} accounts", accounts.len());
        Self { accounts }
    }

    pub fn statuses(&self, account: &str) -> &[Status] {
        self.accounts.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First status row for (account, asset) on the given day.
    pub fn status_by_asset_and_date(&self, account: &str, asset: &str, date: NaiveDate) -> Option<&Status> {
        self.statuses(account)
            .iter()
            .find(|s| s.asset == asset && s.date == date)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Convenience over an optional lookup result.
pub fn is_asset_from_external_validator(status: Option<&Status>) -> bool {
    status.is_some_and(Status::is_from_external_validator)
}


#[cfg(test)]
mod tests {
    use super::fixtures::status_row;
    use super::*;
    use rust_decimal_macros::dec;

    fn status(asset: &str, rate: &str) -> Status {
        Status {
            asset: asset.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            active_delegated_value: dec!(1000),
            validator_rate: rate.to_string(),
        }
    }

    #[test]
    fn test_is_asset_from_external_validator() {
        for asset in ["OSMO", "hash", "Atom", "AXL", "EVMOS", "SEI", "SUI"] {
            for rate in ["100.00%", "100%", "1"] {
                assert!(status(asset, rate).is_from_external_validator(), "{asset} {rate}");
            }
        }

        assert!(!status("OSMO", "5.00%").is_from_external_validator());
        assert!(!status("OSMO", "100.0%").is_from_external_validator());
        assert!(!status("ETH", "100%").is_from_external_validator());
        assert!(!is_asset_from_external_validator(None));
    }

    #[test]
    fn test_status_by_asset_and_date() {
        let statuses = OperationsStatuses::from_rows(&vec![
            status_row("ES Capital Fund", "ATOM", "2023-01-30", "$1,000.00", "100%"),
            status_row("ES Capital Fund", "ATOM", "2023-01-31T00:00:00Z", "$3,100.00", "100%"),
            status_row("ES Capital Fund", "OSMO", "2023-01-31", "500", "5%"),
        ]);

        let day = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        let found = statuses.status_by_asset_and_date("ESCapitalFund", "ATOM", day).unwrap();
        assert_eq!(found.active_delegated_value, dec!(3100));
        assert!(found.is_from_external_validator());

        let osmo = statuses.status_by_asset_and_date("ESCapitalFund", "OSMO", day);
        assert!(!is_asset_from_external_validator(osmo));

        assert!(statuses.status_by_asset_and_date("ESCapitalFund", "HASH", day).is_none());
        assert!(statuses.status_by_asset_and_date("Nobody", "ATOM", day).is_none());
        assert_eq!(statuses.statuses("ESCapitalFund").len(), 3);
    }
}
