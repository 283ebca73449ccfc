//! Custody balances per account and asset.
//!
//! Despite the report name, each row already holds a period total; rows for
//! the same (MSAID, account, asset) are summed.

use crate::domain::rounding::div_round;
use crate::domain::sanitize::{parse_decimal, sanitize_name};
use crate::domain::table::{Column, RowTable, cell, has_blank_field};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

pub const COL_MSA_ID: Column = 0;
pub const COL_ORG_NAME: Column = 1;
pub const COL_ACCOUNT_NAME: Column = 2;
pub const COL_ANCHOR_ENTITY: Column = 3;
pub const COL_ORG_ID: Column = 4;
pub const COL_ASSET_NAME: Column = 5;
pub const COL_ACCOUNT_ID: Column = 6;
pub const COL_DAILY_ASSET_TOTAL: Column = 7;
pub const COL_DAILY_ASSET_PRICE: Column = 8;
pub const COL_DAILY_USD_TOTAL: Column = 9;
pub const COL_DAILY_TOTAL_FROM_ADDRESSES: Column = 10;
pub const COL_UNCLAIMED_REWARDS_USD: Column = 11;
pub const COL_TOTAL_AUC_USD: Column = 12;
pub const COL_IS_GRADUATED: Column = 13;

pub const ROW_WIDTH: usize = 14;

/// Balances of one account keyed by asset name
pub type AccountBalances = BTreeMap<String, Balance>;

#[derive(Debug, Clone, Default)]
pub struct DailyBalances {
    organizations: BTreeMap<String, BTreeMap<String, AccountBalances>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub asset_balance: Decimal,
    pub usd_balance: Decimal,
    pub unclaimed_rewards_usd: Decimal,
    pub total_auc_usd: Decimal,
}

impl Balance {
    fn accumulate(&mut self, other: &Balance) {
        self.asset_balance += other.asset_balance;
        self.usd_balance += other.usd_balance;
        self.unclaimed_rewards_usd += other.unclaimed_rewards_usd;
        self.total_auc_usd += other.total_auc_usd;
    }
}

impl DailyBalances {
    pub fn from_rows(table: &RowTable) -> Self {
        let mut organizations: BTreeMap<String, BTreeMap<String, AccountBalances>> = BTreeMap::new();

        for row in table {
            if has_blank_field(row, &[COL_MSA_ID, COL_ACCOUNT_NAME, COL_ASSET_NAME]) {
                continue;
            }

            let row_balance = Balance {
                asset_balance: parse_decimal(cell(row, COL_DAILY_ASSET_TOTAL)),
                usd_balance: parse_decimal(cell(row, COL_DAILY_USD_TOTAL)),
                unclaimed_rewards_usd: parse_decimal(cell(row, COL_UNCLAIMED_REWARDS_USD)),
                total_auc_usd: parse_decimal(cell(row, COL_TOTAL_AUC_USD)),
            };

            organizations
                .entry(sanitize_name(cell(row, COL_MSA_ID)))
                .or_default()
                .entry(sanitize_name(cell(row, COL_ACCOUNT_NAME)))
                .or_default()
                .entry(cell(row, COL_ASSET_NAME).trim().to_string())
                .or_default()
                .accumulate(&row_balance);
        }

        debug!("Daily Balances bound {} organizations", organizations.len());
        Self { organizations }
    }

    pub fn account_balances(&self, msa_id: &str, account: &str) -> Option<&AccountBalances> {
        self.organizations.get(msa_id)?.get(account)
    }

    pub fn balance(&self, msa_id: &str, account: &str, asset: &str) -> Option<&Balance> {
        self.account_balances(msa_id, account)?.get(asset)
    }

    pub fn asset_balance(&self, msa_id: &str, account: &str, asset: &str) -> Option<Decimal> {
        self.balance(msa_id, account, asset).map(|b| b.asset_balance)
    }

    pub fn usd_balance(&self, msa_id: &str, account: &str, asset: &str) -> Option<Decimal> {
        self.balance(msa_id, account, asset).map(|b| b.usd_balance)
    }

    pub fn unclaimed_rewards_usd(&self, msa_id: &str, account: &str, asset: &str) -> Option<Decimal> {
        self.balance(msa_id, account, asset).map(|b| b.unclaimed_rewards_usd)
    }

    pub fn total_auc_usd(&self, msa_id: &str, account: &str, asset: &str) -> Option<Decimal> {
        self.balance(msa_id, account, asset).map(|b| b.total_auc_usd)
    }

    /// Sum of USD balances across every account and asset of the
    /// organization, divided by the days in the invoice month.
    ///
    /// Unknown organizations and zero-day months average to zero.
    pub fn average_usd_balance_by_org(&self, msa_id: &str, days_in_month: u32) -> Decimal {
        if days_in_month == 0 {
            return Decimal::ZERO;
        }
        let Some(accounts) = self.organizations.get(msa_id) else {
            return Decimal::ZERO;
        };

        let total: Decimal = accounts
            .values()
            .flat_map(|balances| balances.values())
            .map(|b| b.usd_balance)
            .sum();

        div_round(total, Decimal::from(days_in_month))
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::table::sparse_row;

    pub fn daily_balance_row(msa_id: &str, account: &str, asset: &str, usd: &str, total_auc: &str) -> Vec<String> {
        sparse_row(
            ROW_WIDTH,
            &[
                (COL_MSA_ID, msa_id),
                (COL_ACCOUNT_NAME, account),
                (COL_ASSET_NAME, asset),
                (COL_DAILY_ASSET_TOTAL, "1"),
                (COL_DAILY_USD_TOTAL, usd),
                (COL_UNCLAIMED_REWARDS_USD, "0"),
                (COL_TOTAL_AUC_USD, total_auc),
            ],
        )
    }
}
