//! Daily on-chain (unclaimed) balances index.
//!
//! Account name → asset → business day → `DailyBalance`. Rows landing on the
//! same (account, asset, day) are summed into a single entry.

use crate::domain::sanitize::{parse_date, parse_decimal, sanitize_name};
use crate::domain::table::{Column, RowTable, cell, has_blank_field};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

pub const COL_ASSET: Column = 3;
pub const COL_BALANCE_TYPE: Column = 5;
pub const COL_DAILY_BALANCE: Column = 6;
pub const COL_BALANCE_DATE: Column = 7;
pub const COL_ACCOUNT_NAME: Column = 8;
pub const COL_USD_PRICE: Column = 9;

pub const ROW_WIDTH: usize = 11;

#[derive(Debug, Clone, Default)]
pub struct UnclaimedBalances {
    accounts: BTreeMap<String, Account>,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub display_name: String,
    assets: BTreeMap<String, Asset>,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    daily_balances: BTreeMap<NaiveDate, DailyBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBalance {
    pub balance_type: String,
    pub quantity: Decimal,
    pub day: NaiveDate,
    pub usd_price: Decimal,
    pub usd_value: Decimal,
}

impl UnclaimedBalances {
    pub fn from_rows(table: &RowTable) -> Self {
        let mut accounts: BTreeMap<String, Account> = BTreeMap::new();

        for row in table {
            if has_blank_field(row, &[COL_ACCOUNT_NAME, COL_ASSET, COL_BALANCE_DATE]) {
                continue;
            }
            let Some(day) = parse_date(cell(row, COL_BALANCE_DATE)) else {
                debug!("Skipping unclaimed balance with unreadable date '{}'", cell(row, COL_BALANCE_DATE));
                continue;
            };

            let account_name = sanitize_name(cell(row, COL_ACCOUNT_NAME));
            let account = accounts
                .entry(account_name.clone())
                .or_insert_with(|| Account {
                    name: account_name,
                    display_name: cell(row, COL_ACCOUNT_NAME).to_string(),
                    assets: BTreeMap::new(),
                });

            let asset_name = cell(row, COL_ASSET).trim().to_string();
            let asset = account
                .assets
                .entry(asset_name.clone())
                .or_insert_with(|| Asset {
                    name: asset_name,
                    daily_balances: BTreeMap::new(),
                });

            let quantity = parse_decimal(cell(row, COL_DAILY_BALANCE));
            let usd_price = parse_decimal(cell(row, COL_USD_PRICE));

            asset
                .daily_balances
                .entry(day)
                .and_modify(|balance| {
                    balance.quantity += quantity;
                    balance.usd_value += quantity * usd_price;
                })
                .or_insert_with(|| DailyBalance {
                    balance_type: cell(row, COL_BALANCE_TYPE).to_string(),
                    quantity,
                    day,
                    usd_price,
                    usd_value: quantity * usd_price,
                });
        }

        debug!("Unclaimed Balances bound {} accounts", accounts.len());
        Self { accounts }
    }

    /// Daily balances keyed by day, or `None` when the pair is unknown.
    pub fn daily_balances(&self, account: &str, asset: &str) -> Option<&BTreeMap<NaiveDate, DailyBalance>> {
        self.accounts
            .get(account)?
            .assets
            .get(asset)
            .map(|a| &a.daily_balances)
    }

    /// Daily balances in ascending day order. Empty when the pair is unknown.
    pub fn sorted_daily_balances(&self, account: &str, asset: &str) -> Vec<&DailyBalance> {
        self.daily_balances(account, asset)
            .map(|balances| balances.values().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::table::sparse_row;

    pub fn balance_row(account: &str, asset: &str, day: &str, quantity: &str, usd_price: &str) -> Vec<String> {
        sparse_row(
            ROW_WIDTH,
            &[
                (COL_ASSET, asset),
                (COL_BALANCE_TYPE, "UNCLAIMED"),
                (COL_DAILY_BALANCE, quantity),
                (COL_BALANCE_DATE, day),
                (COL_ACCOUNT_NAME, account),
                (COL_USD_PRICE, usd_price),
            ],
        )
    }
}
