//! Manual USD balance corrections.
//!
//! Organization → account → asset → business day → adjustment. A later row
//! for the same day replaces the earlier one. Only entries flagged as staking
//! adjustments count toward the lookup sum.

use crate::domain::sanitize::{parse_date, parse_decimal, sanitize_name};
use crate::domain::table::{Column, RowTable, cell, has_blank_field};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

pub const COL_ORGANIZATION: Column = 0;
pub const COL_ACCOUNT: Column = 1;
pub const COL_BUSINESS_DAY: Column = 4;
pub const COL_OPERATION: Column = 5;
pub const COL_ASSET: Column = 6;
pub const COL_TOTAL_USD: Column = 16;
pub const COL_ASSET_QUANTITY: Column = 17;
pub const COL_STAKING_ADJUSTMENT: Column = 18;

pub const ROW_WIDTH: usize = 19;

#[derive(Debug, Clone, Default)]
pub struct BalanceAdjustments {
    organizations: BTreeMap<String, BTreeMap<String, BTreeMap<String, Asset>>>,
}

#[derive(Debug, Clone, Default)]
pub struct Asset {
    daily_adjustments: BTreeMap<NaiveDate, DailyBalanceAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBalanceAdjustment {
    pub operation_type: String,
    pub usd_value: Decimal,
    pub asset_quantity: Decimal,
    pub business_day: NaiveDate,
    pub staking_adjustment: String,
}

impl DailyBalanceAdjustment {
    pub fn is_staking_adjustment(&self) -> bool {
        self.staking_adjustment == "Y"
    }
}

impl BalanceAdjustments {
    pub fn from_rows(table: &RowTable) -> Self {
        let mut organizations: BTreeMap<String, BTreeMap<String, BTreeMap<String, Asset>>> =
            BTreeMap::new();

        for row in table {
            if has_blank_field(row, &[COL_ORGANIZATION, COL_ACCOUNT, COL_ASSET, COL_BUSINESS_DAY]) {
                continue;
            }
            let Some(business_day) = parse_date(cell(row, COL_BUSINESS_DAY)) else {
                continue;
            };

            let asset = organizations
                .entry(sanitize_name(cell(row, COL_ORGANIZATION)))
                .or_default()
                .entry(sanitize_name(cell(row, COL_ACCOUNT)))
                .or_default()
                .entry(cell(row, COL_ASSET).trim().to_string())
                .or_default();

            asset.daily_adjustments.insert(
                business_day,
                DailyBalanceAdjustment {
                    operation_type: cell(row, COL_OPERATION).to_string(),
                    usd_value: parse_decimal(cell(row, COL_TOTAL_USD)),
                    asset_quantity: parse_decimal(cell(row, COL_ASSET_QUANTITY)),
                    business_day,
                    staking_adjustment: cell(row, COL_STAKING_ADJUSTMENT).trim().to_string(),
                },
            );
        }

        debug!("Balance Adjustments bound {} organizations", organizations.len());
        Self { organizations }
    }

    pub fn asset(&self, organization: &str, account: &str, asset: &str) -> Option<&Asset> {
        self.organizations.get(organization)?.get(account)?.get(asset)
    }

    /// Sum of the staking adjustments for a triple; zero when unknown.
    pub fn sum_daily_balance_adjustments(&self, organization: &str, account: &str, asset: &str) -> Decimal {
        self.asset(organization, account, asset)
            .map(|a| {
                a.daily_adjustments
                    .values()
                    .filter(|adj| adj.is_staking_adjustment())
                    .map(|adj| adj.usd_value)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}

impl Asset {
    pub fn len(&self) -> usize {
        self.daily_adjustments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_adjustments.is_empty()
    }

    /// Adjustments in ascending business-day order
    pub fn sorted_daily_balance_adjustments(&self) -> Vec<&DailyBalanceAdjustment> {
        self.daily_adjustments.values().collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::table::sparse_row;

    pub fn adjustment_row(org: &str, account: &str, asset: &str, day: &str, usd: &str, flag: &str) -> Vec<String> {
        sparse_row(
            ROW_WIDTH,
            &[
                (COL_ORGANIZATION, org),
                (COL_ACCOUNT, account),
                (COL_BUSINESS_DAY, day),
                (COL_OPERATION, "ADJUSTMENT"),
                (COL_ASSET, asset),
                (COL_TOTAL_USD, usd),
                (COL_ASSET_QUANTITY, "1"),
                (COL_STAKING_ADJUSTMENT, flag),
            ],
        )
    }
}
