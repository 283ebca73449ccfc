//! Claimed staking rewards index.
//!
//! Organization name → account (keyed by internal account ID) → asset →
//! claimed rewards in row order.

use crate::domain::sanitize::{parse_date, parse_decimal, sanitize_name};
use crate::domain::table::{Column, RowTable, cell, has_blank_field};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const COL_ORGANIZATION: Column = 0;
pub const COL_ACCOUNT: Column = 1;
pub const COL_OPERATION_TYPE: Column = 5;
pub const COL_ASSET: Column = 6;
pub const COL_ANCHORAGE_ASSET_QTY: Column = 11;
pub const COL_ANCHORAGE_VALUE: Column = 12;
pub const COL_THIRD_PARTY_QTY: Column = 13;
pub const COL_THIRD_PARTY_VALUE: Column = 14;
pub const COL_BUSINESS_DAY: Column = 17;
pub const COL_ACCOUNT_INTERNAL_ID: Column = 18;

pub const ROW_WIDTH: usize = 19;

#[derive(Debug, Clone, Default)]
pub struct Rewards {
    organizations: BTreeMap<String, Organization>,
    /// account ID → owning organization key
    account_index: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Organization {
    pub name: String,
    pub display_name: String,
    accounts: BTreeMap<String, Account>,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    /// Sanitized account name, used to join balances and statuses
    pub name: String,
    pub display_name: String,
    assets: BTreeMap<String, Asset>,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    claimed_rewards: Vec<ClaimedReward>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedReward {
    pub anchorage_asset_qty: Decimal,
    pub anchorage_usd_value: Decimal,
    pub business_day: Option<NaiveDate>,
    pub operation_type: String,
    pub third_party_asset_qty: Decimal,
    pub third_party_usd_value: Decimal,
}

impl Rewards {
    pub fn from_rows(table: &RowTable) -> Self {
        let mut rewards = Self::default();

        for row in table {
            if has_blank_field(row, &[COL_ORGANIZATION, COL_ACCOUNT_INTERNAL_ID, COL_ASSET]) {
                continue;
            }

            let org_name = sanitize_name(cell(row, COL_ORGANIZATION));
            let org = rewards
                .organizations
                .entry(org_name.clone())
                .or_insert_with(|| Organization {
                    name: org_name.clone(),
                    display_name: cell(row, COL_ORGANIZATION).to_string(),
                    accounts: BTreeMap::new(),
                });

            let account_id = cell(row, COL_ACCOUNT_INTERNAL_ID).trim().to_string();
            let account = org
                .accounts
                .entry(account_id.clone())
                .or_insert_with(|| Account {
                    id: account_id.clone(),
                    name: sanitize_name(cell(row, COL_ACCOUNT)),
                    display_name: cell(row, COL_ACCOUNT).to_string(),
                    assets: BTreeMap::new(),
                });
            rewards
                .account_index
                .entry(account_id)
                .or_insert_with(|| org_name.clone());

            let asset_name = cell(row, COL_ASSET).trim().to_string();
            let asset = account
                .assets
                .entry(asset_name.clone())
                .or_insert_with(|| Asset {
                    name: asset_name,
                    claimed_rewards: Vec::new(),
                });

            asset.claimed_rewards.push(ClaimedReward {
                anchorage_asset_qty: parse_decimal(cell(row, COL_ANCHORAGE_ASSET_QTY)),
                anchorage_usd_value: parse_decimal(cell(row, COL_ANCHORAGE_VALUE)),
                business_day: parse_date(cell(row, COL_BUSINESS_DAY)),
                operation_type: cell(row, COL_OPERATION_TYPE).to_string(),
                third_party_asset_qty: parse_decimal(cell(row, COL_THIRD_PARTY_QTY)),
                third_party_usd_value: parse_decimal(cell(row, COL_THIRD_PARTY_VALUE)),
            });
        }

        debug!("Rewards bound {} organizations", rewards.organizations.len());
        rewards
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    pub fn accounts(&self, organization: &str) -> impl Iterator<Item = &Account> {
        self.organizations
            .get(organization)
            .into_iter()
            .flat_map(|org| org.accounts.values())
    }

    /// Finds an account by internal ID regardless of organization.
    pub fn account_by_id(&self, account_id: &str) -> Option<&Account> {
        let org = self.account_index.get(account_id)?;
        self.organizations.get(org)?.accounts.get(account_id)
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}

impl Account {
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }
}

impl Asset {
    pub fn claimed_rewards(&self) -> &[ClaimedReward] {
        &self.claimed_rewards
    }
}
