//! Fee schedule ("Master Fee Rates") index.
//!
//! MSAID → Organization → RDB account ID → asset-type ID. Each asset type
//! carries the custody tiers, the minimum fee, and the staking fee rates per
//! staking asset.

use crate::domain::errors::DatabindError;
use crate::domain::sanitize::{parse_decimal, sanitize_float_string, sanitize_integer_string, sanitize_name};
use crate::domain::table::{Column, RowTable, cell, has_blank_field};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const COL_MINIMUM_FEE_TYPE: Column = 3;
pub const COL_ACCOUNT_FROM_RDB: Column = 4;
pub const COL_ENTITY_ID: Column = 7;
pub const COL_ORG_NAME: Column = 8;
pub const COL_LEGAL_NAME: Column = 9;
pub const COL_BILLING_TERMS: Column = 11;
pub const COL_ASSET_TYPE: Column = 19;
pub const COL_MINIMUM_CHARGE: Column = 29;
/// First tier floor; tiers are ten (floor, rate) column pairs from here on
pub const COL_FIRST_TIER_FLOOR: Column = 30;
pub const TIER_COUNT: usize = 10;
pub const COL_ASSET_ID: Column = 87;
pub const COL_MSA_ID: Column = 88;
pub const COL_GRADUATED_TIER: Column = 89;
/// NetSuite customer ID
pub const COL_CUSTOMER_ID: Column = 90;
pub const COL_BILLING_ID: Column = 91;
pub const COL_RDB_ACCOUNT_ID: Column = 92;

/// Width of a full fee-schedule row
pub const ROW_WIDTH: usize = 93;

/// Staking fee rate columns: (asset, Anchorage-validator column, third-party column)
pub const STAKING_FEE_COLUMNS: &[(&str, Option<Column>, Option<Column>)] = &[
    ("CELO", Some(53), Some(54)),
    ("FLOW", Some(56), Some(57)),
    ("OSMO", None, Some(58)),
    ("ROSE", Some(60), Some(61)),
    ("ETH", Some(62), None),
    ("AXL", None, Some(64)),
    ("APT", Some(72), Some(65)),
    ("ATOM", None, Some(67)),
    ("HASH", None, Some(69)),
    ("EVMOS", None, Some(71)),
    ("SOL", None, Some(73)),
    ("SUI", Some(75), Some(76)),
];

const TERMINATED: &str = "TERMINATED";
const GRADUATED: &str = "GRADUATED";

pub type AssetTypeId = i64;

#[derive(Debug, Clone, Default)]
pub struct MasterFeeRates {
    organizations: BTreeMap<String, Organization>,
}

#[derive(Debug, Clone)]
pub struct Organization {
    /// Sanitized MSA ID
    pub id: String,
    /// Sanitized organization name, used to join other reports
    pub name: String,
    pub display_name: String,
    /// Anchorage entity ID, used for the invoice-number acronym
    pub entity_id: String,
    accounts: BTreeMap<String, Account>,
}

#[derive(Debug, Clone)]
pub struct Account {
    /// RDB account ID
    pub id: String,
    /// Sanitized legal name
    pub name: String,
    pub display_name: String,
    pub customer_id: String,
    /// Net days as an integer string
    pub billing_terms: String,
    asset_types: BTreeMap<AssetTypeId, AssetType>,
}

#[derive(Debug, Clone)]
pub struct AssetType {
    pub id: AssetTypeId,
    pub description: String,
    /// Cumulative tiers when true, highest matching tier only otherwise
    pub graduated: bool,
    pub tiers: Vec<TierData>,
    pub minimum_fee: MinimumFee,
    pub(crate) staking_fees: BTreeMap<String, StakingFee>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierData {
    pub floor: Decimal,
    pub rate: Decimal,
}

impl TierData {
    pub fn new(floor: Decimal, rate: Decimal) -> Self {
        Self { floor, rate }
    }

    /// Unused tier columns are exported as (0, 0)
    pub fn is_placeholder(&self) -> bool {
        self.floor.is_zero() && self.rate.is_zero()
    }
}

/// Staking fee rates in percent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingFee {
    pub asset_name: String,
    pub anchorage_fee: Decimal,
    pub third_party_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimumFeeType {
    /// Minimum charge applies outright below the first tier floor
    AucBased,
    /// Minimum charge applies when the computed fee is lower
    GreaterOf,
    Other(String),
}

impl MinimumFeeType {
    pub fn from_label(label: &str) -> Self {
        match sanitize_name(label).to_uppercase().as_str() {
            "AUCBASED" => Self::AucBased,
            "GREATEROF" => Self::GreaterOf,
            _ => Self::Other(label.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimumFee {
    pub fee_type: MinimumFeeType,
    pub charge: Decimal,
}

impl MinimumFee {
    pub fn new(fee_type: MinimumFeeType, charge: Decimal) -> Self {
        Self { fee_type, charge }
    }

    pub fn is_auc_based(&self) -> bool {
        self.fee_type == MinimumFeeType::AucBased
    }

    pub fn is_greater_of(&self) -> bool {
        self.fee_type == MinimumFeeType::GreaterOf
    }
}

impl MasterFeeRates {
    /// Builds the index from fee-schedule rows (header rows already stripped).
    ///
    /// Terminated accounts and rows missing the MSA ID or RDB account ID are
    /// dropped. An asset-ID cell that is not an integer aborts the build.
    pub fn from_rows(table: &RowTable) -> Result<Self, DatabindError> {
        let mut organizations: BTreeMap<String, Organization> = BTreeMap::new();

        for (idx, row) in table.iter().enumerate() {
            if cell(row, COL_RDB_ACCOUNT_ID).trim().eq_ignore_ascii_case(TERMINATED) {
                continue;
            }
            if has_blank_field(row, &[COL_MSA_ID, COL_RDB_ACCOUNT_ID]) {
                continue;
            }

            let asset_id_cell = sanitize_float_string(cell(row, COL_ASSET_ID));
            let asset_id: AssetTypeId =
                asset_id_cell
                    .parse()
                    .map_err(|_| DatabindError::InvalidAssetId {
                        value: cell(row, COL_ASSET_ID).to_string(),
                        row: idx,
                    })?;

            let msa_id = sanitize_name(cell(row, COL_MSA_ID));
            let org_name = sanitize_name(cell(row, COL_ORG_NAME));
            let org = organizations
                .entry(msa_id.clone())
                .or_insert_with(|| Organization {
                    id: msa_id.clone(),
                    name: org_name.clone(),
                    display_name: cell(row, COL_ORG_NAME).to_string(),
                    entity_id: cell(row, COL_ENTITY_ID).trim().to_string(),
                    accounts: BTreeMap::new(),
                });

            let account_id = cell(row, COL_RDB_ACCOUNT_ID).trim().to_string();
            let legal_name = sanitize_name(cell(row, COL_LEGAL_NAME));
            let account = org.accounts.entry(account_id.clone()).or_insert_with(|| {
                let billing_terms = sanitize_integer_string(cell(row, COL_BILLING_TERMS));
                if billing_terms == "0" {
                    warn!(
                        "Billing Terms is empty/invalid for orgName: {} and legalName: {}. Setting it to 0",
                        org_name, legal_name
                    );
                }
                Account {
                    id: account_id.clone(),
                    name: legal_name.clone(),
                    display_name: cell(row, COL_LEGAL_NAME).to_string(),
                    customer_id: cell(row, COL_CUSTOMER_ID).trim().to_string(),
                    billing_terms,
                    asset_types: BTreeMap::new(),
                }
            });

            let asset_type = account
                .asset_types
                .entry(asset_id)
                .or_insert_with(|| AssetType {
                    id: asset_id,
                    description: cell(row, COL_ASSET_TYPE).to_string(),
                    graduated: cell(row, COL_GRADUATED_TIER).trim().eq_ignore_ascii_case(GRADUATED),
                    tiers: parse_tiers(row),
                    minimum_fee: MinimumFee::new(
                        MinimumFeeType::from_label(cell(row, COL_MINIMUM_FEE_TYPE)),
                        parse_decimal(cell(row, COL_MINIMUM_CHARGE)),
                    ),
                    staking_fees: BTreeMap::new(),
                });

            // Later rows for the same asset type refresh the staking rates
            asset_type.staking_fees = parse_staking_fees(row);
        }

        debug!("Master Fee Rates bound {} organizations", organizations.len());
        Ok(Self { organizations })
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    pub fn organization(&self, msa_id: &str) -> Option<&Organization> {
        self.organizations.get(msa_id)
    }

    pub fn accounts(&self, msa_id: &str) -> impl Iterator<Item = &Account> {
        self.organizations
            .get(msa_id)
            .into_iter()
            .flat_map(|org| org.accounts.values())
    }

    pub fn asset_types(&self, msa_id: &str, account_id: &str) -> impl Iterator<Item = &AssetType> {
        self.organizations
            .get(msa_id)
            .and_then(|org| org.accounts.get(account_id))
            .into_iter()
            .flat_map(|acc| acc.asset_types.values())
    }

    pub fn staking_fees(
        &self,
        msa_id: &str,
        account_id: &str,
        asset_type_id: AssetTypeId,
    ) -> Option<&BTreeMap<String, StakingFee>> {
        self.organizations
            .get(msa_id)?
            .accounts
            .get(account_id)?
            .asset_types
            .get(&asset_type_id)
            .map(|at| &at.staking_fees)
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}

impl Organization {
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.get(account_id)
    }
}

impl Account {
    pub fn asset_types(&self) -> impl Iterator<Item = &AssetType> {
        self.asset_types.values()
    }

    pub fn asset_type(&self, id: AssetTypeId) -> Option<&AssetType> {
        self.asset_types.get(&id)
    }

    /// Staking rates for an asset, searched across all asset types of the account.
    pub fn asset_staking_fees(&self, asset_name: &str) -> Option<&StakingFee> {
        self.asset_types
            .values()
            .find_map(|at| at.staking_fees.get(asset_name))
    }
}

impl AssetType {
    pub fn staking_fees(&self) -> &BTreeMap<String, StakingFee> {
        &self.staking_fees
    }
}

fn parse_tiers(row: &[String]) -> Vec<TierData> {
    (0..TIER_COUNT)
        .map(|i| {
            let floor_col = COL_FIRST_TIER_FLOOR + i * 2;
            TierData::new(
                parse_decimal(cell(row, floor_col)),
                parse_decimal(cell(row, floor_col + 1)),
            )
        })
        .collect()
}

fn parse_staking_fees(row: &[String]) -> BTreeMap<String, StakingFee> {
    let rate = |col: Option<Column>| col.map(|c| parse_decimal(cell(row, c))).unwrap_or_default();

    STAKING_FEE_COLUMNS
        .iter()
        .map(|&(asset, anchorage_col, third_party_col)| {
            (
                asset.to_string(),
                StakingFee {
                    asset_name: asset.to_string(),
                    anchorage_fee: rate(anchorage_col),
                    third_party_fee: rate(third_party_col),
                },
            )
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::table::sparse_row;

    /// One fee-schedule row with the columns the binder reads.
    pub struct MfrRow<'a> {
        pub msa_id: &'a str,
        pub org_name: &'a str,
        pub entity_id: &'a str,
        pub legal_name: &'a str,
        pub rdb_account_id: &'a str,
        pub customer_id: &'a str,
        pub billing_terms: &'a str,
        pub asset_id: &'a str,
        pub graduated: &'a str,
        pub minimum_fee_type: &'a str,
        pub minimum_charge: &'a str,
        pub tiers: &'a [(&'a str, &'a str)],
        pub staking: &'a [(Column, &'a str)],
    }

    impl Default for MfrRow<'_> {
        fn default() -> Self {
            Self {
                msa_id: "1001",
                org_name: "Electric Sheep",
                entity_id: "15",
                legal_name: "ES Capital Fund",
                rdb_account_id: "acc-1",
                customer_id: "12890",
                billing_terms: "Net 15",
                asset_id: "10",
                graduated: "GRADUATED",
                minimum_fee_type: "AUC-based",
                minimum_charge: "$5,000",
                tiers: &[],
                staking: &[],
            }
        }
    }

    /// Overwrites the billing terms of every account, bypassing sanitization.
    pub fn set_billing_terms(mfr: &mut MasterFeeRates, terms: &str) {
        for org in mfr.organizations.values_mut() {
            for account in org.accounts.values_mut() {
                account.billing_terms = terms.to_string();
            }
        }
    }

    impl MfrRow<'_> {
        pub fn build(&self) -> Vec<String> {
            let mut cells = vec![
                (COL_MSA_ID, self.msa_id),
                (COL_ORG_NAME, self.org_name),
                (COL_ENTITY_ID, self.entity_id),
                (COL_LEGAL_NAME, self.legal_name),
                (COL_RDB_ACCOUNT_ID, self.rdb_account_id),
                (COL_CUSTOMER_ID, self.customer_id),
                (COL_BILLING_TERMS, self.billing_terms),
                (COL_ASSET_ID, self.asset_id),
                (COL_GRADUATED_TIER, self.graduated),
                (COL_MINIMUM_FEE_TYPE, self.minimum_fee_type),
                (COL_MINIMUM_CHARGE, self.minimum_charge),
            ];
            for (i, &(floor, rate)) in self.tiers.iter().enumerate() {
                cells.push((COL_FIRST_TIER_FLOOR + i * 2, floor));
                cells.push((COL_FIRST_TIER_FLOOR + i * 2 + 1, rate));
            }
            cells.extend_from_slice(self.staking);
            sparse_row(ROW_WIDTH, &cells)
        }
    }
}
