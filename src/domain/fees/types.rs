//! Invoice output model.
//!
//! Field names follow the invoice JSON contract consumed downstream.

use rust_decimal::Decimal;
use serde::Serialize;

pub const STAKING_SERVICE_TYPE: &str = "Staking Fee";
pub const CUSTODY_SERVICE_TYPE: &str = "Custody Fee";

pub const DELEGATION_REWARDS_CATEGORY: &str = "Delegation Rewards Fees";
pub const FULL_COMMISSION_VALIDATOR_CATEGORY: &str = "Delegation Rewards Fees - 100% validator";
pub const CUSTODY_BY_ASSET_CATEGORY: &str = "Custody Fee by Asset";

/// One billed line on an account invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub service_type: String,
    pub asset: String,
    pub amount: Decimal,
    pub collected_on_chain_already: bool,
    /// Staking: USD rewards earned. Custody: average AUC of the asset.
    pub earned_rewards: Decimal,
    /// Staking: the rate applied. Custody: the effective monthly fee.
    pub fee_rates: Decimal,
    pub item_category: String,
    pub item_description: String,
    pub item_quantity: String,
    pub memo: String,
    pub monthly_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResult {
    pub client_name: String,
    pub billing_terms: String,
    #[serde(rename = "customerID")]
    pub customer_id: String,
    pub display_name: String,
    #[serde(rename = "entityID")]
    pub entity_id: String,
    pub invoice_number: String,
    #[serde(rename = "externalID")]
    pub external_id: String,
    pub invoice_date: String,
    pub due_date: String,
    pub assets: Vec<LineItem>,
}

impl AccountResult {
    /// Key under which staking and custody results for one account are merged
    pub fn merge_key(&self) -> (&str, &str, &str) {
        (&self.client_name, &self.billing_terms, &self.customer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgResult {
    pub org_name: String,
    pub accounts: Vec<AccountResult>,
}

/// Per-organization results of one calculator, or of the merged run
pub type Summary = Vec<OrgResult>;

/// A non-fatal problem found while billing one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub org_name: String,
    pub acc_name: String,
    pub asset: String,
    pub description: String,
}

impl Warning {
    pub fn new(org_name: &str, acc_name: &str, asset: &str, description: impl Into<String>) -> Self {
        Self {
            org_name: org_name.to_string(),
            acc_name: acc_name.to_string(),
            asset: asset.to_string(),
            description: description.into(),
        }
    }
}

/// Output of a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalculatedFees {
    pub summary: Summary,
    pub warnings: Vec<Warning>,
}
