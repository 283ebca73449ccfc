use crate::domain::ports::Report;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while resolving custody fee tiers for a balance
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TierError {
    #[error("no valid tier data found for asset type")]
    NoTierData,

    #[error("no suitable tiers found for balance {balance}")]
    NoSuitableTiers { balance: Decimal },
}

/// Errors raised by asset-type group lookups.
///
/// `UnknownAssetType` and `AssetExcluded` are both "skip this asset" for the
/// calculators, but they are reported separately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetTypeError {
    #[error("AssetID {asset_type_id} not found in Asset Types")]
    UnknownAssetType { asset_type_id: i64 },

    #[error("Asset Name '{asset}' not found in Asset Types ID '{asset_type_id}'")]
    AssetExcluded { asset: String, asset_type_id: i64 },
}

/// Errors raised while binding row tables into typed indices
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabindError {
    #[error("Column AssetID has invalid value '{value}' in row {row}")]
    InvalidAssetId { value: String, row: usize },

    #[error("No {report} found")]
    EmptyTable { report: String },

    #[error("Billing terms '{terms}' is not a valid number of days")]
    InvalidBillingTerms { terms: String },
}

impl DatabindError {
    /// "No {report} found", with the trailing " Report" of the name dropped
    pub fn empty_table(report: Report) -> Self {
        DatabindError::EmptyTable {
            report: report.display_name().replace(" Report", ""),
        }
    }
}

/// Errors surfaced by a fee calculation run
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("error in staking fee calculation: {0}")]
    Staking(String),

    #[error("error in custody fee calculation: {0}")]
    Custody(String),

    /// Both calculator failures joined with " | "
    #[error("{0}")]
    Combined(String),
}

/// Errors raised while loading static reference data
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("Error in json unmarshal of {file}: {source}")]
    Malformed {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error reading file {file}: {source}")]
    Unreadable {
        file: String,
        #[source]
        source: std::io::Error,
    },
}
