//! Configuration loaded from environment variables.
//!
//! `.env` files are honored. Everything has a default, so an empty
//! environment yields a working configuration backed by the embedded
//! reference data.

mod header_rows;

pub use header_rows::{HeaderRows, MFR_HEADER_ROW, REPORT_HEADER_ROW, REWARDS_HEADER_ROW};

use crate::domain::reference::ReferenceData;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Replacement for the embedded calc table
    pub calc_table_path: Option<PathBuf>,
    /// Replacement for the embedded asset-type groups
    pub asset_types_path: Option<PathBuf>,
    /// Buffer debug messages and return them with the result
    pub debug: bool,
    pub header_rows: HeaderRows,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let debug = match lookup("FEES_DEBUG") {
            Some(value) => parse_bool(&value).with_context(|| format!("Invalid FEES_DEBUG value '{}'", value))?,
            None => false,
        };

        Ok(Self {
            calc_table_path: path("CALC_TABLE_PATH"),
            asset_types_path: path("ASSET_TYPES_PATH"),
            debug,
            header_rows: HeaderRows::from_lookup(&lookup).context("Failed to load header row config")?,
        })
    }

    /// Reference data from the configured files, or the embedded copy.
    pub fn reference_data(&self) -> Result<ReferenceData> {
        if self.calc_table_path.is_none() && self.asset_types_path.is_none() {
            return Ok(ReferenceData::embedded().clone());
        }
        ReferenceData::from_paths(self.calc_table_path.as_deref(), self.asset_types_path.as_deref())
            .context("Failed to load reference data")
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}
