//! Header-row offsets of the report exports.
//!
//! Exports carry banner and title rows above the data; these offsets say how
//! many leading rows to drop per report.

use crate::domain::ports::Report;
use anyhow::{Context, Result};

pub const MFR_HEADER_ROW: usize = 3;
pub const REWARDS_HEADER_ROW: usize = 8;
pub const REPORT_HEADER_ROW: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRows {
    pub master_fee_rates: usize,
    pub rewards: usize,
    /// Every other report
    pub report: usize,
}

impl Default for HeaderRows {
    fn default() -> Self {
        Self {
            master_fee_rates: MFR_HEADER_ROW,
            rewards: REWARDS_HEADER_ROW,
            report: REPORT_HEADER_ROW,
        }
    }
}

impl HeaderRows {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds from an arbitrary variable lookup; unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str, default: usize| -> Result<usize> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("{} must be a row count, got '{}'", key, value)),
                None => Ok(default),
            }
        };

        Ok(Self {
            master_fee_rates: read("MFR_HEADER_ROW", MFR_HEADER_ROW)?,
            rewards: read("REWARDS_HEADER_ROW", REWARDS_HEADER_ROW)?,
            report: read("REPORT_HEADER_ROW", REPORT_HEADER_ROW)?,
        })
    }

    pub fn for_report(&self, report: Report) -> usize {
        match report {
            Report::MasterFeeRates => self.master_fee_rates,
            Report::Rewards => self.rewards,
            _ => self.report,
        }
    }
}
