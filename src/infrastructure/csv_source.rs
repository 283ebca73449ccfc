//! Table source backed by one CSV export per report.

use crate::config::HeaderRows;
use crate::domain::ports::{Report, TableSource};
use crate::domain::table::RowTable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct CsvTableSource {
    paths: HashMap<Report, PathBuf>,
    header_rows: HeaderRows,
}

impl CsvTableSource {
    pub fn new(header_rows: HeaderRows) -> Self {
        Self {
            paths: HashMap::new(),
            header_rows,
        }
    }

    pub fn with_path(mut self, report: Report, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(report, path.into());
        self
    }

    pub fn path(&self, report: Report) -> Option<&Path> {
        self.paths.get(&report).map(PathBuf::as_path)
    }
}

#[async_trait]
impl TableSource for CsvTableSource {
    /// Reports without a configured file yield an empty table.
    async fn fetch_table(&self, report: Report) -> Result<RowTable> {
        let Some(path) = self.path(report) else {
            debug!("CsvTableSource: no file configured for {}", report);
            return Ok(RowTable::new());
        };

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {} from {}", report, path.display()))?;
        let rows = parse_csv(&bytes).with_context(|| format!("Failed to parse {} CSV", report))?;

        let skip = self.header_rows.for_report(report);
        let table: RowTable = rows.into_iter().skip(skip).collect();
        info!("CsvTableSource: {} rows read for {}", table.len(), report);
        Ok(table)
    }
}

/// Parses raw CSV with ragged rows and no header handling.
pub fn parse_csv(bytes: &[u8]) -> Result<RowTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = RowTable::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", i + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
