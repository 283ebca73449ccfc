use super::sheet::trim_to_header;
use crate::domain::errors::DatabindError;
use crate::domain::ports::{Report, TableSource};
use crate::domain::table::RowTable;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Table source over tables already in memory. Reports never inserted read
/// as empty.
#[derive(Clone, Default)]
pub struct InMemoryTableSource {
    tables: Arc<RwLock<HashMap<Report, RowTable>>>,
}

impl InMemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for setup code outside an async context.
    pub fn with_table(self, report: Report, table: RowTable) -> Self {
        match self.tables.try_write() {
            Ok(mut tables) => {
                tables.insert(report, table);
            }
            Err(_) => warn!("InMemoryTableSource: tables busy, {} not inserted", report),
        }
        self
    }

    pub async fn insert(&self, report: Report, table: RowTable) {
        self.tables.write().await.insert(report, table);
    }

    /// Stores a raw sheet export after trimming its header rows.
    pub async fn insert_sheet(&self, report: Report, values: RowTable, header_rows: usize) -> Result<(), DatabindError> {
        let table = trim_to_header(values, header_rows, report)?;
        self.insert(report, table).await;
        Ok(())
    }
}

#[async_trait]
impl TableSource for InMemoryTableSource {
    async fn fetch_table(&self, report: Report) -> Result<RowTable> {
        Ok(self.tables.read().await.get(&report).cloned().unwrap_or_default())
    }
}
