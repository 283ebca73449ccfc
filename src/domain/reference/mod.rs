//! Static reference data: the staking calc table and custody asset-type groups.
//!
//! Both ship embedded in the binary and are parsed once per process. A
//! deployment can point at replacement files instead (see `Config`).

pub mod asset_types;
pub mod calc_table;

pub use asset_types::{AssetTypeGroup, AssetTypeList};
pub use calc_table::{CalcTable, CalcTableEntry, Validator};

use crate::domain::errors::ReferenceDataError;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

const CALC_TABLE_FILE: &str = "calc_table.json";
const ASSET_TYPES_FILE: &str = "asset_types.json";

static EMBEDDED_CALC_TABLE: &str = include_str!("../../../static/calc_table.json");
static EMBEDDED_ASSET_TYPES: &str = include_str!("../../../static/asset_types.json");

static EMBEDDED: LazyLock<ReferenceData> = LazyLock::new(|| {
    match ReferenceData::from_json(EMBEDDED_CALC_TABLE, EMBEDDED_ASSET_TYPES) {
        Ok(data) => data,
        // Shipped data is part of the build; a parse failure is a packaging bug.
        Err(e) => panic!("embedded reference data is malformed: {e}"),
    }
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    calc_table: CalcTable,
    asset_types: AssetTypeList,
}

impl ReferenceData {
    pub fn new(calc_table: CalcTable, asset_types: AssetTypeList) -> Self {
        Self {
            calc_table,
            asset_types,
        }
    }

    /// The reference data compiled into the binary.
    pub fn embedded() -> &'static ReferenceData {
        &EMBEDDED
    }

    pub fn from_json(calc_table: &str, asset_types: &str) -> Result<Self, ReferenceDataError> {
        let calc_table: CalcTable =
            serde_json::from_str(calc_table).map_err(|source| ReferenceDataError::Malformed {
                file: CALC_TABLE_FILE.to_string(),
                source,
            })?;
        let asset_types: AssetTypeList =
            serde_json::from_str(asset_types).map_err(|source| ReferenceDataError::Malformed {
                file: ASSET_TYPES_FILE.to_string(),
                source,
            })?;

        Ok(Self::new(calc_table, asset_types))
    }

    /// Loads reference data from disk, falling back to the embedded copy for
    /// any file not given.
    pub fn from_paths(
        calc_table_path: Option<&Path>,
        asset_types_path: Option<&Path>,
    ) -> Result<Self, ReferenceDataError> {
        let calc_table = match calc_table_path {
            Some(path) => read_file(path)?,
            None => EMBEDDED_CALC_TABLE.to_string(),
        };
        let asset_types = match asset_types_path {
            Some(path) => read_file(path)?,
            None => EMBEDDED_ASSET_TYPES.to_string(),
        };

        let data = Self::from_json(&calc_table, &asset_types)?;
        info!(
            "Reference data loaded: {} calc table entries, {} asset types",
            data.calc_table.entries().len(),
            data.asset_types.groups().len()
        );
        Ok(data)
    }

    pub fn calc_table(&self) -> &CalcTable {
        &self.calc_table
    }

    pub fn asset_types(&self) -> &AssetTypeList {
        &self.asset_types
    }
}

fn read_file(path: &Path) -> Result<String, ReferenceDataError> {
    std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Unreadable {
        file: path.display().to_string(),
        source,
    })
}
