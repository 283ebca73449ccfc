use crate::domain::errors::AssetTypeError;
use serde::{Deserialize, Serialize};

/// A custody asset-type group.
///
/// With `exclusive` set the group covers only `assets`; otherwise it covers
/// every asset except those listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeGroup {
    pub asset_id: i64,
    pub assets: Vec<String>,
    pub exclusive: bool,
}

impl AssetTypeGroup {
    pub fn covers(&self, asset: &str) -> bool {
        let listed = self.assets.iter().any(|a| a == asset);
        listed == self.exclusive
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetTypeList {
    groups: Vec<AssetTypeGroup>,
}

impl AssetTypeList {
    pub fn new(groups: Vec<AssetTypeGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[AssetTypeGroup] {
        &self.groups
    }

    /// Resolves the group `asset_type_id` for `asset`.
    ///
    /// An unknown ID and an asset filtered out of a known group are distinct
    /// errors.
    pub fn type_for_asset(&self, asset: &str, asset_type_id: i64) -> Result<&AssetTypeGroup, AssetTypeError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.asset_id == asset_type_id)
            .ok_or(AssetTypeError::UnknownAssetType { asset_type_id })?;

        if group.covers(asset) {
            Ok(group)
        } else {
            Err(AssetTypeError::AssetExcluded {
                asset: asset.to_string(),
                asset_type_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reference::ReferenceData;

    #[test]
    fn test_type_for_asset_found() {
        let list = ReferenceData::embedded().asset_types();
        let group = list.type_for_asset("ETH", 0).unwrap();

        assert_eq!(group.assets, vec!["BTC".to_string(), "ETH".to_string()]);
        assert!(group.exclusive);
    }

    #[test]
    fn test_type_for_asset_unknown_id() {
        let list = ReferenceData::embedded().asset_types();
        let err = list.type_for_asset("BTC", 99).unwrap_err();

        assert_eq!(err, AssetTypeError::UnknownAssetType { asset_type_id: 99 });
        assert_eq!(err.to_string(), "AssetID 99 not found in Asset Types");
    }

    #[test]
    fn test_type_for_asset_excluded() {
        let list = ReferenceData::embedded().asset_types();

        let err = list.type_for_asset("ROSE", 0).unwrap_err();
        assert_eq!(err.to_string(), "Asset Name 'ROSE' not found in Asset Types ID '0'");

        // group 10 covers everything except BTC and ETH
        assert!(list.type_for_asset("SOL", 10).is_ok());
        assert!(matches!(
            list.type_for_asset("BTC", 10),
            Err(AssetTypeError::AssetExcluded { .. })
        ));
    }
}
