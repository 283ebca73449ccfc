use serde::{Deserialize, Serialize};

/// Who runs the validator a reward came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    Anchorage,
    NonAnchorage,
}

impl Validator {
    pub fn is_third_party(&self) -> bool {
        *self != Validator::Anchorage
    }
}

/// One (asset, validator) staking rule.
///
/// `claimable` assets accrue rewards on-chain and are billed from balance
/// deltas; `on_chain` means the protocol already deducted a fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcTableEntry {
    pub asset: String,
    pub validator: Validator,
    #[serde(default)]
    pub operations: Vec<String>,
    pub on_chain: bool,
    pub claimable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalcTable {
    entries: Vec<CalcTableEntry>,
}

impl CalcTable {
    pub fn new(entries: Vec<CalcTableEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CalcTableEntry] {
        &self.entries
    }

    /// Entries for `asset` in table order.
    pub fn entries_for<'a>(&'a self, asset: &'a str) -> impl Iterator<Item = &'a CalcTableEntry> + 'a {
        self.entries.iter().filter(move |e| e.asset == asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_entries() {
        let json = r#"[
            { "asset": "APT", "validator": "anchorage", "operations": ["STAKING_REWARD"], "on_chain": true, "claimable": true },
            { "asset": "APT", "validator": "non_anchorage", "operations": ["STAKING_REWARD"], "on_chain": false, "claimable": true },
            { "asset": "OSMO", "validator": "non_anchorage", "on_chain": false, "claimable": false }
        ]"#;

        let table: CalcTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.entries().len(), 3);

        let apt: Vec<_> = table.entries_for("APT").collect();
        assert_eq!(apt.len(), 2);
        assert_eq!(apt[0].validator, Validator::Anchorage);
        assert!(apt[0].on_chain);
        assert!(apt[1].validator.is_third_party());

        let osmo: Vec<_> = table.entries_for("OSMO").collect();
        assert!(osmo[0].operations.is_empty());
        assert_eq!(table.entries_for("DOGE").count(), 0);
    }

    #[test]
    fn test_unknown_validator_is_rejected() {
        let json = r#"[{ "asset": "APT", "validator": "somebody", "on_chain": false, "claimable": true }]"#;
        assert!(serde_json::from_str::<CalcTable>(json).is_err());
    }
}
