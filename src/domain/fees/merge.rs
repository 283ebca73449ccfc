//! Merging of staking and custody output into one invoice set.

use super::types::{AccountResult, OrgResult, Summary};
use std::collections::HashMap;

/// Combines two account lists; accounts with the same (client name, billing
/// terms, customer ID) become one whose line items are `first`'s followed by
/// `second`'s. Order is first appearance.
pub fn merge_accounts(first: Vec<AccountResult>, second: Vec<AccountResult>) -> Vec<AccountResult> {
    let mut merged: Vec<AccountResult> = Vec::with_capacity(first.len() + second.len());
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for account in first.into_iter().chain(second) {
        let (client, terms, customer) = account.merge_key();
        let key = (client.to_string(), terms.to_string(), customer.to_string());

        match index.get(&key) {
            Some(&i) => merged[i].assets.extend(account.assets),
            None => {
                index.insert(key, merged.len());
                merged.push(account);
            }
        }
    }

    merged
}

/// Combines the per-organization summaries of both calculators by
/// organization name, staking first.
pub fn merge_summaries(staking: Summary, custody: Summary) -> Summary {
    let mut merged: Summary = Vec::with_capacity(staking.len().max(custody.len()));
    let mut index: HashMap<String, usize> = HashMap::new();

    for org in staking.into_iter().chain(custody) {
        match index.get(&org.org_name) {
            Some(&i) => {
                let existing = std::mem::take(&mut merged[i].accounts);
                merged[i].accounts = merge_accounts(existing, org.accounts);
            }
            None => {
                index.insert(org.org_name.clone(), merged.len());
                merged.push(OrgResult {
                    org_name: org.org_name,
                    accounts: merge_accounts(org.accounts, Vec::new()),
                });
            }
        }
    }

    merged
}
