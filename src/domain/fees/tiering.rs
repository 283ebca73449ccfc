//! Custody tier resolution and effective monthly fee.

use crate::domain::databind::daily_balances::AccountBalances;
use crate::domain::databind::master_fee_rates::{AssetType, AssetTypeId, MinimumFee, TierData};
use crate::domain::errors::{AssetTypeError, TierError};
use crate::domain::reference::AssetTypeList;
use crate::domain::rounding::div_round;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::trace;

const MONTHS_IN_YEAR: Decimal = dec!(12);

impl AssetType {
    /// Tiers that apply to `balance`, ascending by floor.
    ///
    /// Graduated types get every tier whose floor the balance reaches; flat
    /// types get only the highest of those.
    pub fn find_all_tiers(&self, balance: Decimal) -> Result<Vec<TierData>, TierError> {
        let mut tiers: Vec<TierData> = self.tiers.iter().copied().filter(|t| !t.is_placeholder()).collect();
        if tiers.is_empty() {
            return Err(TierError::NoTierData);
        }
        tiers.sort_by(|a, b| a.floor.cmp(&b.floor));

        let mut suitable: Vec<TierData> = tiers.into_iter().filter(|t| balance >= t.floor).collect();
        if suitable.is_empty() {
            return Err(TierError::NoSuitableTiers { balance });
        }

        if self.graduated {
            Ok(suitable)
        } else {
            Ok(suitable.split_off(suitable.len() - 1))
        }
    }
}

/// Monthly custody fee for an organization's average AUC.
///
/// Walks graduated tiers as marginal brackets: each tier bills up to its
/// floor, the last one absorbs the rest. Minimum fees apply per their type.
pub fn calc_effective_fee_amount(tiers: &[TierData], minimum_fee: &MinimumFee, total_org_avg_auc: Decimal) -> Decimal {
    if let Some(first) = tiers.first()
        && minimum_fee.is_auc_based()
        && total_org_avg_auc < first.floor
    {
        return minimum_fee.charge;
    }

    let mut effective = Decimal::ZERO;

    if let [tier] = tiers {
        effective = total_org_avg_auc * monthly_rate(tier);
    } else {
        let mut remaining = total_org_avg_auc;
        for (i, tier) in tiers.iter().enumerate() {
            let is_last = i + 1 == tiers.len();
            if remaining > tier.floor && !is_last {
                effective += tier.floor * monthly_rate(tier);
                remaining -= tier.floor;
            } else {
                effective += remaining * monthly_rate(tier);
                break;
            }
        }
    }

    if minimum_fee.is_greater_of() && effective < minimum_fee.charge {
        return minimum_fee.charge;
    }

    effective
}

fn monthly_rate(tier: &TierData) -> Decimal {
    div_round(tier.rate, MONTHS_IN_YEAR)
}

/// Average AUC per asset of an account for one asset-type group.
///
/// Assets filtered out of the group are skipped; an unknown group ID is an
/// error.
pub fn avg_auc_by_asset(
    balances: &AccountBalances,
    asset_types: &AssetTypeList,
    asset_type_id: AssetTypeId,
    days_in_month: u32,
) -> Result<BTreeMap<String, Decimal>, AssetTypeError> {
    let days = Decimal::from(days_in_month);
    let mut result = BTreeMap::new();

    for (asset, balance) in balances {
        match asset_types.type_for_asset(asset, asset_type_id) {
            Ok(_) => {
                result.insert(asset.clone(), div_round(balance.total_auc_usd, days));
            }
            Err(e @ AssetTypeError::AssetExcluded { .. }) => trace!("{}", e),
            Err(e) => return Err(e),
        }
    }

    Ok(result)
}
