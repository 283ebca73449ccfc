//! Custody fees.
//!
//! The organization's average AUC picks the tiers and the effective monthly
//! fee of each asset type; every asset then bills its share of that fee.

use super::invoice::{ExternalIdCounter, InvoiceNumberGenerator, due_date};
use super::tiering::{avg_auc_by_asset, calc_effective_fee_amount};
use super::types::{AccountResult, CUSTODY_BY_ASSET_CATEGORY, CUSTODY_SERVICE_TYPE, LineItem, OrgResult, Warning};
use super::{CalculatorReport, FeeInputs, RunContext};
use crate::domain::calendar::{days_in_month, format_us};
use crate::domain::databind::daily_balances::AccountBalances;
use crate::domain::databind::master_fee_rates::{Account, AssetType, Organization};
use crate::domain::errors::CalculationError;
use crate::domain::rounding::{div_round_dp, fixed_2dp, round_cents};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

const MONTHS_IN_YEAR: Decimal = dec!(12);

/// Computes custody fees for every fee-schedule account.
pub fn calculate_custody_fees(inputs: &FeeInputs, ctx: &RunContext) -> Result<CalculatorReport, CalculationError> {
    ctx.debug.record("Start of Custody Fees calculation.");

    let mut report = CalculatorReport::default();
    let mut external_ids = ExternalIdCounter::new(ctx.first_external_id);
    let mut invoice_numbers = InvoiceNumberGenerator::new(ctx.first_external_id);
    let days = days_in_month(ctx.invoice_date);

    for org in inputs.master_fee_rates.organizations() {
        ctx.debug
            .record(format!("Processing organization {} id:{}", org.display_name, org.id));

        let org_avg_auc = inputs.daily_balances.average_usd_balance_by_org(&org.id, days);
        if org_avg_auc.is_zero() {
            let msg = format!("Zero AUC value for organization {}", org.name);
            ctx.debug.record(&msg);
            report.warnings.push(Warning::new(&org.name, "", "", msg));
        }

        let mut accounts = Vec::new();
        for account in org.accounts() {
            let external_id = external_ids.next_id();
            let due = due_date(ctx.invoice_date, &account.billing_terms)
                .map_err(|e| CalculationError::Custody(e.to_string()))?;

            let empty = AccountBalances::new();
            let balances = match inputs.daily_balances.account_balances(&org.id, &account.name) {
                Some(balances) => balances,
                None => {
                    ctx.debug.record(format!(
                        "Account Balances not found in Daily Balances for this account: {}",
                        account.name
                    ));
                    &empty
                }
            };

            let billing = AccountBilling {
                org,
                account,
                balances,
                org_avg_auc,
                days,
            };
            let mut items = Vec::new();
            for asset_type in account.asset_types() {
                items.extend(billing.asset_type_line_items(asset_type, ctx, &mut report.warnings));
            }

            if org.entity_id.is_empty() {
                let msg = format!("Failed to fetch EntityID from: {}", org.name);
                warn!("{}", msg);
                ctx.debug.record(msg);
                continue;
            }

            accounts.push(AccountResult {
                client_name: account.name.clone(),
                billing_terms: account.billing_terms.clone(),
                customer_id: account.customer_id.clone(),
                display_name: account.display_name.clone(),
                entity_id: org.entity_id.clone(),
                invoice_number: invoice_numbers.invoice_number(&org.entity_id, &org.id),
                external_id: external_id.to_string(),
                invoice_date: format_us(ctx.invoice_date),
                due_date: format_us(due),
                assets: items,
            });
        }

        report.summary.push(OrgResult {
            org_name: org.name.clone(),
            accounts,
        });
    }

    ctx.debug.record("End of Custody Fees calculation.");
    info!(
        "Custody fees calculated for {} organizations ({} warnings)",
        report.summary.len(),
        report.warnings.len()
    );
    Ok(report)
}

struct AccountBilling<'a> {
    org: &'a Organization,
    account: &'a Account,
    balances: &'a AccountBalances,
    org_avg_auc: Decimal,
    days: u32,
}

impl AccountBilling<'_> {
    fn asset_type_line_items(
        &self,
        asset_type: &AssetType,
        ctx: &RunContext,
        warnings: &mut Vec<Warning>,
    ) -> Vec<LineItem> {
        let averages = match avg_auc_by_asset(self.balances, ctx.reference.asset_types(), asset_type.id, self.days) {
            Ok(averages) => averages,
            Err(e) => {
                let msg = format!("Error calculating AvgAucAsset: {}", e);
                ctx.debug.record(&msg);
                warnings.push(Warning::new(&self.org.name, &self.account.name, "", msg));
                return Vec::new();
            }
        };
        if averages.is_empty() {
            ctx.debug.record(format!(
                "Assets not found in the list of assets for this AssetID: {}",
                asset_type.id
            ));
            return Vec::new();
        }

        let tiers = match asset_type.find_all_tiers(self.org_avg_auc) {
            Ok(tiers) => tiers,
            Err(e) => {
                let msg = format!("Error finding tiers: {}", e);
                ctx.debug.record(&msg);
                warnings.push(Warning::new(&self.org.name, &self.account.name, "", msg));
                return Vec::new();
            }
        };

        let fee = round_cents(calc_effective_fee_amount(&tiers, &asset_type.minimum_fee, self.org_avg_auc));
        let monthly_rate = fixed_2dp(div_round_dp(fee, MONTHS_IN_YEAR, 2));

        averages
            .into_iter()
            .map(|(asset, avg_auc)| {
                let share = if self.org_avg_auc.is_zero() {
                    Decimal::ZERO
                } else {
                    div_round_dp(avg_auc, self.org_avg_auc, 2)
                };

                LineItem {
                    service_type: CUSTODY_SERVICE_TYPE.to_string(),
                    asset,
                    amount: round_cents(share * fee),
                    collected_on_chain_already: false,
                    earned_rewards: avg_auc,
                    fee_rates: fee,
                    item_category: CUSTODY_BY_ASSET_CATEGORY.to_string(),
                    item_description: String::new(),
                    item_quantity: String::new(),
                    memo: String::new(),
                    monthly_rate: monthly_rate.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::databind::daily_balances::fixtures::daily_balance_row;
    use crate::domain::databind::master_fee_rates::fixtures::MfrRow;
    use crate::domain::databind::{DailyBalances, MasterFeeRates};
    use crate::domain::debug_log::DebugLog;
    use crate::domain::reference::ReferenceData;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn ctx() -> RunContext {
        RunContext::new(
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            1,
            Arc::new(ReferenceData::embedded().clone()),
            DebugLog::new(true),
        )
    }

    fn daily_balances() -> DailyBalances {
        DailyBalances::from_rows(&vec![
            daily_balance_row("1001", "ES Capital Fund", "BTC", "310,000,000", "310,000,000"),
            daily_balance_row("1001", "ES Capital Fund", "SOL", "155,000,000", "155,000,000"),
        ])
    }

    #[test]
    fn test_calculate_custody_fees_by_asset_share() {
        let inputs = FeeInputs {
            master_fee_rates: MasterFeeRates::from_rows(&vec![
                MfrRow { tiers: &[("0", "0.12")], ..Default::default() }.build(),
                MfrRow { asset_id: "1", tiers: &[("0", "0.06")], ..Default::default() }.build(),
            ])
            .unwrap(),
            daily_balances: daily_balances(),
            ..Default::default()
        };

        let report = calculate_custody_fees(&inputs, &ctx()).unwrap();
        assert!(report.warnings.is_empty());

        let account = &report.summary[0].accounts[0];
        assert_eq!(account.invoice_number, "ADB-1");
        assert_eq!(account.assets.len(), 2);

        // org average 15M; BTC-only group at 6%/year
        let btc = &account.assets[0];
        assert_eq!(btc.asset, "BTC");
        assert_eq!(btc.fee_rates, dec!(75_000.00));
        assert_eq!(btc.earned_rewards, dec!(10_000_000));
        assert_eq!(btc.amount, dec!(50_250.00));
        assert_eq!(btc.monthly_rate, "6250.00");

        // group 10 skips BTC, SOL holds a third of the org AUC
        let sol = &account.assets[1];
        assert_eq!(sol.asset, "SOL");
        assert_eq!(sol.fee_rates, dec!(150_000.00));
        assert_eq!(sol.amount, dec!(49_500.00));
        assert_eq!(sol.item_category, CUSTODY_BY_ASSET_CATEGORY);
        assert!(!sol.collected_on_chain_already);
    }

    #[test]
    fn test_zero_org_auc_warns() {
        let inputs = FeeInputs {
            master_fee_rates: MasterFeeRates::from_rows(&vec![
                MfrRow { tiers: &[("0", "0.12")], ..Default::default() }.build(),
            ])
            .unwrap(),
            ..Default::default()
        };

        let ctx = ctx();
        let report = calculate_custody_fees(&inputs, &ctx).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].description, "Zero AUC value for organization ElectricSheep");
        assert!(report.summary[0].accounts[0].assets.is_empty());
        assert!(
            ctx.debug
                .messages()
                .iter()
                .any(|m| m.message.starts_with("Account Balances not found"))
        );
    }

    #[test]
    fn test_tier_and_asset_type_errors_become_warnings() {
        let inputs = FeeInputs {
            master_fee_rates: MasterFeeRates::from_rows(&vec![
                MfrRow::default().build(),
                MfrRow { asset_id: "99", tiers: &[("0", "0.12")], ..Default::default() }.build(),
            ])
            .unwrap(),
            daily_balances: daily_balances(),
            ..Default::default()
        };

        let report = calculate_custody_fees(&inputs, &ctx()).unwrap();
        let descriptions: Vec<&str> = report.warnings.iter().map(|w| w.description.as_str()).collect();

        assert_eq!(descriptions.len(), 2);
        assert!(descriptions.iter().any(|d| d.starts_with("Error finding tiers")));
        assert!(descriptions.iter().any(|d| d.starts_with("Error calculating AvgAucAsset")));
        assert!(report.summary[0].accounts[0].assets.is_empty());
    }

    #[test]
    fn test_balance_below_every_floor_warns() {
        let inputs = FeeInputs {
            master_fee_rates: MasterFeeRates::from_rows(&vec![
                MfrRow {
                    asset_id: "1",
                    tiers: &[("100,000,000", "0.06")],
                    ..Default::default()
                }
                .build(),
            ])
            .unwrap(),
            daily_balances: daily_balances(),
            ..Default::default()
        };

        let report = calculate_custody_fees(&inputs, &ctx()).unwrap();

        // below the only floor: no suitable tier
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].description.starts_with("Error finding tiers"));
    }
}
