//! Staking reward fees.
//!
//! Each rewards asset of an account is matched against the calc table. Every
//! matching (asset, validator) entry yields one line item, billed either from
//! the rewards earned or, for delegations to a 100%-commission validator,
//! from the average delegated balance.

use super::invoice::{ExternalIdCounter, InvoiceNumberGenerator, due_date};
use super::types::{
    AccountResult, DELEGATION_REWARDS_CATEGORY, FULL_COMMISSION_VALIDATOR_CATEGORY, LineItem, OrgResult,
    STAKING_SERVICE_TYPE, Warning,
};
use super::{CalculatorReport, FeeInputs, RunContext};
use crate::domain::calendar::{days_in_month, format_us};
use crate::domain::databind::master_fee_rates::{Organization, StakingFee};
use crate::domain::databind::operations_statuses::{Status, is_asset_from_external_validator};
use crate::domain::databind::rewards::{self, ClaimedReward};
use crate::domain::databind::unclaimed_balances::DailyBalance;
use crate::domain::errors::CalculationError;
use crate::domain::reference::CalcTableEntry;
use crate::domain::rounding::{div_round, fixed_2dp, round_cents};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

const PERCENT: Decimal = dec!(100);
const MONTHS_IN_YEAR: Decimal = dec!(12);

/// Computes staking fees for every fee-schedule account.
pub fn calculate_staking_fees(inputs: &FeeInputs, ctx: &RunContext) -> Result<CalculatorReport, CalculationError> {
    ctx.debug.record("Start of Staking Fees calculation.");

    let mut report = CalculatorReport::default();
    let mut external_ids = ExternalIdCounter::new(ctx.first_external_id);
    let mut invoice_numbers = InvoiceNumberGenerator::new(ctx.first_external_id);

    for org in inputs.master_fee_rates.organizations() {
        ctx.debug
            .record(format!("Processing organization {} id:{}", org.display_name, org.id));
        let mut accounts = Vec::new();

        for mfr_account in org.accounts() {
            ctx.debug.record(format!("MFR account name: {}", mfr_account.name));

            let external_id = external_ids.next_id();
            let due = due_date(ctx.invoice_date, &mfr_account.billing_terms)
                .map_err(|e| CalculationError::Staking(e.to_string()))?;

            let mut items = Vec::new();
            match inputs.rewards.account_by_id(&mfr_account.id) {
                Some(rwd_account) => {
                    for rwd_asset in rwd_account.assets() {
                        let asset = AssetContext {
                            org,
                            account_name: &rwd_account.name,
                            mfr_account_name: &mfr_account.name,
                            asset_name: &rwd_asset.name,
                        };
                        let fee = staking_fee_for(&asset, mfr_account.asset_staking_fees(&rwd_asset.name), rwd_account, ctx, &mut report.warnings);
                        items.extend(asset_line_items(&asset, rwd_asset, &fee, inputs, ctx, &mut report.warnings));
                    }
                }
                None => {
                    let msg = format!(
                        "Skipping because no entry in Rewards sheet was found for ID {}",
                        mfr_account.id
                    );
                    ctx.debug.record(&msg);
                    report.warnings.push(Warning::new(&org.name, &mfr_account.name, "", msg));
                }
            }

            if org.entity_id.is_empty() {
                let msg = format!("Failed to fetch EntityID from: {}", org.name);
                warn!("{}", msg);
                ctx.debug.record(msg);
                continue;
            }

            accounts.push(AccountResult {
                client_name: mfr_account.name.clone(),
                billing_terms: mfr_account.billing_terms.clone(),
                customer_id: mfr_account.customer_id.clone(),
                display_name: mfr_account.display_name.clone(),
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

    ctx.debug.record("End of Staking Fees calculation.");
    info!(
        "Staking fees calculated for {} organizations ({} warnings)",
        report.summary.len(),
        report.warnings.len()
    );
    Ok(report)
}

/// Names identifying one (organization, account, asset) triple
struct AssetContext<'a> {
    org: &'a Organization,
    /// Sanitized rewards account name; joins balances and statuses
    account_name: &'a str,
    /// Sanitized fee-schedule account name; joins balance adjustments
    mfr_account_name: &'a str,
    asset_name: &'a str,
}

fn staking_fee_for(
    asset: &AssetContext<'_>,
    found: Option<&StakingFee>,
    rwd_account: &rewards::Account,
    ctx: &RunContext,
    warnings: &mut Vec<Warning>,
) -> StakingFee {
    if let Some(fee) = found {
        return fee.clone();
    }

    let msg = format!(
        "MFR entry not found for account {}, asset {}.",
        rwd_account.id, asset.asset_name
    );
    ctx.debug.record(&msg);
    warnings.push(Warning::new(&asset.org.name, asset.account_name, asset.asset_name, msg));

    StakingFee {
        asset_name: asset.asset_name.to_string(),
        anchorage_fee: Decimal::ZERO,
        third_party_fee: Decimal::ZERO,
    }
}

fn asset_line_items(
    asset: &AssetContext<'_>,
    rwd_asset: &rewards::Asset,
    fee: &StakingFee,
    inputs: &FeeInputs,
    ctx: &RunContext,
    warnings: &mut Vec<Warning>,
) -> Vec<LineItem> {
    let adjustment = inputs.balance_adjustments.sum_daily_balance_adjustments(
        &asset.org.name,
        asset.mfr_account_name,
        asset.asset_name,
    );
    let balances = inputs
        .unclaimed_balances
        .sorted_daily_balances(asset.account_name, asset.asset_name);
    let status =
        inputs
            .operations_statuses
            .status_by_asset_and_date(asset.account_name, asset.asset_name, ctx.invoice_date);

    let mut items = Vec::new();
    for entry in ctx.reference.calc_table().entries_for(asset.asset_name) {
        let third_party = entry.validator.is_third_party();

        let earned = if entry.claimable {
            if balances.is_empty() {
                ctx.debug.record(format!(
                    "Account {} delegation reward for {} does not relate to Anchorage staked balances.",
                    asset.account_name, asset.asset_name
                ));
                continue;
            }
            sum_diff_unclaimed_in_usd(&balances, rwd_asset.claimed_rewards(), third_party)
        } else {
            sum_claimed_rewards(rwd_asset.claimed_rewards(), third_party)
        };

        let priced = match status {
            Some(s) if is_asset_from_external_validator(status) => {
                price_full_commission_validator(s, fee.third_party_fee, adjustment, ctx.invoice_date)
            }
            _ => {
                let priced = price_default(fee, entry, earned, adjustment);
                if priced.gross_up_skipped {
                    let msg = format!(
                        "Fee rate {}% for {} leaves nothing to gross up; billed at the net rate",
                        priced.fee, asset.asset_name
                    );
                    ctx.debug.record(&msg);
                    warnings.push(Warning::new(&asset.org.name, asset.account_name, asset.asset_name, msg));
                }
                priced
            }
        };

        items.push(LineItem {
            service_type: STAKING_SERVICE_TYPE.to_string(),
            asset: asset.asset_name.to_string(),
            amount: priced.amount,
            collected_on_chain_already: entry.on_chain,
            earned_rewards: round_cents(priced.earned.unwrap_or(earned)),
            fee_rates: priced.fee,
            item_category: priced.category.to_string(),
            item_description: String::new(),
            item_quantity: String::new(),
            memo: String::new(),
            monthly_rate: priced.monthly_rate,
        });
    }
    items
}

#[derive(Debug, Clone, PartialEq)]
struct Priced {
    category: &'static str,
    /// Replaces the earned rewards when set
    earned: Option<Decimal>,
    fee: Decimal,
    amount: Decimal,
    monthly_rate: String,
    gross_up_skipped: bool,
}

/// Bills the average balance delegated to a validator that keeps every reward.
fn price_full_commission_validator(
    status: &Status,
    third_party_fee: Decimal,
    adjustment: Decimal,
    invoice_date: NaiveDate,
) -> Priced {
    let days = Decimal::from(days_in_month(invoice_date));
    let average_staked = round_cents(div_round(status.active_delegated_value, days));
    let rate = div_round(third_party_fee, PERCENT);
    let amount = round_cents(div_round((average_staked + adjustment) * rate, MONTHS_IN_YEAR));

    Priced {
        category: FULL_COMMISSION_VALIDATOR_CATEGORY,
        earned: Some(Decimal::ZERO),
        fee: average_staked,
        amount,
        monthly_rate: format!("{}%", fixed_2dp(third_party_fee)),
        gross_up_skipped: false,
    }
}

/// Bills a percentage of the rewards earned, grossed up when the protocol
/// already collected its cut on-chain.
fn price_default(fee: &StakingFee, entry: &CalcTableEntry, earned: Decimal, adjustment: Decimal) -> Priced {
    let fee_percent = if entry.validator.is_third_party() {
        fee.third_party_fee
    } else {
        fee.anchorage_fee
    };

    let mut rate = div_round(fee_percent, PERCENT);
    let mut gross_up_skipped = false;
    if entry.on_chain {
        if rate >= Decimal::ONE {
            gross_up_skipped = true;
        } else {
            rate = div_round(rate, Decimal::ONE - rate);
        }
    }

    Priced {
        category: DELEGATION_REWARDS_CATEGORY,
        earned: None,
        fee: fee_percent,
        amount: round_cents(rate * (earned + adjustment)),
        monthly_rate: String::new(),
        gross_up_skipped,
    }
}

/// USD value of claimed rewards for one validator type.
fn sum_claimed_rewards(claimed: &[ClaimedReward], third_party: bool) -> Decimal {
    claimed
        .iter()
        .map(|r| {
            if third_party {
                r.third_party_usd_value
            } else {
                r.anchorage_usd_value
            }
        })
        .sum()
}

/// Rewards accrued on-chain: day-over-day balance growth plus whatever was
/// claimed that day, valued at the day's price. The first day is the
/// baseline and contributes nothing.
fn sum_diff_unclaimed_in_usd(balances: &[&DailyBalance], claimed: &[ClaimedReward], third_party: bool) -> Decimal {
    balances
        .windows(2)
        .map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            let delta = current.quantity - previous.quantity;
            (delta + sum_claimed_assets_by_day(claimed, third_party, current.day)) * current.usd_price
        })
        .sum()
}

fn sum_claimed_assets_by_day(claimed: &[ClaimedReward], third_party: bool, day: NaiveDate) -> Decimal {
    claimed
        .iter()
        .filter(|r| r.business_day == Some(day))
        .map(|r| {
            if third_party {
                r.third_party_asset_qty
            } else {
                r.anchorage_asset_qty
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::databind::balance_adjustments::fixtures::adjustment_row;
    use crate::domain::databind::master_fee_rates::fixtures::MfrRow;
    use crate::domain::databind::operations_statuses::fixtures::status_row;
    use crate::domain::databind::rewards::fixtures::reward_row;
    use crate::domain::databind::unclaimed_balances::fixtures::balance_row;
    use crate::domain::databind::{
        BalanceAdjustments, MasterFeeRates, OperationsStatuses, Rewards, UnclaimedBalances,
    };
    use crate::domain::debug_log::DebugLog;
    use crate::domain::reference::{ReferenceData, Validator};
    use std::sync::Arc;

    fn ctx(seed: u64) -> RunContext {
        RunContext::new(
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            seed,
            Arc::new(ReferenceData::embedded().clone()),
            DebugLog::new(true),
        )
    }

    fn mfr(rows: Vec<Vec<String>>) -> MasterFeeRates {
        MasterFeeRates::from_rows(&rows).unwrap()
    }

    fn entry(validator: Validator, on_chain: bool) -> CalcTableEntry {
        CalcTableEntry {
            asset: "APT".to_string(),
            validator,
            operations: vec![],
            on_chain,
            claimable: true,
        }
    }

    fn staking_fee(anchorage: Decimal, third_party: Decimal) -> StakingFee {
        StakingFee {
            asset_name: "APT".to_string(),
            anchorage_fee: anchorage,
            third_party_fee: third_party,
        }
    }

    #[test]
    fn test_sum_diff_unclaimed_in_usd() {
        let rows = vec![
            balance_row("Acc", "ROSE", "2023-01-01", "100", "1"),
            balance_row("Acc", "ROSE", "2023-01-02", "110", "2"),
            balance_row("Acc", "ROSE", "2023-01-03", "105", "3"),
        ];
        let unclaimed = UnclaimedBalances::from_rows(&rows);
        let balances = unclaimed.sorted_daily_balances("Acc", "ROSE");

        let claimed = vec![ClaimedReward {
            anchorage_asset_qty: dec!(20),
            anchorage_usd_value: dec!(60),
            business_day: NaiveDate::from_ymd_opt(2023, 1, 3),
            operation_type: "DELEGATION_REWARD".to_string(),
            third_party_asset_qty: dec!(1),
            third_party_usd_value: dec!(3),
        }];

        // day 2: (10 + 0) * 2 = 20; day 3: (-5 + 20) * 3 = 45
        assert_eq!(sum_diff_unclaimed_in_usd(&balances, &claimed, false), dec!(65));
        // day 3 with the third-party quantity: (-5 + 1) * 3 = -12
        assert_eq!(sum_diff_unclaimed_in_usd(&balances, &claimed, true), dec!(8));
        assert_eq!(sum_diff_unclaimed_in_usd(&balances[..1], &claimed, false), Decimal::ZERO);
    }

    #[test]
    fn test_price_default_on_chain_gross_up() {
        let fee = staking_fee(dec!(10), dec!(5));

        let priced = price_default(&fee, &entry(Validator::Anchorage, true), dec!(900), Decimal::ZERO);
        // 0.10 / 0.90 of 900
        assert_eq!(priced.amount, dec!(100.00));
        assert_eq!(priced.fee, dec!(10));

        let priced = price_default(&fee, &entry(Validator::NonAnchorage, false), dec!(900), dec!(100));
        assert_eq!(priced.amount, dec!(50.00));
        assert_eq!(priced.fee, dec!(5));
        assert!(!priced.gross_up_skipped);
    }

    #[test]
    fn test_price_default_full_rate_is_not_grossed_up() {
        let fee = staking_fee(dec!(100), Decimal::ZERO);

        let priced = price_default(&fee, &entry(Validator::Anchorage, true), dec!(50), Decimal::ZERO);
        assert!(priced.gross_up_skipped);
        assert_eq!(priced.amount, dec!(50.00));
    }

    #[test]
    fn test_price_full_commission_validator() {
        let status = Status {
            asset: "ATOM".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            active_delegated_value: dec!(3_100_000),
            validator_rate: "100%".to_string(),
        };

        let priced = price_full_commission_validator(
            &status,
            dec!(12),
            dec!(0),
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
        );

        // 3.1M over 31 days = 100k average; 12% a year is 1% a month
        assert_eq!(priced.fee, dec!(100_000.00));
        assert_eq!(priced.amount, dec!(1_000.00));
        assert_eq!(priced.monthly_rate, "12.00%");
        assert_eq!(priced.earned, Some(Decimal::ZERO));
        assert_eq!(priced.category, FULL_COMMISSION_VALIDATOR_CATEGORY);
    }

    #[test]
    fn test_calculate_staking_fees_claimed_rewards() {
        let inputs = FeeInputs {
            master_fee_rates: mfr(vec![
                MfrRow {
                    billing_terms: "15",
                    staking: &[(53, "10"), (54, "20")],
                    ..Default::default()
                }
                .build(),
            ]),
            rewards: Rewards::from_rows(&vec![
                reward_row("Electric Sheep", "ES Capital Fund", "acc-1", "CELO", "2023-01-10", ("1", "30.00"), ("1", "10.00")),
                reward_row("Electric Sheep", "ES Capital Fund", "acc-1", "CELO", "2023-01-20", ("1", "20.00"), ("0", "0")),
            ]),
            balance_adjustments: BalanceAdjustments::from_rows(&vec![adjustment_row(
                "Electric Sheep",
                "ES Capital Fund",
                "CELO",
                "2023-01-15",
                "50",
                "Y",
            )]),
            ..Default::default()
        };

        let report = calculate_staking_fees(&inputs, &ctx(7)).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.summary.len(), 1);

        let account = &report.summary[0].accounts[0];
        assert_eq!(account.client_name, "ESCapitalFund");
        assert_eq!(account.invoice_number, "ADB-7");
        assert_eq!(account.external_id, "7");
        assert_eq!(account.invoice_date, "01/31/2023");
        assert_eq!(account.due_date, "02/15/2023");

        // one line per CELO calc table entry: anchorage then third party
        assert_eq!(account.assets.len(), 2);
        let anchorage = &account.assets[0];
        assert_eq!(anchorage.earned_rewards, dec!(50.00));
        assert_eq!(anchorage.fee_rates, dec!(10));
        assert_eq!(anchorage.amount, dec!(10.00));
        let third_party = &account.assets[1];
        assert_eq!(third_party.earned_rewards, dec!(10.00));
        assert_eq!(third_party.amount, dec!(12.00));
        assert_eq!(third_party.item_category, DELEGATION_REWARDS_CATEGORY);
    }

    #[test]
    fn test_claimable_asset_without_balances_is_skipped() {
        let inputs = FeeInputs {
            master_fee_rates: mfr(vec![MfrRow { staking: &[(60, "10")], ..Default::default() }.build()]),
            rewards: Rewards::from_rows(&vec![reward_row(
                "Electric Sheep", "ES Capital Fund", "acc-1", "ROSE", "2023-01-10", ("5", "0.50"), ("0", "0"),
            )]),
            ..Default::default()
        };

        let ctx = ctx(1);
        let report = calculate_staking_fees(&inputs, &ctx).unwrap();

        assert!(report.summary[0].accounts[0].assets.is_empty());
        assert!(report.warnings.is_empty());
        assert!(
            ctx.debug
                .messages()
                .iter()
                .any(|m| m.message.contains("does not relate to Anchorage staked balances"))
        );
    }

    #[test]
    fn test_full_commission_validator_line() {
        let inputs = FeeInputs {
            master_fee_rates: mfr(vec![MfrRow { staking: &[(67, "12")], ..Default::default() }.build()]),
            rewards: Rewards::from_rows(&vec![reward_row(
                "Electric Sheep", "ES Capital Fund", "acc-1", "ATOM", "2023-01-10", ("0", "0"), ("2", "20.00"),
            )]),
            operations_statuses: OperationsStatuses::from_rows(&vec![status_row(
                "ES Capital Fund", "ATOM", "2023-01-31", "3,100,000", "100.00%",
            )]),
            ..Default::default()
        };

        let report = calculate_staking_fees(&inputs, &ctx(1)).unwrap();
        let item = &report.summary[0].accounts[0].assets[0];

        assert_eq!(item.item_category, FULL_COMMISSION_VALIDATOR_CATEGORY);
        assert_eq!(item.earned_rewards, Decimal::ZERO);
        assert_eq!(item.fee_rates, dec!(100_000.00));
        assert_eq!(item.amount, dec!(1_000.00));
        assert_eq!(item.monthly_rate, "12.00%");
    }

    #[test]
    fn test_missing_fee_schedule_entry_warns_and_bills_zero() {
        let inputs = FeeInputs {
            master_fee_rates: mfr(vec![MfrRow::default().build()]),
            rewards: Rewards::from_rows(&vec![reward_row(
                "Electric Sheep", "ES Capital Fund", "acc-1", "DOGE", "2023-01-10", ("1", "1.00"), ("0", "0"),
            )]),
            ..Default::default()
        };

        let report = calculate_staking_fees(&inputs, &ctx(1)).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].asset, "DOGE");
        assert_eq!(report.warnings[0].description, "MFR entry not found for account acc-1, asset DOGE.");
        // no calc table entry for DOGE, so no line items either
        assert!(report.summary[0].accounts[0].assets.is_empty());
    }

    #[test]
    fn test_missing_rewards_account_still_emits_account() {
        let inputs = FeeInputs {
            master_fee_rates: mfr(vec![
                MfrRow::default().build(),
                MfrRow { rdb_account_id: "acc-2", legal_name: "ES Venture Fund", ..Default::default() }.build(),
            ]),
            rewards: Rewards::from_rows(&vec![reward_row(
                "Electric Sheep", "ES Capital Fund", "acc-1", "CELO", "2023-01-10", ("1", "1.00"), ("0", "0"),
            )]),
            ..Default::default()
        };

        let report = calculate_staking_fees(&inputs, &ctx(10)).unwrap();
        let accounts = &report.summary[0].accounts;

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].external_id, "10");
        assert_eq!(accounts[1].external_id, "11");
        // same organization, same invoice number
        assert_eq!(accounts[0].invoice_number, accounts[1].invoice_number);
        assert!(accounts[1].assets.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].acc_name, "ESVentureFund");
    }

    #[test]
    fn test_organization_without_entity_drops_accounts() {
        let inputs = FeeInputs {
            master_fee_rates: mfr(vec![MfrRow { entity_id: "", ..Default::default() }.build()]),
            ..Default::default()
        };

        let report = calculate_staking_fees(&inputs, &ctx(1)).unwrap();

        assert_eq!(report.summary.len(), 1);
        assert_eq!(report.summary[0].org_name, "ElectricSheep");
        assert!(report.summary[0].accounts.is_empty());
    }
}
