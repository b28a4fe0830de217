use chrono::NaiveDate;
use common::{AggregationReport, DateRange, KpiBlock, Period};
use model::entities::{expense, prelude::*};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::{ledger, round_money};

pub const HOUSING: &str = "Rent / Mortgage";
pub const UTILITIES: &str = "Utilities";
pub const INSURANCE: &str = "Insurance";
pub const SUBSCRIPTIONS: &str = "Subscriptions";
pub const ENTERTAINMENT: &str = "Entertainment";
pub const DINING_OUT: &str = "Dining Out";
pub const TRAVEL: &str = "Travel";

/// `100 * part / earned`, rounded to 2 dp; 0 when nothing was earned.
fn percent_of(part: Decimal, earned: Decimal) -> Decimal {
    if earned.is_zero() {
        return round_money(Decimal::ZERO);
    }
    (part * Decimal::ONE_HUNDRED)
        .checked_div(earned)
        .map(round_money)
        .unwrap_or_else(|| round_money(Decimal::ZERO))
}

/// Builds the report from the user's current balance and per-category sums over `range`.
///
/// `earned` is reconstructed as balance + spent, so `balance` in the report
/// always equals the current stored balance.
pub fn build_report(
    period: Period,
    range: DateRange,
    current_balance: Decimal,
    by_category: BTreeMap<String, Decimal>,
) -> AggregationReport {
    let by_category: BTreeMap<String, Decimal> = by_category
        .into_iter()
        .map(|(name, sum)| (name, round_money(sum)))
        .collect();
    let get = |name: &str| by_category.get(name).copied().unwrap_or(Decimal::ZERO);

    let spent: Decimal = by_category.values().copied().sum();
    let earned = current_balance + spent;
    let savings = earned - spent;

    let housing = get(HOUSING);
    let fixed_expenses = housing + get(UTILITIES) + get(INSURANCE) + get(SUBSCRIPTIONS);
    let discretionary = get(ENTERTAINMENT) + get(DINING_OUT) + get(TRAVEL);

    let kpis = KpiBlock {
        savings: round_money(savings),
        savings_rate_percent: percent_of(savings, earned),
        fixed_expenses: round_money(fixed_expenses),
        fixed_expense_ratio_percent: percent_of(fixed_expenses, earned),
        discretionary: round_money(discretionary),
        discretionary_ratio_percent: percent_of(discretionary, earned),
        housing_cost_ratio_percent: percent_of(housing, earned),
    };

    AggregationReport {
        period,
        start_date: range.start,
        end_date: range.end,
        earned: round_money(earned),
        spent: round_money(spent),
        balance: round_money(earned - spent),
        expenses_by_category: by_category,
        kpis,
    }
}

/// Sums a user's expenses per category name within `range`.
pub async fn sum_by_category<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    range: DateRange,
) -> Result<BTreeMap<String, Decimal>> {
    let rows = Expense::find_for_user(user_id)
        .filter(expense::Column::Date.gte(range.start))
        .filter(expense::Column::Date.lte(range.end))
        .find_also_related(Category)
        .all(db)
        .await?;

    debug!("Aggregating {} expenses for user {}", rows.len(), user_id);

    let mut sums: BTreeMap<String, Decimal> = BTreeMap::new();
    for (expense, category) in rows {
        match category {
            Some(category) => {
                *sums.entry(category.name).or_insert(Decimal::ZERO) += expense.amount;
            }
            None => {
                warn!(
                    "Expense {} references missing category {}",
                    expense.id, expense.category_id
                );
            }
        }
    }
    Ok(sums)
}

/// Produces the aggregation report for `user_id` over `period`, anchored at `today`.
#[instrument(skip(db))]
pub async fn compute_aggregation<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    period: Period,
    today: NaiveDate,
) -> Result<AggregationReport> {
    let balance = ledger::current_balance(db, user_id).await?;
    let range = period.date_range(today);
    let sums = sum_by_category(db, user_id, range).await?;

    info!(
        "Aggregation for user {} over {} ({} to {}): {} categories",
        user_id,
        period,
        range.start,
        range.end,
        sums.len()
    );

    Ok(build_report(period, range, balance, sums))
}
