use crate::Period;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Derived ratios over a period. Percentages are rounded to 2 dp and are 0 when nothing was earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
pub struct KpiBlock {
    /// earned - spent
    pub savings: Decimal,
    pub savings_rate_percent: Decimal,
    /// Housing, utilities, insurance and subscriptions
    pub fixed_expenses: Decimal,
    pub fixed_expense_ratio_percent: Decimal,
    /// Entertainment, dining out and travel
    pub discretionary: Decimal,
    pub discretionary_ratio_percent: Decimal,
    pub housing_cost_ratio_percent: Decimal,
}

/// Financial summary of one user over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AggregationReport {
    pub period: Period,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Current balance plus everything spent in the period
    pub earned: Decimal,
    pub spent: Decimal,
    pub balance: Decimal,
    /// Category name to summed amount
    #[schema(value_type = Object)]
    pub expenses_by_category: BTreeMap<String, Decimal>,
    pub kpis: KpiBlock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_report_serializes_dates_as_iso() {
        let mut by_category = BTreeMap::new();
        by_category.insert("Groceries".to_string(), Decimal::from_str("12.50").unwrap());

        let report = AggregationReport {
            period: Period::Month,
            start_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            earned: Decimal::from_str("100.00").unwrap(),
            spent: Decimal::from_str("12.50").unwrap(),
            balance: Decimal::from_str("87.50").unwrap(),
            expenses_by_category: by_category,
            kpis: KpiBlock::default(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["period"], "month");
        assert_eq!(json["start_date"], "2026-10-01");
        assert_eq!(json["end_date"], "2026-10-16");
        assert_eq!(json["expenses_by_category"]["Groceries"], "12.50");
        assert!(json["kpis"]["savings_rate_percent"].is_string());
    }
}
