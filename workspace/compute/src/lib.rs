pub mod aggregation;
pub mod error;
pub mod ledger;

use rust_decimal::Decimal;

pub use aggregation::{build_report, compute_aggregation};
pub use error::{ComputeError, Result};

/// Rounds a monetary value to cents and fixes the scale at 2, so `1950` renders as `1950.00`.
///
/// SQLite hands decimals back through `f64`, which can leave noise in the low digits;
/// every amount leaving this crate goes through here.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
pub(crate) mod test_utils {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use model::entities::{expense, user};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

    pub async fn setup_db() -> DatabaseConnection {
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::WARN)
            .try_init();

        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    pub async fn insert_user(
        db: &DatabaseConnection,
        username: &str,
        balance: Decimal,
        salary: Decimal,
        last_payday: Option<NaiveDate>,
    ) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set("not-a-hash".to_string()),
            email: Set(None),
            balance: Set(balance),
            salary: Set(salary),
            last_payday: Set(last_payday),
            is_admin: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn insert_expense<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        category_id: i32,
        amount: Decimal,
        date: NaiveDate,
    ) -> expense::Model {
        expense::ActiveModel {
            user_id: Set(user_id),
            category_id: Set(category_id),
            description: Set("test".to_string()),
            amount: Set(amount),
            date: Set(date),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_fixes_scale() {
        assert_eq!(round_money(Decimal::new(1950, 0)).to_string(), "1950.00");
        assert_eq!(round_money("1949.999999".parse().unwrap()).to_string(), "1950.00");
        assert_eq!(round_money("12.345".parse().unwrap()).to_string(), "12.34");
        assert_eq!(round_money("-0.5".parse().unwrap()).to_string(), "-0.50");
    }
}
