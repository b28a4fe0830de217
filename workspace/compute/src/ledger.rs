//! Balance bookkeeping for users.
//!
//! The balance moves for two reasons only: the monthly payday (salary minus the
//! user's share of the shared rent) and expense mutations. Every mutation is a
//! single `balance = balance + delta` statement so concurrent requests cannot
//! lose each other's updates.

use chrono::{Datelike, NaiveDate};
use model::entities::{prelude::*, shared_config, user};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ComputeError, Result};
use crate::round_money;

/// Whether the salary should be credited on `today`.
///
/// Due when no payday was ever applied, or when `last_payday` lies in an
/// earlier year or an earlier month number. The month comparison ignores the
/// year, so a `last_payday` of 2027-03 evaluated on 2026-10 is also due.
pub fn is_payday_due(last_payday: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_payday {
        None => true,
        Some(last) => last.year() < today.year() || last.month() < today.month(),
    }
}

/// Each user's part of the shared rent, rounded to cents. Zero when nobody is registered.
pub fn per_user_rent(rent: Decimal, user_count: u64) -> Decimal {
    if user_count == 0 {
        return Decimal::ZERO;
    }
    rent.checked_div(Decimal::from(user_count))
        .map(round_money)
        .unwrap_or(Decimal::ZERO)
}

/// Balance change caused by recording a new expense.
pub fn expense_create_delta(amount: Decimal) -> Decimal {
    -amount
}

/// Balance change caused by changing an expense amount from `old_amount` to `new_amount`.
pub fn expense_update_delta(old_amount: Decimal, new_amount: Decimal) -> Decimal {
    old_amount - new_amount
}

/// Balance change caused by deleting an expense.
pub fn expense_delete_delta(amount: Decimal) -> Decimal {
    amount
}

/// Reads the stored balance of a user.
pub async fn current_balance<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Decimal> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .map(|u| round_money(u.balance))
        .ok_or(ComputeError::UserNotFound(user_id))
}

/// Adds `delta` to the user's balance in one statement and returns the new balance.
#[instrument(skip(db))]
pub async fn adjust_balance<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    delta: Decimal,
) -> Result<Decimal> {
    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(delta),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("Balance adjustment for missing user {}", user_id);
        return Err(ComputeError::UserNotFound(user_id));
    }

    let balance = current_balance(db, user_id).await?;
    trace!("Balance of user {} moved by {} to {}", user_id, delta, balance);
    Ok(balance)
}

/// Debits a newly created expense.
pub async fn apply_expense_create<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    amount: Decimal,
) -> Result<Decimal> {
    adjust_balance(db, user_id, expense_create_delta(amount)).await
}

/// Re-balances after an expense amount changed.
pub async fn apply_expense_update<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    old_amount: Decimal,
    new_amount: Decimal,
) -> Result<Decimal> {
    adjust_balance(db, user_id, expense_update_delta(old_amount, new_amount)).await
}

/// Credits back a deleted expense.
pub async fn apply_expense_delete<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    amount: Decimal,
) -> Result<Decimal> {
    adjust_balance(db, user_id, expense_delete_delta(amount)).await
}

/// Credits salary minus the per-user rent share once per calendar month.
///
/// The update only matches while `last_payday` still holds the value read
/// here. When another request applied the payday first, nothing is written
/// and the balance it produced is returned.
#[instrument(skip(db))]
pub async fn apply_monthly_payday<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    today: NaiveDate,
) -> Result<Decimal> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(ComputeError::UserNotFound(user_id))?;

    if !is_payday_due(user.last_payday, today) {
        trace!(
            "Payday not due for user {} (last payday {:?})",
            user_id, user.last_payday
        );
        return Ok(round_money(user.balance));
    }

    let rent = SharedConfig::find_by_id(shared_config::RENT_KEY.to_string())
        .one(db)
        .await?
        .map(|r| r.value)
        .unwrap_or(Decimal::ZERO);
    let user_count = User::find().count(db).await?;
    let rent_share = per_user_rent(rent, user_count);
    let delta = user.salary - rent_share;

    debug!(
        "Applying payday for user {}: salary {} rent share {} ({} users)",
        user_id, user.salary, rent_share, user_count
    );

    let mut update = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(delta),
        )
        .col_expr(user::Column::LastPayday, Expr::value(today))
        .filter(user::Column::Id.eq(user_id));
    update = match user.last_payday {
        Some(last) => update.filter(user::Column::LastPayday.eq(last)),
        None => update.filter(user::Column::LastPayday.is_null()),
    };
    let result = update.exec(db).await?;

    if result.rows_affected == 0 {
        info!("Payday for user {} was applied concurrently", user_id);
    } else {
        info!("Payday applied for user {} on {}", user_id, today);
    }

    current_balance(db, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, dec, insert_expense, insert_user, setup_db};
    use model::entities::category;
    use sea_orm::{ActiveModelTrait, Set};

    #[test]
    fn test_payday_due_without_previous_payday() {
        assert!(is_payday_due(None, date(2026, 10, 16)));
    }

    #[test]
    fn test_payday_not_due_in_same_month() {
        assert!(!is_payday_due(Some(date(2026, 10, 1)), date(2026, 10, 16)));
        assert!(!is_payday_due(Some(date(2026, 10, 16)), date(2026, 10, 16)));
    }

    #[test]
    fn test_payday_due_in_later_month() {
        assert!(is_payday_due(Some(date(2026, 9, 30)), date(2026, 10, 1)));
    }

    #[test]
    fn test_payday_due_across_year_boundary() {
        assert!(is_payday_due(Some(date(2025, 12, 31)), date(2026, 1, 1)));
    }

    #[test]
    fn test_payday_due_compares_month_numbers_regardless_of_year() {
        // A last payday in a later year but an earlier month still counts as due.
        assert!(is_payday_due(Some(date(2027, 3, 1)), date(2026, 10, 16)));
        assert!(!is_payday_due(Some(date(2027, 11, 1)), date(2026, 10, 16)));
    }

    #[test]
    fn test_per_user_rent() {
        assert_eq!(per_user_rent(dec("1200"), 3), dec("400.00"));
        assert_eq!(per_user_rent(dec("1000"), 3), dec("333.33"));
        assert_eq!(per_user_rent(dec("1000"), 0), Decimal::ZERO);
        assert_eq!(per_user_rent(Decimal::ZERO, 5), Decimal::ZERO);
    }

    #[test]
    fn test_expense_deltas() {
        assert_eq!(expense_create_delta(dec("50")), dec("-50"));
        assert_eq!(expense_update_delta(dec("50"), dec("80")), dec("-30"));
        assert_eq!(expense_update_delta(dec("80"), dec("50")), dec("30"));
        assert_eq!(expense_delete_delta(dec("50")), dec("50"));
    }

    #[tokio::test]
    async fn test_first_payday_sets_last_payday_and_credits_salary() {
        let db = setup_db().await;
        let user = insert_user(&db, "alice", Decimal::ZERO, dec("2000"), None).await;
        let today = date(2026, 10, 16);

        let balance = apply_monthly_payday(&db, user.id, today).await.unwrap();
        assert_eq!(balance, dec("2000.00"));

        let stored = User::find_by_id(user.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.last_payday, Some(today));
    }

    #[tokio::test]
    async fn test_payday_is_applied_once_per_month() {
        let db = setup_db().await;
        let user = insert_user(&db, "alice", Decimal::ZERO, dec("2000"), None).await;

        apply_monthly_payday(&db, user.id, date(2026, 10, 1)).await.unwrap();
        let balance = apply_monthly_payday(&db, user.id, date(2026, 10, 20))
            .await
            .unwrap();
        assert_eq!(balance, dec("2000.00"));

        let balance = apply_monthly_payday(&db, user.id, date(2026, 11, 1))
            .await
            .unwrap();
        assert_eq!(balance, dec("4000.00"));
    }

    #[tokio::test]
    async fn test_payday_subtracts_rent_share() {
        let db = setup_db().await;
        let alice = insert_user(&db, "alice", dec("100"), dec("2000"), None).await;
        insert_user(&db, "bob", Decimal::ZERO, dec("1500"), None).await;

        shared_config::ActiveModel {
            key: Set(shared_config::RENT_KEY.to_string()),
            value: Set(dec("1200")),
        }
        .insert(&db)
        .await
        .unwrap();

        let balance = apply_monthly_payday(&db, alice.id, date(2026, 10, 16))
            .await
            .unwrap();
        // 100 + 2000 - 1200 / 2
        assert_eq!(balance, dec("1500.00"));
    }

    #[tokio::test]
    async fn test_payday_for_missing_user() {
        let db = setup_db().await;
        let err = apply_monthly_payday(&db, 42, date(2026, 10, 16))
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::UserNotFound(42)));
    }

    #[tokio::test]
    async fn test_payday_recorded_by_another_request_is_respected() {
        let db = setup_db().await;
        let user = insert_user(&db, "alice", Decimal::ZERO, dec("2000"), None).await;
        let today = date(2026, 10, 16);

        // Another request already credited this month.
        User::update_many()
            .col_expr(user::Column::LastPayday, Expr::value(today))
            .col_expr(user::Column::Balance, Expr::value(dec("2000")))
            .filter(user::Column::Id.eq(user.id))
            .exec(&db)
            .await
            .unwrap();

        let balance = apply_monthly_payday(&db, user.id, today).await.unwrap();
        assert_eq!(balance, dec("2000.00"));
    }

    #[tokio::test]
    async fn test_expense_mutations_move_balance() {
        let db = setup_db().await;
        let user = insert_user(&db, "alice", dec("2000"), Decimal::ZERO, None).await;

        let balance = apply_expense_create(&db, user.id, dec("50.00")).await.unwrap();
        assert_eq!(balance, dec("1950.00"));

        let balance = apply_expense_update(&db, user.id, dec("50.00"), dec("75.25"))
            .await
            .unwrap();
        assert_eq!(balance, dec("1924.75"));

        let balance = apply_expense_delete(&db, user.id, dec("75.25")).await.unwrap();
        assert_eq!(balance, dec("2000.00"));
    }

    #[tokio::test]
    async fn test_balance_may_go_negative() {
        let db = setup_db().await;
        let user = insert_user(&db, "alice", dec("10"), Decimal::ZERO, None).await;

        let balance = apply_expense_create(&db, user.id, dec("25.50")).await.unwrap();
        assert_eq!(balance, dec("-15.50"));
    }

    #[tokio::test]
    async fn test_adjust_balance_for_missing_user() {
        let db = setup_db().await;
        let err = adjust_balance(&db, 7, dec("1")).await.unwrap_err();
        assert!(matches!(err, ComputeError::UserNotFound(7)));
    }

    #[tokio::test]
    async fn test_adjustment_rolls_back_with_transaction() {
        use sea_orm::TransactionTrait;

        let db = setup_db().await;
        let user = insert_user(&db, "alice", dec("100"), Decimal::ZERO, None).await;
        let groceries = category::Entity::find_by_name("Groceries")
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        let txn = db.begin().await.unwrap();
        apply_expense_create(&txn, user.id, dec("40")).await.unwrap();
        txn.rollback().await.unwrap();
        assert_eq!(current_balance(&db, user.id).await.unwrap(), dec("100.00"));

        let txn = db.begin().await.unwrap();
        insert_expense(&txn, user.id, groceries.id, dec("40"), date(2026, 10, 1)).await;
        apply_expense_create(&txn, user.id, dec("40")).await.unwrap();
        txn.commit().await.unwrap();
        assert_eq!(current_balance(&db, user.id).await.unwrap(), dec("60.00"));
    }
}
