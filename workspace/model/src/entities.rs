//! Root of the SeaORM entity modules for the household budget service.
//! Users own expenses, expenses are filed under global categories, and a
//! small key/value table holds shared constants such as the rent.

pub mod category;
pub mod expense;
pub mod password_reset;
pub mod shared_config;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::category::Entity as Category;
    pub use super::expense::Entity as Expense;
    pub use super::password_reset::Entity as PasswordReset;
    pub use super::shared_config::Entity as SharedConfig;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn insert_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set("hash".to_string()),
            email: Set(None),
            balance: Set(Decimal::ZERO),
            salary: Set(Decimal::new(2000, 0)),
            last_payday: Set(None),
            is_admin: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_default_categories_are_seeded() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let names: Vec<String> = Category::find()
            .all(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        for expected in [
            "Rent / Mortgage",
            "Utilities",
            "Insurance",
            "Subscriptions",
            "Entertainment",
            "Dining Out",
            "Travel",
            "Groceries",
            "Transport",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let user1 = insert_user(&db, "user1").await?;
        let user2 = insert_user(&db, "user2").await?;

        let groceries = Category::find_by_name("Groceries")
            .one(&db)
            .await?
            .expect("seeded category");

        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        for (owner, amount) in [(&user1, 1250), (&user1, 499), (&user2, 100)] {
            expense::ActiveModel {
                user_id: Set(owner.id),
                category_id: Set(groceries.id),
                description: Set("Weekly shop".to_string()),
                amount: Set(Decimal::new(amount, 2)),
                date: Set(date),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        let user1_expenses = Expense::find_for_user(user1.id).all(&db).await?;
        assert_eq!(user1_expenses.len(), 2);
        assert_eq!(groceries.expense_count(&db).await?, 3);

        // Related lookup from the expense side
        let (_, category) = Expense::find()
            .filter(expense::Column::UserId.eq(user2.id))
            .find_also_related(Category)
            .one(&db)
            .await?
            .expect("expense of user2");
        assert_eq!(category.map(|c| c.name), Some("Groceries".to_string()));

        // Category in use cannot be deleted
        assert!(groceries.clone().delete(&db).await.is_err());

        // Deleting a user removes their expenses
        user1.delete(&db).await?;
        assert_eq!(Expense::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_shared_config_and_password_reset() -> Result<(), DbErr> {
        let db = setup_db().await?;

        shared_config::ActiveModel {
            key: Set(shared_config::RENT_KEY.to_string()),
            value: Set(Decimal::new(120000, 2)),
        }
        .insert(&db)
        .await?;

        let rent = SharedConfig::find_by_id(shared_config::RENT_KEY.to_string())
            .one(&db)
            .await?
            .expect("rent row");
        assert_eq!(rent.value, Decimal::new(1200, 0));

        let now = Utc::now();
        let reset = password_reset::ActiveModel {
            email: Set("a@example.com".to_string()),
            code: Set("123456".to_string()),
            expires_at: Set(now + chrono::Duration::minutes(10)),
            created_at: Set(now),
        }
        .insert(&db)
        .await?;
        assert!(!reset.is_expired(now));
        assert!(reset.is_expired(now + chrono::Duration::minutes(11)));

        let found = PasswordReset::find_by_id("a@example.com".to_string())
            .one(&db)
            .await?;
        assert_eq!(found.map(|r| r.code), Some("123456".to_string()));
        Ok(())
    }
}
