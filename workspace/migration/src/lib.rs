pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_tables;
mod m20250101_000002_seed_default_categories;

pub use m20250101_000002_seed_default_categories::DEFAULT_CATEGORIES;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_tables::Migration),
            Box::new(m20250101_000002_seed_default_categories::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, Database, DbBackend, Statement};

    async fn table_count(db: &sea_orm::DatabaseConnection, table: &str) -> i64 {
        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                format!("SELECT COUNT(*) AS n FROM {table}"),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get::<i64>("", "n").unwrap()
    }

    #[tokio::test]
    async fn test_up_and_down() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        Migrator::up(&db, None).await.unwrap();
        let manager = SchemaManager::new(&db);
        for table in ["users", "categories", "expenses", "shared_config", "password_resets"] {
            assert!(manager.has_table(table).await.unwrap(), "missing table {table}");
        }
        assert_eq!(
            table_count(&db, "categories").await,
            DEFAULT_CATEGORIES.len() as i64
        );

        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("users").await.unwrap());
        assert!(!manager.has_table("expenses").await.unwrap());
    }
}
