use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, error, info, trace};

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    let db: DatabaseConnection = match Database::connect(database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    run_migrations(&db).await?;

    info!("Database initialization completed successfully!");
    Ok(())
}

/// Applies every pending migration, including the default category seed.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    trace!("Executing migration up command");
    match Migrator::up(db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
            Ok(())
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::entities::prelude::Category;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_migrations_seed_categories_once() {
        let db = Database::connect("sqlite::memory:").await.expect("connect");
        run_migrations(&db).await.expect("first run");
        run_migrations(&db).await.expect("second run is a no-op");

        let count = Category::find().count(&db).await.expect("count");
        assert_eq!(count as usize, migration::DEFAULT_CATEGORIES.len());
    }
}
