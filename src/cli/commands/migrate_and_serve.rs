use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use tracing::{debug, error, info, trace};

use super::serve::run_server;
use crate::config::{initialize_app_state, AppConfig};

pub async fn migrate_and_serve(config: AppConfig) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    let bind_address = config.bind_address.clone();

    // The pool in the state is reused for migrations.
    trace!("Initializing application state");
    let state = match initialize_app_state(config).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    info!("Running database migrations");
    match Migrator::up(&state.db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    run_server(state, &bind_address).await
}
