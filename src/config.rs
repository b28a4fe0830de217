use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::mail::{LogMailer, SendEmail, SmtpMailer};
use crate::receipts::PlaceholderScanner;
use crate::schemas::AppState;

pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Runtime settings, layered as defaults < `homebudget.toml` < environment.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret_key: String,
    /// Lifetime of issued access tokens
    pub token_ttl_minutes: i64,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    /// SMTP relay; mail is only logged when unset
    pub email_host: Option<String>,
    pub email_port: u16,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub email_from: String,
    /// Root directory for uploaded receipts
    pub upload_dir: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret_key", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("email_host", &self.email_host)
            .field("email_port", &self.email_port)
            .field("email_user", &self.email_user)
            .field("email_pass", &self.email_pass.as_ref().map(|_| "<redacted>"))
            .field("email_from", &self.email_from)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl AppConfig {
    /// Loads configuration from `.env`, an optional `homebudget.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: AppConfig = Config::builder()
            .set_default("database_url", "sqlite://homebudget.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("jwt_secret_key", DEFAULT_JWT_SECRET)?
            .set_default("token_ttl_minutes", 24 * 60)?
            .set_default("argon2_memory_kib", 19 * 1024)?
            .set_default("argon2_iterations", 2)?
            .set_default("email_port", 587)?
            .set_default("email_from", "HomeBudget <no-reply@homebudget.local>")?
            .set_default("upload_dir", "uploads")?
            .add_source(File::with_name("homebudget").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.jwt_secret_key == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET_KEY is not set, using the built-in development secret");
        }
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Applies command line overrides on top of the loaded values.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
        self
    }
}

/// Picks the SMTP mailer when a relay is configured, otherwise a mailer that only logs.
pub fn build_mailer(config: &AppConfig) -> Result<Arc<dyn SendEmail>> {
    match SmtpMailer::from_config(config)? {
        Some(mailer) => {
            info!("Email delivery through {:?}", config.email_host);
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("EMAIL_HOST is not set, outgoing email will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Connects to the configured database and assembles the shared state.
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;
    let mailer = build_mailer(&config)?;

    Ok(AppState {
        db,
        config: Arc::new(config),
        mailer,
        scanner: Arc::new(PlaceholderScanner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::test_config;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let config = test_config().with_overrides(None, Some("127.0.0.1:9000".to_string()));
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.database_url, test_config().database_url);
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let mut config = test_config();
        config.email_pass = Some("hunter2".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains(&config.jwt_secret_key));
        assert!(rendered.contains("<redacted>"));
    }
}
