use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The user whose balance is being read or moved does not exist
    #[error("User {0} not found")]
    UserNotFound(i32),

    /// Period keyword outside month|quarter|year
    #[error("Invalid period, use month|quarter|year")]
    InvalidPeriod(#[from] common::ParsePeriodError),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
