pub mod aggregation;
pub mod auth;
pub mod categories;
pub mod expenses;
pub mod health;
pub mod password_reset;
pub mod receipts;
pub mod shared_config;
pub mod users;
