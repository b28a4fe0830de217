pub mod export_openapi;
pub mod grant_admin;
pub mod initdb;
pub mod migrate_and_serve;
pub mod serve;

pub use export_openapi::export_openapi;
pub use grant_admin::grant_admin;
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use serve::serve;
