use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_tables::Categories;

/// Categories every installation starts with. The aggregation KPIs look up
/// several of these by exact name.
pub const DEFAULT_CATEGORIES: [&str; 9] = [
    "Rent / Mortgage",
    "Utilities",
    "Insurance",
    "Subscriptions",
    "Entertainment",
    "Dining Out",
    "Travel",
    "Groceries",
    "Transport",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(Categories::Table)
            .columns([Categories::Name])
            .on_conflict(OnConflict::column(Categories::Name).do_nothing().to_owned());
        for name in DEFAULT_CATEGORIES {
            insert
                .values([name.into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Categories::Table)
            .and_where(Expr::col(Categories::Name).is_in(DEFAULT_CATEGORIES))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
