use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Password))
                    .col(string_null(Users::Email).unique_key())
                    .col(decimal_len(Users::Balance, 16, 4).default(0))
                    .col(decimal_len(Users::Salary, 16, 4).default(0))
                    .col(date_null(Users::LastPayday))
                    .col(boolean(Users::IsAdmin).default(false))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string(Categories::Name).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create expenses table
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(pk_auto(Expenses::Id))
                    .col(integer(Expenses::UserId))
                    .col(integer(Expenses::CategoryId))
                    .col(string(Expenses::Description))
                    .col(decimal_len(Expenses::Amount, 16, 4))
                    .col(date(Expenses::Date))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_user")
                            .from(Expenses::Table, Expenses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_category")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_user_date")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        // Create shared_config table
        manager
            .create_table(
                Table::create()
                    .table(SharedConfig::Table)
                    .if_not_exists()
                    .col(string(SharedConfig::Key).primary_key())
                    .col(decimal_len(SharedConfig::Value, 16, 4))
                    .to_owned(),
            )
            .await?;

        // Create password_resets table
        manager
            .create_table(
                Table::create()
                    .table(PasswordResets::Table)
                    .if_not_exists()
                    .col(string(PasswordResets::Email).primary_key())
                    .col(string_len(PasswordResets::Code, 6))
                    .col(timestamp_with_time_zone(PasswordResets::ExpiresAt))
                    .col(timestamp_with_time_zone(PasswordResets::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation
        manager
            .drop_table(Table::drop().table(PasswordResets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SharedConfig::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

// Define identifiers for all tables
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    Email,
    Balance,
    Salary,
    LastPayday,
    IsAdmin,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Categories {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    UserId,
    CategoryId,
    Description,
    Amount,
    Date,
}

#[derive(DeriveIden)]
enum SharedConfig {
    #[sea_orm(iden = "shared_config")]
    Table,
    Key,
    Value,
}

#[derive(DeriveIden)]
enum PasswordResets {
    Table,
    Email,
    Code,
    ExpiresAt,
    CreatedAt,
}
