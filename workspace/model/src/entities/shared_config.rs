use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Key under which the household rent is stored. Split evenly across users on payday.
pub const RENT_KEY: &str = "Rent";

/// Shared financial constant, administered through `/tba_sio`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shared_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub value: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
