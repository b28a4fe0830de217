use sea_orm::entity::prelude::*;

/// A global expense category such as "Groceries" or "Rent / Mortgage".
/// Categories are shared by every user; names are unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    pub fn find_by_name(name: &str) -> Select<Entity> {
        Self::find().filter(Column::Name.eq(name))
    }
}

impl Model {
    /// Number of expenses (of any user) filed under this category.
    pub async fn expense_count<C: ConnectionTrait>(&self, db: &C) -> Result<u64, DbErr> {
        let count = super::expense::Entity::find()
            .filter(super::expense::Column::CategoryId.eq(self.id))
            .count(db)
            .await?;
        tracing::trace!("Category {} is referenced by {} expenses", self.id, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::SqliteQueryBuilder;
    use sea_orm::{Database, DatabaseConnection, DbBackend, Schema, Set, Statement};

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        let schema = Schema::new(DbBackend::Sqlite);
        let stmt = schema.create_table_from_entity(Entity);
        let statement =
            Statement::from_string(DbBackend::Sqlite, stmt.to_string(SqliteQueryBuilder));
        db.execute(statement).await.unwrap();

        db
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let db = setup_test_db().await;

        ActiveModel {
            name: Set("Groceries".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let found = Entity::find_by_name("Groceries").one(&db).await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("Groceries".to_string()));

        let missing = Entity::find_by_name("groceries").one(&db).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_name_is_unique() {
        let db = setup_test_db().await;

        let first = ActiveModel {
            name: Set("Travel".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(first.is_ok());

        let second = ActiveModel {
            name: Set("Travel".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(second.is_err());
        assert_eq!(Entity::find().count(&db).await.unwrap(), 1);
    }
}
