use anyhow::{anyhow, Result};
use model::entities::{prelude::User, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, Set};
use tracing::{debug, error, info, trace};

pub async fn grant_admin(database_url: &str, username: &str, is_admin: bool) -> Result<()> {
    trace!("Entering grant_admin function");
    let db = match Database::connect(database_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    set_admin_flag(&db, username, is_admin).await?;
    if is_admin {
        info!("User '{}' is now an administrator", username);
    } else {
        info!("Administrator rights revoked from '{}'", username);
    }
    Ok(())
}

pub(crate) async fn set_admin_flag<C: ConnectionTrait>(
    db: &C,
    username: &str,
    is_admin: bool,
) -> Result<user::Model> {
    let existing = User::find_by_username(username)
        .one(db)
        .await?
        .ok_or_else(|| anyhow!("User '{}' not found", username))?;
    debug!("Setting is_admin={} for user {}", is_admin, existing.id);

    let mut active: user::ActiveModel = existing.into();
    active.is_admin = Set(is_admin);
    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::{insert_test_user, setup_test_db};

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let db = setup_test_db().await;
        insert_test_user(&db, "carol").await;

        let updated = set_admin_flag(&db, "carol", true).await.expect("grant");
        assert!(updated.is_admin);
        let updated = set_admin_flag(&db, "carol", false).await.expect("revoke");
        assert!(!updated.is_admin);
    }

    #[tokio::test]
    async fn test_unknown_user_is_an_error() {
        let db = setup_test_db().await;
        let err = set_admin_flag(&db, "nobody", true).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
