use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use model::entities::prelude::User;
use sea_orm::EntityTrait;
use tracing::{debug, warn};

use crate::auth::jwt::decode_token;
use crate::error::ApiError;
use crate::schemas::AppState;

pub const ADMIN_REQUIRED: &str = "Access denied. Admin rights required.";

/// Caller identified by a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Authorization header must use Bearer".to_string()))?;

        let claims = decode_token(token.trim(), &state.config.jwt_secret_key).map_err(|e| {
            debug!("Token rejected: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let user_id = claims
            .user_id()
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
        })
    }
}

/// Authenticated caller whose account carries the admin flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        match User::find_by_id(user.user_id).one(&state.db).await? {
            Some(model) if model.is_admin => Ok(AdminUser(user)),
            Some(_) => {
                warn!("User {} denied admin access", user.user_id);
                Err(ApiError::Forbidden(ADMIN_REQUIRED.to_string()))
            }
            None => Err(ApiError::Unauthorized("User no longer exists".to_string())),
        }
    }
}
