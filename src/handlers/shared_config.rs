use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use compute::round_money;
use model::entities::{prelude::SharedConfig, shared_config};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AdminUser;
use crate::error::{conflict_on_unique, ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::schemas::{ApiResponse, AppState};

const KEY_EXISTS: &str = "Key already exists";

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateSharedConfigRequest {
    /// e.g. `Rent`
    pub key: Option<String>,
    pub value: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateSharedConfigRequest {
    pub value: Option<Decimal>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct SharedConfigResponse {
    pub key: String,
    pub value: Decimal,
}

impl From<shared_config::Model> for SharedConfigResponse {
    fn from(model: shared_config::Model) -> Self {
        Self {
            key: model.key,
            value: round_money(model.value),
        }
    }
}

fn key_not_found(key: &str) -> ApiError {
    warn!("Shared config key '{}' not found", key);
    ApiError::NotFound("Key not found".to_string())
}

/// Create a shared configuration entry
#[utoipa::path(
    post,
    path = "/tba_sio",
    tag = "shared_config",
    security(("bearer_auth" = [])),
    request_body = CreateSharedConfigRequest,
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<SharedConfigResponse>),
        (status = 400, description = "Key and value are required", body = crate::schemas::ErrorResponse),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Key already exists", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_entry(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateSharedConfigRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SharedConfigResponse>>)> {
    trace!("Entering create_entry function");
    let key = request.key.as_deref().map(str::trim).filter(|k| !k.is_empty());
    let (Some(key), Some(value)) = (key, request.value) else {
        return Err(ApiError::bad_request("Key and value are required"));
    };

    if SharedConfig::find_by_id(key).one(&state.db).await?.is_some() {
        return Err(ApiError::Conflict(KEY_EXISTS.to_string()));
    }

    let entry = shared_config::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value),
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, KEY_EXISTS))?;

    info!("Shared config '{}' set to {}", entry.key, entry.value);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SharedConfigResponse::from(entry),
            message: "Entry created".to_string(),
            success: true,
        }),
    ))
}

/// List all shared configuration entries
#[utoipa::path(
    get,
    path = "/tba_sio",
    tag = "shared_config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Entries retrieved", body = ApiResponse<Vec<SharedConfigResponse>>),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_entries(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<ApiResponse<Vec<SharedConfigResponse>>>> {
    let entries = SharedConfig::find()
        .order_by_asc(shared_config::Column::Key)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse {
        data: entries.into_iter().map(SharedConfigResponse::from).collect(),
        message: "Entries retrieved".to_string(),
        success: true,
    }))
}

/// Get a shared configuration entry by key
#[utoipa::path(
    get,
    path = "/tba_sio/{key}",
    tag = "shared_config",
    security(("bearer_auth" = [])),
    params(
        ("key" = String, Path, description = "Entry key"),
    ),
    responses(
        (status = 200, description = "Entry retrieved", body = ApiResponse<SharedConfigResponse>),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Key not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_entry(
    Path(key): Path<String>,
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<ApiResponse<SharedConfigResponse>>> {
    let entry = SharedConfig::find_by_id(key.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| key_not_found(&key))?;

    Ok(Json(ApiResponse {
        data: SharedConfigResponse::from(entry),
        message: "Entry retrieved".to_string(),
        success: true,
    }))
}

/// Change the value of a shared configuration entry
#[utoipa::path(
    put,
    path = "/tba_sio/{key}",
    tag = "shared_config",
    security(("bearer_auth" = [])),
    params(
        ("key" = String, Path, description = "Entry key"),
    ),
    request_body = UpdateSharedConfigRequest,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<SharedConfigResponse>),
        (status = 400, description = "Value is required", body = crate::schemas::ErrorResponse),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Key not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_entry(
    Path(key): Path<String>,
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(request): ValidatedJson<UpdateSharedConfigRequest>,
) -> ApiResult<Json<ApiResponse<SharedConfigResponse>>> {
    let Some(value) = request.value else {
        return Err(ApiError::bad_request("Value is required"));
    };

    let existing = SharedConfig::find_by_id(key.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| key_not_found(&key))?;

    let mut active: shared_config::ActiveModel = existing.into();
    active.value = Set(value);
    let updated = active.update(&state.db).await?;

    info!(
        "Shared config '{}' changed to {} by admin {}",
        updated.key, updated.value, admin.0.user_id
    );
    Ok(Json(ApiResponse {
        data: SharedConfigResponse::from(updated),
        message: "Entry updated".to_string(),
        success: true,
    }))
}

/// Delete a shared configuration entry
#[utoipa::path(
    delete,
    path = "/tba_sio/{key}",
    tag = "shared_config",
    security(("bearer_auth" = [])),
    params(
        ("key" = String, Path, description = "Entry key"),
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Key not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_entry(
    Path(key): Path<String>,
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<StatusCode> {
    let result = SharedConfig::delete_by_id(key.clone()).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(key_not_found(&key));
    }

    info!("Shared config '{}' deleted by admin {}", key, admin.0.user_id);
    Ok(StatusCode::NO_CONTENT)
}
