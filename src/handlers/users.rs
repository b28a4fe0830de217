use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use compute::{ledger, round_money};
use model::entities::{prelude::User, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::password::{ensure_strong_password, hash_password};
use crate::auth::{AdminUser, AuthUser};
use crate::error::{conflict_on_unique, ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::schemas::{ApiResponse, AppState};

/// User as seen by administrators
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub balance: Decimal,
    pub salary: Decimal,
    pub last_payday: Option<NaiveDate>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            balance: round_money(model.balance),
            salary: round_money(model.salary),
            last_payday: model.last_payday,
            is_admin: model.is_admin,
            created_at: model.created_at,
        }
    }
}

/// The authenticated user's own view, after payday was applied
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: i32,
    pub username: String,
    pub balance: Decimal,
    pub salary: Decimal,
    pub last_payday: Option<NaiveDate>,
}

/// Request body for creating a user as an administrator
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150, message = "Username and password required"))]
    pub username: String,
    pub password: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub balance: Option<Decimal>,
    pub salary: Option<Decimal>,
    pub is_admin: Option<bool>,
}

/// Request body for updating a user; at least one field must be present
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    pub balance: Option<Decimal>,
    pub salary: Option<Decimal>,
    pub password: Option<String>,
    /// YYYY-MM-DD
    pub last_payday: Option<NaiveDate>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

impl UpdateUserRequest {
    fn is_empty(&self) -> bool {
        self.balance.is_none()
            && self.salary.is_none()
            && self.password.is_none()
            && self.last_payday.is_none()
            && self.email.is_none()
            && self.is_admin.is_none()
    }
}

/// Current user, crediting the monthly payday when due
#[utoipa::path(
    get,
    path = "/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = ApiResponse<MeResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::schemas::ErrorResponse),
        (status = 404, description = "User not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ApiResponse<MeResponse>>> {
    trace!("Entering me function for user_id: {}", auth.user_id);
    let today = Utc::now().date_naive();
    let balance = ledger::apply_monthly_payday(&state.db, auth.user_id, today).await?;

    let user_model = User::find_by_id(auth.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    debug!("User {} balance after payday check: {}", auth.user_id, balance);
    Ok(Json(ApiResponse {
        data: MeResponse {
            user_id: user_model.id,
            username: user_model.username,
            balance,
            salary: round_money(user_model.salary),
            last_payday: user_model.last_payday,
        },
        message: "You are authenticated!".to_string(),
        success: true,
    }))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Missing or invalid token", body = crate::schemas::ErrorResponse),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<ApiResponse<Vec<UserResponse>>>> {
    trace!("Entering get_users function");
    let users = User::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} users", users.len());
    Ok(Json(ApiResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
        message: "Users retrieved successfully".to_string(),
        success: true,
    }))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    trace!("Entering create_user function");
    ensure_strong_password(&request.password)?;

    if User::find_by_username(&request.username)
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        password: Set(hash_password(&request.password, &state.config).await?),
        email: Set(request.email.clone()),
        balance: Set(request.balance.unwrap_or(Decimal::ZERO)),
        salary: Set(request.salary.unwrap_or(Decimal::ZERO)),
        last_payday: Set(None),
        is_admin: Set(request.is_admin.unwrap_or(false)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user_model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, "Username or email already exists"))?;

    info!(
        "User created successfully with ID: {}, username: {}",
        user_model.id, user_model.username
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: UserResponse::from(user_model),
            message: "User created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "User not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    trace!("Entering get_user function for user_id: {}", user_id);
    let user_model = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("User with ID {} not found", user_id);
            ApiError::NotFound("User not found".to_string())
        })?;

    Ok(Json(ApiResponse {
        data: UserResponse::from(user_model),
        message: "User retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "No valid fields provided", body = crate::schemas::ErrorResponse),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "User not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    admin: AdminUser,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    trace!("Entering update_user function for user_id: {}", user_id);
    if request.is_empty() {
        return Err(ApiError::bad_request("No valid fields provided"));
    }

    let existing = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(balance) = request.balance {
        active.balance = Set(balance);
    }
    if let Some(salary) = request.salary {
        active.salary = Set(salary);
    }
    if let Some(password) = request.password.as_deref() {
        ensure_strong_password(password)?;
        active.password = Set(hash_password(password, &state.config).await?);
    }
    if let Some(last_payday) = request.last_payday {
        active.last_payday = Set(Some(last_payday));
    }
    if let Some(email) = request.email.clone() {
        active.email = Set(Some(email));
    }
    if let Some(is_admin) = request.is_admin {
        active.is_admin = Set(is_admin);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

    info!("User {} updated by admin {}", user_id, admin.0.user_id);
    Ok(Json(ApiResponse {
        data: UserResponse::from(updated),
        message: "User updated".to_string(),
        success: true,
    }))
}

/// Delete a user together with their expenses
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 403, description = "Admin rights required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "User not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_user function for user_id: {}", user_id);
    let result = User::delete_by_id(user_id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        warn!("User with ID {} not found for deletion", user_id);
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("User {} deleted by admin {}", user_id, admin.0.user_id);
    Ok(StatusCode::NO_CONTENT)
}
