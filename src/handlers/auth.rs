use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use model::entities::{prelude::User, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password::{ensure_strong_password, hash_password, verify_password};
use crate::error::{conflict_on_unique, ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::handlers::users::UserResponse;
use crate::schemas::{ApiResponse, AppState};

/// Request body for self-registration
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username and password required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Username and password required"))]
    pub password: String,
    /// Used for password reset
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username and password required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Username and password required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing fields or weak password", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    trace!("Entering register function");
    ensure_strong_password(&request.password)?;

    if User::find_by_username(&request.username)
        .one(&state.db)
        .await?
        .is_some()
    {
        warn!("Registration with taken username '{}'", request.username);
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    if let Some(email) = request.email.as_deref() {
        if User::find_by_email(email).one(&state.db).await?.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
    }

    let password_hash = hash_password(&request.password, &state.config).await?;
    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        password: Set(password_hash),
        email: Set(request.email.clone()),
        balance: Set(Decimal::ZERO),
        salary: Set(Decimal::ZERO),
        last_payday: Set(None),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user_model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, "Username already exists"))?;

    info!(
        "User registered with ID: {}, username: {}",
        user_model.id, user_model.username
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: UserResponse::from(user_model),
            message: "User registered successfully".to_string(),
            success: true,
        }),
    ))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Missing fields", body = crate::schemas::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    trace!("Entering login function");
    debug!("Login attempt for '{}'", request.username);

    let candidate = User::find_by_username(&request.username)
        .one(&state.db)
        .await?;
    let user_model = match candidate {
        Some(u) if verify_password(&request.password, &u.password).await => u,
        _ => {
            warn!("Failed login for '{}'", request.username);
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let ttl = state.config.token_ttl_minutes;
    let claims = Claims::new(user_model.id, &user_model.username, ttl);
    let access_token = encode_token(&claims, &state.config.jwt_secret_key)
        .map_err(|e| ApiError::Internal(format!("Token encoding failed: {e}")))?;

    info!("User {} logged in", user_model.id);
    Ok(Json(ApiResponse {
        data: TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ttl * 60,
        },
        message: "Login successful".to_string(),
        success: true,
    }))
}
