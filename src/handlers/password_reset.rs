use axum::{extract::State, response::Json};
use chrono::{Duration, Utc};
use model::entities::{password_reset, prelude::*, user};
use rand::Rng;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::password::{ensure_strong_password, hash_password};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::mail::EmailMessage;
use crate::schemas::{ApiResponse, AppState};

/// Minutes a reset code stays valid.
pub const RESET_CODE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct VerifyResetCodeRequest {
    pub email: Option<String>,
    /// Six digits from the reset email
    pub code: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct PasswordResetAck {
    pub email: String,
}

fn generate_reset_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Email a six digit reset code
#[utoipa::path(
    post,
    path = "/users/request-password-reset",
    tag = "auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset code sent", body = ApiResponse<PasswordResetAck>),
        (status = 400, description = "Email required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Email not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PasswordResetRequest>,
) -> ApiResult<Json<ApiResponse<PasswordResetAck>>> {
    trace!("Entering request_password_reset function");
    let email = non_empty(&request.email)
        .ok_or_else(|| ApiError::bad_request("Email required"))?
        .to_string();

    if User::find_by_email(&email).one(&state.db).await?.is_none() {
        warn!("Password reset requested for unknown email");
        return Err(ApiError::NotFound("Email not found".to_string()));
    }

    let code = generate_reset_code();
    let now = Utc::now();
    let entry = password_reset::ActiveModel {
        email: Set(email.clone()),
        code: Set(code.clone()),
        expires_at: Set(now + Duration::minutes(RESET_CODE_TTL_MINUTES)),
        created_at: Set(now),
    };
    PasswordReset::insert(entry)
        .on_conflict(
            OnConflict::column(password_reset::Column::Email)
                .update_columns([
                    password_reset::Column::Code,
                    password_reset::Column::ExpiresAt,
                    password_reset::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let message = EmailMessage {
        to: email.clone(),
        subject: "Password Reset Code".to_string(),
        body: format!("Your password reset code is: {code}"),
    };
    if let Err(e) = state.mailer.send(message).await {
        error!("Failed to deliver password reset code: {}", e);
    }

    info!("Password reset code issued");
    Ok(Json(ApiResponse {
        data: PasswordResetAck { email },
        message: "Reset code sent to your email".to_string(),
        success: true,
    }))
}

/// Check a reset code and set a new password
#[utoipa::path(
    post,
    path = "/users/verify-reset-code",
    tag = "auth",
    request_body = VerifyResetCodeRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<PasswordResetAck>),
        (status = 400, description = "Missing fields, weak password, or unknown, expired or wrong code", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn verify_reset_code(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyResetCodeRequest>,
) -> ApiResult<Json<ApiResponse<PasswordResetAck>>> {
    trace!("Entering verify_reset_code function");
    let (Some(email), Some(code), Some(new_password)) = (
        non_empty(&request.email),
        non_empty(&request.code),
        request.new_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "Email, code, and new_password are required",
        ));
    };
    ensure_strong_password(new_password)?;

    let txn = state.db.begin().await?;
    let entry = PasswordReset::find_by_id(email.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::bad_request("No reset request found"))?;
    if entry.is_expired(Utc::now()) {
        return Err(ApiError::bad_request("Reset code expired"));
    }
    if entry.code != code {
        warn!("Wrong reset code submitted");
        return Err(ApiError::bad_request("Invalid reset code"));
    }

    let user_model = User::find_by_email(email)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found".to_string()))?;
    let mut active: user::ActiveModel = user_model.into();
    active.password = Set(hash_password(new_password, &state.config).await?);
    active.update(&txn).await?;

    PasswordReset::delete_by_id(email.to_string()).exec(&txn).await?;
    txn.commit().await?;

    info!("Password reset completed");
    Ok(Json(ApiResponse {
        data: PasswordResetAck {
            email: email.to_string(),
        },
        message: "Password reset successfully".to_string(),
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some("   ".to_string())), None);
        assert_eq!(non_empty(&Some(" a@b.c ".to_string())), Some("a@b.c"));
    }
}
