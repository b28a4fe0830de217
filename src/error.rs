use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use compute::ComputeError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::schemas::ErrorResponse;

/// Error returned by every handler; rendered as an `ErrorResponse` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<Vec<String>>,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request_with_details(message: impl Into<String>, details: Vec<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) | ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let (message, details) = match self {
            ApiError::Database(ref db_error) => {
                error!("Database error: {}", db_error);
                ("Internal server error".to_string(), None)
            }
            ApiError::Internal(ref reason) => {
                error!("Internal error: {}", reason);
                ("Internal server error".to_string(), None)
            }
            ApiError::BadRequest { message, details } => (message, details),
            ref other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ComputeError> for ApiError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::Database(db_error) => ApiError::Database(db_error),
            ComputeError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
            ComputeError::InvalidPeriod(_) => {
                ApiError::bad_request("Invalid period, use month|quarter|year")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected JSON body: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::bad_request_with_details("Validation failed", details)
    }
}

/// Maps unique-constraint violations to `Conflict`, everything else stays a database error.
pub fn conflict_on_unique(db_error: DbErr, message: &str) -> ApiError {
    let text = db_error.to_string().to_lowercase();
    if text.contains("unique") {
        warn!("Unique constraint violated: {}", db_error);
        ApiError::Conflict(message.to_string())
    } else {
        ApiError::Database(db_error)
    }
}
