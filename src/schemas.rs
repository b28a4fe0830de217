use common::{AggregationReport, KpiBlock, Period};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::config::AppConfig;
use crate::handlers::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::handlers::categories::{CategoryRequest, CategoryResponse};
use crate::handlers::expenses::{
    CreateExpenseRequest, DeletedExpense, ExpenseChange, ExpenseResponse, UpdateExpenseRequest,
};
use crate::handlers::password_reset::{
    PasswordResetAck, PasswordResetRequest, VerifyResetCodeRequest,
};
use crate::handlers::receipts::{ReceiptUploadForm, ReceiptUploadResponse};
use crate::handlers::shared_config::{
    CreateSharedConfigRequest, SharedConfigResponse, UpdateSharedConfigRequest,
};
use crate::handlers::users::{CreateUserRequest, MeResponse, UpdateUserRequest, UserResponse};
use crate::mail::SendEmail;
use crate::receipts::ReceiptScanner;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// Outgoing mail for password reset codes
    pub mailer: Arc<dyn SendEmail>,
    pub scanner: Arc<dyn ReceiptScanner>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// One entry per violated rule, e.g. password requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Registers the JWT bearer scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::users::me,
        crate::handlers::users::get_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::aggregation::get_aggregation,
        crate::handlers::shared_config::create_entry,
        crate::handlers::shared_config::get_entries,
        crate::handlers::shared_config::get_entry,
        crate::handlers::shared_config::update_entry,
        crate::handlers::shared_config::delete_entry,
        crate::handlers::password_reset::request_password_reset,
        crate::handlers::password_reset::verify_reset_code,
        crate::handlers::receipts::upload_receipt,
    ),
    components(
        schemas(
            ApiResponse<UserResponse>,
            ApiResponse<Vec<UserResponse>>,
            ApiResponse<MeResponse>,
            ApiResponse<TokenResponse>,
            ApiResponse<CategoryResponse>,
            ApiResponse<Vec<CategoryResponse>>,
            ApiResponse<ExpenseResponse>,
            ApiResponse<Vec<ExpenseResponse>>,
            ApiResponse<ExpenseChange>,
            ApiResponse<DeletedExpense>,
            ApiResponse<AggregationReport>,
            ApiResponse<SharedConfigResponse>,
            ApiResponse<Vec<SharedConfigResponse>>,
            ApiResponse<PasswordResetAck>,
            ApiResponse<ReceiptUploadResponse>,
            ErrorResponse,
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UserResponse,
            MeResponse,
            CreateUserRequest,
            UpdateUserRequest,
            CategoryRequest,
            CategoryResponse,
            CreateExpenseRequest,
            UpdateExpenseRequest,
            ExpenseResponse,
            ExpenseChange,
            DeletedExpense,
            AggregationReport,
            KpiBlock,
            Period,
            CreateSharedConfigRequest,
            UpdateSharedConfigRequest,
            SharedConfigResponse,
            PasswordResetRequest,
            VerifyResetCodeRequest,
            PasswordResetAck,
            ReceiptUploadForm,
            ReceiptUploadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and password reset"),
        (name = "users", description = "Current user and user administration"),
        (name = "categories", description = "Expense categories"),
        (name = "expenses", description = "Expense records and balance bookkeeping"),
        (name = "aggregation", description = "Period summaries and KPIs"),
        (name = "shared_config", description = "Shared financial constants such as rent"),
        (name = "receipts", description = "Receipt image upload"),
    ),
    info(
        title = "HomeBudget API",
        description = "Personal finance tracker: expenses, monthly payday bookkeeping and period reports",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
