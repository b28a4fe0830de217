use crate::handlers::{
    aggregation::get_aggregation,
    auth::{login, register},
    categories::{create_category, delete_category, get_categories, get_category, update_category},
    expenses::{create_expense, delete_expense, get_expense, get_expenses, update_expense},
    health::health_check,
    password_reset::{request_password_reset, verify_reset_code},
    receipts::upload_receipt,
    shared_config::{create_entry, delete_entry, get_entries, get_entry, update_entry},
    users::{create_user, delete_user, get_user, get_users, me, update_user},
};
use crate::receipts::MAX_UPLOAD_BYTES;
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/users/request-password-reset", post(request_password_reset))
        .route("/users/verify-reset-code", post(verify_reset_code))
        // Categories
        .route("/categories", post(create_category).get(get_categories))
        .route(
            "/categories/:category_id",
            get(get_category).put(update_category).delete(delete_category),
        )
        // Expenses
        .route("/expenses", post(create_expense).get(get_expenses))
        .route(
            "/expenses/:expense_id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/aggregation", get(get_aggregation))
        // User administration
        .route("/api/users", post(create_user).get(get_users))
        .route(
            "/api/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        // Shared configuration
        .route("/tba_sio", post(create_entry).get(get_entries))
        .route(
            "/tba_sio/:key",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        // Receipts
        .route(
            "/image/upload-receipt",
            post(upload_receipt).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
