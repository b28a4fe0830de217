use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{category, prelude::Category};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{conflict_on_unique, ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::schemas::{ApiResponse, AppState};

const CATEGORY_EXISTS: &str = "Category already exists";

/// Request body for creating or renaming a category
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CategoryRequest {
    /// Category name (must be unique)
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

fn not_found(category_id: i32) -> ApiError {
    warn!("Category with ID {} not found", category_id);
    ApiError::NotFound("Category not found".to_string())
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Name is required", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Category already exists", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    trace!("Entering create_category function");
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    if Category::find_by_name(&name).one(&state.db).await?.is_some() {
        warn!("Category '{}' already exists", name);
        return Err(ApiError::Conflict(CATEGORY_EXISTS.to_string()));
    }

    let category_model = category::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, CATEGORY_EXISTS))?;

    info!(
        "Category created successfully with ID: {}, name: {}",
        category_model.id, category_model.name
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CategoryResponse::from(category_model),
            message: "Category created successfully".to_string(),
            success: true,
        }),
    ))
}

/// List all categories ordered by name
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 401, description = "Missing or invalid token", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let categories = Category::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} categories", categories.len());
    Ok(Json(ApiResponse {
        data: categories.into_iter().map(CategoryResponse::from).collect(),
        message: "Categories retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/categories/{category_id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category(
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<ApiResponse<CategoryResponse>>> {
    let category_model = Category::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(category_id))?;

    Ok(Json(ApiResponse {
        data: CategoryResponse::from(category_model),
        message: "Category retrieved successfully".to_string(),
        success: true,
    }))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/categories/{category_id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Name is required", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Category already exists", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_category(
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> ApiResult<Json<ApiResponse<CategoryResponse>>> {
    trace!("Entering update_category function for category_id: {}", category_id);
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let existing = Category::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(category_id))?;

    let clash = Category::find_by_name(&name)
        .filter(category::Column::Id.ne(category_id))
        .one(&state.db)
        .await?;
    if clash.is_some() {
        return Err(ApiError::Conflict(CATEGORY_EXISTS.to_string()));
    }

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name);
    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, CATEGORY_EXISTS))?;

    info!("Category {} renamed to '{}'", updated.id, updated.name);
    Ok(Json(ApiResponse {
        data: CategoryResponse::from(updated),
        message: "Category updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a category that no expense references
#[utoipa::path(
    delete,
    path = "/categories/{category_id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 204, description = "Category deleted successfully"),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Category is still used by expenses", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_category function for category_id: {}", category_id);
    let existing = Category::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(category_id))?;

    let in_use = existing.expense_count(&state.db).await?;
    if in_use > 0 {
        warn!(
            "Refusing to delete category {} used by {} expenses",
            category_id, in_use
        );
        return Err(ApiError::Conflict(
            "Category is used by existing expenses".to_string(),
        ));
    }

    Category::delete_by_id(category_id).exec(&state.db).await?;
    info!("Category {} deleted", category_id);
    Ok(StatusCode::NO_CONTENT)
}
