use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use compute::{ledger, round_money};
use model::entities::{category, expense, prelude::*};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating an expense. `date` defaults to today.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

/// Request body for updating an expense; absent fields stay unchanged
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

impl UpdateExpenseRequest {
    fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.date.is_none()
    }
}

/// Filters for listing expenses; every bound is inclusive
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    pub category_id: Option<i32>,
    #[param(value_type = Option<String>)]
    pub min_amount: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct ExpenseResponse {
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl ExpenseResponse {
    fn new(model: expense::Model, category_name: String) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            category_name,
            description: model.description,
            amount: round_money(model.amount),
            date: model.date,
        }
    }
}

/// An expense together with the owner's balance after the change
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ExpenseChange {
    pub expense: ExpenseResponse,
    pub balance: Decimal,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DeletedExpense {
    pub id: i32,
    pub balance: Decimal,
}

fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Invalid date format, use YYYY-MM-DD"))
}

fn validate_amount(amount: Decimal) -> ApiResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("Amount must be greater than zero"));
    }
    // Balances are kept in whole cents.
    if amount.normalize().scale() > 2 {
        return Err(ApiError::bad_request("Amount must have at most two decimal places"));
    }
    Ok(())
}

async fn find_category<C: ConnectionTrait>(db: &C, category_id: i32) -> ApiResult<category::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Category with ID {} not found", category_id);
            ApiError::NotFound("Category not found".to_string())
        })
}

async fn find_owned_expense<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    expense_id: i32,
) -> ApiResult<expense::Model> {
    Expense::find_for_user(user_id)
        .filter(expense::Column::Id.eq(expense_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Expense {} not found for user {}", expense_id, user_id);
            ApiError::NotFound("Expense not found".to_string())
        })
}

/// Record an expense and debit it from the balance
#[utoipa::path(
    post,
    path = "/expenses",
    tag = "expenses",
    security(("bearer_auth" = [])),
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created, balance debited", body = ApiResponse<ExpenseChange>),
        (status = 400, description = "Missing fields, non-positive amount or bad date", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateExpenseRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ExpenseChange>>)> {
    trace!("Entering create_expense function for user_id: {}", auth.user_id);
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let (Some(amount), Some(description), Some(category_id)) =
        (request.amount, description, request.category_id)
    else {
        return Err(ApiError::bad_request(
            "Amount, description, and categoryId are required",
        ));
    };
    validate_amount(amount)?;
    let date = match request.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };

    let txn = state.db.begin().await?;
    let category_model = find_category(&txn, category_id).await?;

    let expense_model = expense::ActiveModel {
        user_id: Set(auth.user_id),
        category_id: Set(category_id),
        description: Set(description.to_string()),
        amount: Set(amount),
        date: Set(date),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let balance = ledger::apply_expense_create(&txn, auth.user_id, amount).await?;
    txn.commit().await?;

    info!(
        "Expense {} of {} created for user {}, balance now {}",
        expense_model.id, amount, auth.user_id, balance
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ExpenseChange {
                expense: ExpenseResponse::new(expense_model, category_model.name),
                balance,
            },
            message: "Expense created successfully".to_string(),
            success: true,
        }),
    ))
}

/// List the caller's expenses, newest first
#[utoipa::path(
    get,
    path = "/expenses",
    tag = "expenses",
    security(("bearer_auth" = [])),
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Expenses retrieved successfully", body = ApiResponse<Vec<ExpenseResponse>>),
        (status = 400, description = "Malformed filter", body = crate::schemas::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(filter): ValidatedQuery<ExpenseQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ExpenseResponse>>>> {
    let mut query = Expense::find_for_user(auth.user_id);
    if let Some(category_id) = filter.category_id {
        query = query.filter(expense::Column::CategoryId.eq(category_id));
    }
    if let Some(min_amount) = filter.min_amount {
        query = query.filter(expense::Column::Amount.gte(min_amount));
    }
    if let Some(max_amount) = filter.max_amount {
        query = query.filter(expense::Column::Amount.lte(max_amount));
    }
    if let Some(start_date) = filter.start_date {
        query = query.filter(expense::Column::Date.gte(start_date));
    }
    if let Some(end_date) = filter.end_date {
        query = query.filter(expense::Column::Date.lte(end_date));
    }

    let rows = query
        .order_by_desc(expense::Column::Date)
        .order_by_desc(expense::Column::Id)
        .find_also_related(Category)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} expenses for user {}", rows.len(), auth.user_id);
    let data = rows
        .into_iter()
        .map(|(expense_model, category_model)| {
            let name = category_model.map(|c| c.name).unwrap_or_default();
            ExpenseResponse::new(expense_model, name)
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        message: "Expenses retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get one of the caller's expenses
#[utoipa::path(
    get,
    path = "/expenses/{expense_id}",
    tag = "expenses",
    security(("bearer_auth" = [])),
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<ExpenseResponse>>> {
    let expense_model = find_owned_expense(&state.db, auth.user_id, expense_id).await?;
    let category_model = find_category(&state.db, expense_model.category_id).await?;

    Ok(Json(ApiResponse {
        data: ExpenseResponse::new(expense_model, category_model.name),
        message: "Expense retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update an expense; an amount change re-balances the owner
#[utoipa::path(
    put,
    path = "/expenses/{expense_id}",
    tag = "expenses",
    security(("bearer_auth" = [])),
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ApiResponse<ExpenseChange>),
        (status = 400, description = "No fields, non-positive amount or bad date", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Expense or category not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateExpenseRequest>,
) -> ApiResult<Json<ApiResponse<ExpenseChange>>> {
    trace!("Entering update_expense function for expense_id: {}", expense_id);
    if request.is_empty() {
        return Err(ApiError::bad_request("At least one field is required to update"));
    }
    if let Some(amount) = request.amount {
        validate_amount(amount)?;
    }
    let date = request.date.as_deref().map(parse_date).transpose()?;
    let description = request.description.as_deref().map(str::trim);
    if description.is_some_and(str::is_empty) {
        return Err(ApiError::bad_request("Description must not be empty"));
    }

    let txn = state.db.begin().await?;
    let existing = find_owned_expense(&txn, auth.user_id, expense_id).await?;
    let old_amount = existing.amount;
    let category_id = request.category_id.unwrap_or(existing.category_id);
    let category_model = find_category(&txn, category_id).await?;

    let mut active: expense::ActiveModel = existing.into();
    active.category_id = Set(category_id);
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(description) = description {
        active.description = Set(description.to_string());
    }
    if let Some(date) = date {
        active.date = Set(date);
    }
    let updated = active.update(&txn).await?;

    let balance = match request.amount {
        Some(new_amount) if new_amount != old_amount => {
            ledger::apply_expense_update(&txn, auth.user_id, old_amount, new_amount).await?
        }
        _ => ledger::current_balance(&txn, auth.user_id).await?,
    };
    txn.commit().await?;

    info!(
        "Expense {} updated for user {}, balance now {}",
        expense_id, auth.user_id, balance
    );
    Ok(Json(ApiResponse {
        data: ExpenseChange {
            expense: ExpenseResponse::new(updated, category_model.name),
            balance,
        },
        message: "Expense updated successfully".to_string(),
        success: true,
    }))
}

/// Delete an expense and credit its amount back
#[utoipa::path(
    delete,
    path = "/expenses/{expense_id}",
    tag = "expenses",
    security(("bearer_auth" = [])),
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense deleted, balance credited", body = ApiResponse<DeletedExpense>),
        (status = 404, description = "Expense not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<DeletedExpense>>> {
    trace!("Entering delete_expense function for expense_id: {}", expense_id);
    let txn = state.db.begin().await?;
    let existing = find_owned_expense(&txn, auth.user_id, expense_id).await?;

    Expense::delete_by_id(existing.id).exec(&txn).await?;
    let balance = ledger::apply_expense_delete(&txn, auth.user_id, existing.amount).await?;
    txn.commit().await?;

    info!(
        "Expense {} deleted for user {}, balance now {}",
        expense_id, auth.user_id, balance
    );
    Ok(Json(ApiResponse {
        data: DeletedExpense {
            id: expense_id,
            balance,
        },
        message: "Expense deleted successfully".to_string(),
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-10-16").ok(),
            NaiveDate::from_ymd_opt(2026, 10, 16)
        );
        assert!(parse_date("16/10/2026").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }

    #[test]
    fn test_amount_must_be_positive_whole_cents() {
        assert!(validate_amount(Decimal::new(1, 2)).is_ok());
        assert!(validate_amount(Decimal::new(12500, 3)).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-5, 0)).is_err());
        assert!(validate_amount(Decimal::new(4, 3)).is_err());
    }

    #[test]
    fn test_camel_case_request_body() {
        let request: CreateExpenseRequest = serde_json::from_str(
            r#"{"amount": "12.50", "description": "Lunch", "categoryId": 3, "date": "2026-10-01"}"#,
        )
        .expect("valid body");
        assert_eq!(request.category_id, Some(3));
        assert_eq!(request.amount, Some(Decimal::new(1250, 2)));

        let empty: UpdateExpenseRequest = serde_json::from_str("{}").expect("valid body");
        assert!(empty.is_empty());
    }
}
