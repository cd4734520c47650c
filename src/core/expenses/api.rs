//! Expense and budget API endpoints
//!
//! REST API for expense tracking (session required on every route):
//! - POST /api/expenses - Record an expense
//! - GET /api/expenses - List the caller's expenses
//! - GET /api/expenses/{id} - Get an expense by ID
//! - PUT /api/expenses/{id} - Update an expense
//! - DELETE /api/expenses/{id} - Delete an expense
//! - GET /api/budgets - List the caller's budgets
//! - PUT /api/budgets/{category} - Set the budget for a category

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::session::CurrentUser;
use crate::core::db::models::{Budget, CreateExpense, Expense, UpdateExpense};
use crate::core::db::repositories::{
    BudgetRepository, BudgetRepositoryError, ExpenseRepository, ExpenseRepositoryError,
};
use crate::core::validation::{
    parse_category, validate_amount, validate_description, validate_title,
};

/// Expense API state
#[derive(Clone)]
pub struct ExpenseApiState {
    pub expenses: ExpenseRepository,
    pub budgets: BudgetRepository,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Expense API error types
#[derive(Debug, thiserror::Error)]
pub enum ExpenseApiError {
    #[error("Expense not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(String),
}

impl From<ExpenseRepositoryError> for ExpenseApiError {
    fn from(err: ExpenseRepositoryError) -> Self {
        match err {
            ExpenseRepositoryError::NotFound => ExpenseApiError::NotFound,
            ExpenseRepositoryError::DatabaseError(e) => ExpenseApiError::Internal(e.to_string()),
        }
    }
}

impl From<BudgetRepositoryError> for ExpenseApiError {
    fn from(err: BudgetRepositoryError) -> Self {
        let BudgetRepositoryError::DatabaseError(e) = err;
        ExpenseApiError::Internal(e.to_string())
    }
}

impl From<crate::core::validation::ValidationError> for ExpenseApiError {
    fn from(err: crate::core::validation::ValidationError) -> Self {
        ExpenseApiError::BadRequest(err.0)
    }
}

impl IntoResponse for ExpenseApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExpenseApiError::NotFound => StatusCode::NOT_FOUND,
            ExpenseApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ExpenseApiError::Internal(detail) => {
                tracing::error!("expense API failure: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiError {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for recording an expense.
///
/// The category arrives as a plain string so an unknown value produces the
/// documented validation message instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
}

/// Request for updating an expense
#[derive(Debug, Deserialize, Default)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
}

/// Request for setting a category budget
#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    pub amount: f64,
}

/// Response for expense list
#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub count: usize,
}

/// Response for budget list
#[derive(Debug, Serialize)]
pub struct BudgetListResponse {
    pub budgets: Vec<Budget>,
    pub count: usize,
}

/// Response for delete operation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

// ============================================================================
// Router
// ============================================================================

/// Create the expense API router; the caller layers the session middleware
/// on top
pub fn expense_api_router(state: ExpenseApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/expenses", post(create_expense_handler))
        .route("/api/expenses", get(list_expenses_handler))
        .route("/api/expenses/{id}", get(get_expense_handler))
        .route("/api/expenses/{id}", put(update_expense_handler))
        .route("/api/expenses/{id}", delete(delete_expense_handler))
        .route("/api/budgets", get(list_budgets_handler))
        .route("/api/budgets/{category}", put(set_budget_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/expenses
async fn create_expense_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ExpenseApiError> {
    validate_title(&request.title)?;
    validate_description(&request.description)?;
    let category = parse_category(&request.category)?;
    validate_amount(request.amount)?;

    tracing::info!(
        "Recording expense '{}' ({}) for user {}",
        request.title,
        category,
        user.id
    );

    let expense = state
        .expenses
        .create(&CreateExpense {
            owner_id: user.id,
            title: request.title.trim().to_string(),
            description: request.description,
            category,
            amount: request.amount,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/expenses
async fn list_expenses_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
) -> Result<Json<ExpenseListResponse>, ExpenseApiError> {
    tracing::debug!("Listing expenses for user {}", user.id);

    let expenses = state.expenses.list_by_owner(user.id).await?;
    let count = expenses.len();

    Ok(Json(ExpenseListResponse { expenses, count }))
}

/// GET /api/expenses/{id}
async fn get_expense_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ExpenseApiError> {
    let expense = state
        .expenses
        .find_for_owner(id, user.id)
        .await?
        .ok_or(ExpenseApiError::NotFound)?;

    Ok(Json(expense))
}

/// PUT /api/expenses/{id}
async fn update_expense_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ExpenseApiError> {
    if let Some(ref title) = request.title {
        validate_title(title)?;
    }
    if let Some(ref description) = request.description {
        validate_description(description)?;
    }
    let category = match request.category.as_deref() {
        Some(value) => Some(parse_category(value)?),
        None => None,
    };
    if let Some(amount) = request.amount {
        validate_amount(amount)?;
    }

    tracing::info!("Updating expense {} for user {}", id, user.id);

    let expense = state
        .expenses
        .update_for_owner(
            id,
            user.id,
            &UpdateExpense {
                title: request.title.map(|t| t.trim().to_string()),
                description: request.description,
                category,
                amount: request.amount,
            },
        )
        .await?;

    Ok(Json(expense))
}

/// DELETE /api/expenses/{id}
async fn delete_expense_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ExpenseApiError> {
    tracing::info!("Deleting expense {} for user {}", id, user.id);

    let deleted = state.expenses.delete_for_owner(id, user.id).await?;
    if !deleted {
        return Err(ExpenseApiError::NotFound);
    }

    Ok(Json(DeleteResponse { deleted: true, id }))
}

/// GET /api/budgets
async fn list_budgets_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
) -> Result<Json<BudgetListResponse>, ExpenseApiError> {
    tracing::debug!("Listing budgets for user {}", user.id);

    let budgets = state.budgets.list_by_owner(user.id).await?;
    let count = budgets.len();

    Ok(Json(BudgetListResponse { budgets, count }))
}

/// PUT /api/budgets/{category}
/// Set (or replace) the budget for a category
async fn set_budget_handler(
    State(state): State<Arc<ExpenseApiState>>,
    user: CurrentUser,
    Path(category): Path<String>,
    Json(request): Json<SetBudgetRequest>,
) -> Result<Json<Budget>, ExpenseApiError> {
    let category = parse_category(&category)?;
    validate_amount(request.amount)?;

    tracing::info!(
        "Setting {} budget to {} for user {}",
        category,
        request.amount,
        user.id
    );

    let budget = state
        .budgets
        .upsert(user.id, category, request.amount)
        .await?;

    Ok(Json(budget))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // DTO Tests
    // ========================================================================

    #[test]
    fn test_create_expense_request_deserialization() {
        let json = r#"{
            "title": "Weekly shop",
            "description": "Supermarket run",
            "category": "Groceries",
            "amount": 54.20
        }"#;

        let request: CreateExpenseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.title, "Weekly shop");
        assert_eq!(request.category, "Groceries");
        assert_eq!(request.amount, 54.20);
    }

    #[test]
    fn test_update_expense_request_partial() {
        let request: UpdateExpenseRequest =
            serde_json::from_str(r#"{"amount": 19.99}"#).unwrap();
        assert!(request.title.is_none());
        assert!(request.category.is_none());
        assert_eq!(request.amount, Some(19.99));
    }

    // ========================================================================
    // Error Mapping Tests
    // ========================================================================

    #[test]
    fn test_expense_api_error_from_repository_error() {
        let err: ExpenseApiError = ExpenseRepositoryError::NotFound.into();
        assert!(matches!(err, ExpenseApiError::NotFound));
    }

    #[test]
    fn test_expense_api_error_from_validation_error() {
        let err: ExpenseApiError =
            crate::core::validation::ValidationError("Amount must be greater than zero.".to_string())
                .into();

        assert!(matches!(err, ExpenseApiError::BadRequest(_)));
        assert_eq!(format!("{}", err), "Amount must be greater than zero.");
    }

    #[test]
    fn test_expense_api_error_display() {
        assert_eq!(
            format!("{}", ExpenseApiError::NotFound),
            "Expense not found"
        );
        assert_eq!(
            format!("{}", ExpenseApiError::Internal("db".to_string())),
            "Internal server error"
        );
    }
}
