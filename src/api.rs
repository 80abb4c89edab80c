// 🌐 HTTP API - JSON request/response over both ledgers
//
// Every response is wrapped in `ApiResponse { success, data, error }`.
// No authorization here: identity/session handling lives outside this crate.

use crate::employees::{
    create_employee, delete_employee, list_employees, update_employee, Employee, EmployeeUpdate,
    NewEmployee,
};
use crate::error::LedgerError;
use crate::expenses::{
    create_expense, delete_expense, list_expenses, update_expense, Expense, ExpenseUpdate,
    NewExpense,
};
use crate::summary::Totals;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::CorsLayer;
use tracing::{debug, error};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run one ledger call under the connection lock
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> crate::error::Result<T>,
    ) -> Result<T, ApiError> {
        // A panic in another handler doesn't corrupt the connection itself
        let conn = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn).map_err(ApiError::from)
    }
}

// ============================================================================
// Envelope & errors
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            field: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug)]
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(LedgerError::validation("body", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(LedgerError::validation("id", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self.0 {
            LedgerError::Validation { field, .. } => (StatusCode::BAD_REQUEST, Some(*field)),
            LedgerError::NotFound { .. } => (StatusCode::NOT_FOUND, None),
            LedgerError::Transport(e) => {
                error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
            field,
        };

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn respond<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// Employee handlers
// ============================================================================

/// GET /api/employees
async fn get_employees(State(state): State<AppState>) -> ApiResult<Vec<Employee>> {
    respond(state.with_conn(list_employees)?)
}

/// POST /api/employees
async fn post_employee(
    State(state): State<AppState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> ApiResult<Employee> {
    let Json(input) = payload?;
    debug!(name = %input.name, "create employee request");
    respond(state.with_conn(|conn| create_employee(conn, input))?)
}

/// PATCH /api/employees/:id
async fn patch_employee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EmployeeUpdate>, JsonRejection>,
) -> ApiResult<Employee> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    respond(state.with_conn(|conn| update_employee(conn, id, changes))?)
}

/// DELETE /api/employees/:id
async fn remove_employee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = id?;
    state.with_conn(|conn| delete_employee(conn, id))?;
    respond(Deleted { id, deleted: true })
}

// ============================================================================
// Expense handlers
// ============================================================================

/// GET /api/expenses
async fn get_expenses(State(state): State<AppState>) -> ApiResult<Vec<Expense>> {
    respond(state.with_conn(list_expenses)?)
}

/// POST /api/expenses
async fn post_expense(
    State(state): State<AppState>,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> ApiResult<Expense> {
    let Json(input) = payload?;
    respond(state.with_conn(|conn| create_expense(conn, input))?)
}

/// PATCH /api/expenses/:id
async fn patch_expense(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ExpenseUpdate>, JsonRejection>,
) -> ApiResult<Expense> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    respond(state.with_conn(|conn| update_expense(conn, id, changes))?)
}

/// DELETE /api/expenses/:id
async fn remove_expense(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = id?;
    state.with_conn(|conn| delete_expense(conn, id))?;
    respond(Deleted { id, deleted: true })
}

/// GET /api/summary - totals over the current snapshot of both ledgers
async fn get_summary(State(state): State<AppState>) -> ApiResult<Totals> {
    let totals = state.with_conn(|conn| {
        let employees = list_employees(conn)?;
        let expenses = list_expenses(conn)?;
        Ok(Totals::compute(&employees, &expenses))
    })?;
    respond(totals)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/employees", get(get_employees).post(post_employee))
        .route("/employees/:id", patch(patch_employee).delete(remove_employee))
        .route("/expenses", get(get_expenses).post(post_expense))
        .route("/expenses/:id", patch(patch_expense).delete(remove_expense))
        .route("/summary", get(get_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
