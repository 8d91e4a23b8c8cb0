//! HTTP API for the Payroll Ledger.
//!
//! This module exposes the store and the calculators through a small
//! REST API built on [`axum`](https://crates.io/crates/axum).  Every
//! route under `/api` sits behind the access gate of [`crate::auth`].
//! Handlers stay thin: they load snapshots from the [`Repository`], run
//! the pure calculators and persist the result.

use crate::auth::{require_allowed_user, AccessPolicy};
use crate::config::Config;
use crate::engine::{build_payroll_snapshots, payslip, plan_backfill, Payslip, SalaryBasis};
use crate::error::StoreError;
use crate::ledger::{compute_income_ledger, retain_entered_payments, LedgerView};
use crate::models::{
    Employee, EmployeeStatus, IncomeFilter, IncomeInputs, IncomeLedger, IncomeRecord,
    NewEmployee, NewIncomeRecord, NewPromotion, NewSalaryRecord, PayrollSnapshot, SalaryRecord,
};
use crate::period::MonthYear;
use crate::roster::{dashboard_stats, visible_employees, DashboardStats};
use crate::store::Repository;
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{middleware, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Application state shared across requests.
pub struct AppState {
    pub store: Arc<dyn Repository>,
    pub config: Config,
}

/// Errors returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::DuplicatePeriod(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::VersionConflict { .. }) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Poisoned) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn checked_period(month: u32, year: i32) -> ApiResult<MonthYear> {
    let period = MonthYear::new(month, year);
    if period.is_valid() {
        Ok(period)
    } else {
        Err(ApiError::BadRequest(format!("month must be 1-12, got {month}")))
    }
}

/// Build the API router around `store`.  Returns the router and a
/// handle to the state.
pub fn build_router(config: Config, store: Arc<dyn Repository>) -> (Router, Arc<AppState>) {
    let policy = Arc::new(AccessPolicy::new(&config.allowed_emails));
    let state = Arc::new(AppState { store, config });

    let api = Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/:id/promotions", post(add_promotion))
        .route("/employees/:id/status", put(update_status))
        .route("/employees/:id/contract", put(update_contract))
        .route("/income", get(list_income).post(create_income))
        .route("/income/preview", post(preview_income))
        .route("/income/:id", delete(delete_income))
        .route("/payroll", get(payroll))
        .route("/salary-records", get(list_salary_records).post(create_salary_record))
        .route("/salary-records/backfill", post(backfill_salary_records))
        .route("/salary-records/:id/payslip", get(salary_payslip))
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(policy, require_allowed_user));

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state.clone());
    (router, state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterQuery {
    /// Include employees fired longer ago than the retention window.
    #[serde(default)]
    include_archived: bool,
}

fn roster(state: &AppState, include_archived: bool) -> ApiResult<Vec<Employee>> {
    let employees = state.store.list_employees()?;
    if include_archived {
        return Ok(employees);
    }
    Ok(visible_employees(employees, Utc::now(), state.config.fired_retention_days))
}

fn find_by_employee_id(state: &AppState, employee_id: &str) -> ApiResult<Employee> {
    state
        .store
        .list_employees()?
        .into_iter()
        .find(|e| e.employee_id == employee_id)
        .ok_or_else(|| StoreError::not_found("employee", employee_id).into())
}

async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RosterQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    Ok(Json(roster(&state, query.include_archived)?))
}

async fn create_employee(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewEmployee>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let employee = state.store.create_employee(input)?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn add_promotion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<NewPromotion>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.store.append_promotion(&id, input)?))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: EmployeeStatus,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<StatusUpdate>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.store.update_status(&id, input.status)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractUpdate {
    contract_sent: bool,
}

async fn update_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ContractUpdate>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.store.set_contract_sent(&id, input.contract_sent)?))
}

/// Period selection shared by the income and payroll listings:
/// `months=2024-09,2024-11` picks individual months, `from`/`to` an
/// inclusive range.  Neither means everything.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodQuery {
    months: Option<String>,
    from: Option<String>,
    to: Option<String>,
    #[serde(default)]
    include_archived: bool,
}

impl PeriodQuery {
    fn filter(&self) -> ApiResult<IncomeFilter> {
        let parse = |raw: &str| {
            raw.parse::<MonthYear>()
                .map_err(|err| ApiError::BadRequest(err.to_string()))
        };
        match (&self.months, &self.from, &self.to) {
            (Some(months), None, None) => {
                let periods = months
                    .split(',')
                    .filter(|m| !m.trim().is_empty())
                    .map(parse)
                    .collect::<ApiResult<Vec<_>>>()?;
                Ok(IncomeFilter::Periods(periods))
            }
            (None, Some(from), Some(to)) => Ok(IncomeFilter::Periods(MonthYear::range_inclusive(
                parse(from)?,
                parse(to)?,
            ))),
            (None, None, None) => Ok(IncomeFilter::All),
            _ => Err(ApiError::BadRequest(
                "use either `months` or both `from` and `to`".to_string(),
            )),
        }
    }
}

/// An income record with the schema-aware reading of its figures.
#[derive(Debug, Serialize)]
struct IncomeEntry {
    #[serde(flatten)]
    record: IncomeRecord,
    ledger: LedgerView,
}

async fn list_income(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Vec<IncomeEntry>>> {
    let records = state.store.list_income_records(&query.filter()?)?;
    let entries = records
        .into_iter()
        .map(|record| IncomeEntry {
            ledger: LedgerView::of(&record),
            record,
        })
        .collect();
    Ok(Json(entries))
}

async fn preview_income(Json(inputs): Json<IncomeInputs>) -> Json<IncomeLedger> {
    Json(compute_income_ledger(&inputs))
}

async fn create_income(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewIncomeRecord>,
) -> ApiResult<(StatusCode, Json<IncomeRecord>)> {
    let period = checked_period(input.month, input.year)?;
    let mut inputs = input.inputs;
    // Profit/loss counts every entered line, as the preview does; blank
    // lines are only left out of what is stored.
    let ledger = compute_income_ledger(&inputs);
    inputs.employee_payments = retain_entered_payments(inputs.employee_payments);
    debug!(%period, ?ledger, "income ledger computed");

    let record = state
        .store
        .create_income_record(IncomeRecord::from_ledger(period, inputs, ledger))?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn delete_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_income_record(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn payroll(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Vec<PayrollSnapshot>>> {
    let records = state.store.list_income_records(&query.filter()?)?;
    let employees = roster(&state, query.include_archived)?;
    Ok(Json(build_payroll_snapshots(&employees, &records)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryRecordQuery {
    employee_id: Option<String>,
}

async fn list_salary_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SalaryRecordQuery>,
) -> ApiResult<Json<Vec<SalaryRecord>>> {
    Ok(Json(state.store.list_salary_records(query.employee_id.as_deref())?))
}

async fn create_salary_record(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewSalaryRecord>,
) -> ApiResult<(StatusCode, Json<SalaryRecord>)> {
    let period = checked_period(input.month, input.year)?;
    let employee = find_by_employee_id(&state, &input.employee_id)?;
    let amount = input.total_amount();
    let record = state.store.create_salary_record(SalaryRecord {
        id: String::new(),
        employee_id: employee.employee_id,
        employee_name: employee.name,
        month: period.month,
        year: period.year,
        amount,
        items: input.items,
        payment_date: input.payment_date,
        status: input.status,
        created_at: None,
    })?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackfillRequest {
    employee_id: String,
    start: MonthYear,
    end: MonthYear,
    #[serde(default)]
    basis: SalaryBasis,
}

#[derive(Debug, Serialize)]
struct BackfillResponse {
    created: Vec<SalaryRecord>,
    skipped: Vec<MonthYear>,
}

async fn backfill_salary_records(
    State(state): State<Arc<AppState>>,
    Json(input): Json<BackfillRequest>,
) -> ApiResult<(StatusCode, Json<BackfillResponse>)> {
    let start = checked_period(input.start.month, input.start.year)?;
    let end = checked_period(input.end.month, input.end.year)?;
    let employee = find_by_employee_id(&state, &input.employee_id)?;
    let existing = state.store.list_salary_records(Some(&employee.employee_id))?;

    let plan = plan_backfill(&employee, start, end, input.basis, &existing);
    let created = plan
        .records
        .into_iter()
        .map(|record| state.store.create_salary_record(record))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    info!(
        employee_id = %employee.employee_id,
        created = created.len(),
        skipped = plan.skipped.len(),
        basis = ?input.basis,
        "salary records backfilled"
    );
    Ok((
        StatusCode::CREATED,
        Json(BackfillResponse {
            created,
            skipped: plan.skipped,
        }),
    ))
}

async fn salary_payslip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Payslip>> {
    let record = state.store.get_salary_record(&id)?;
    let employee = find_by_employee_id(&state, &record.employee_id)?;
    Ok(Json(payslip(&state.config.company, &employee, &record)))
}

async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardStats>> {
    let employees = roster(&state, false)?;
    Ok(Json(dashboard_stats(&employees, Utc::now())))
}

/// Launch the API server.  Binds to `config.bind_addr` and blocks until
/// the server terminates (e.g. when interrupted).
pub async fn serve(config: Config, store: Arc<dyn Repository>) -> Result<()> {
    let addr = config.bind_addr.clone();
    let (router, _state) = build_router(config, store);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
