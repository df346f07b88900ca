use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AllocationDraft, AllocationId, EmployeeId};
use super::repository::{
    AllocationRepository, EmployeeDirectory, ProjectCatalog, RateCardSource, RepositoryError,
};
use super::report::views::{ReportKind, ReportPeriod};
use super::service::{AllocationRejection, AllocationService, AllocationServiceError};

/// Router builder exposing HTTP endpoints for allocation writes, status
/// reads, financials, and reports.
pub fn allocation_router<R, D, C, P>(service: Arc<AllocationService<R, D, C, P>>) -> Router
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    Router::new()
        .route("/api/v1/allocations", post(create_handler::<R, D, C, P>))
        .route(
            "/api/v1/allocations/:allocation_id",
            put(update_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/allocations/:allocation_id",
            delete(remove_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/allocations/:allocation_id/financials",
            get(financials_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/employees/:employee_id/status",
            get(status_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/employees/:employee_id/notice-period",
            post(declare_notice_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/employees/:employee_id/notice-period",
            delete(clear_notice_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/reports/allocations",
            get(allocation_report_handler::<R, D, C, P>),
        )
        .route(
            "/api/v1/reports/projects/roi",
            get(project_roi_handler::<R, D, C, P>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllocationWriteRequest {
    #[serde(flatten)]
    draft: AllocationDraft,
    /// Evaluation date for validation and status derivation; defaults to
    /// the local calendar day.
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoiQuery {
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

fn today_or(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) async fn create_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    axum::Json(request): axum::Json<AllocationWriteRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    let today = today_or(request.as_of);
    match service.create(request.draft, today) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Path(allocation_id): Path<u64>,
    axum::Json(request): axum::Json<AllocationWriteRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    let today = today_or(request.as_of);
    match service.update(AllocationId(allocation_id), request.draft, today) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Path(allocation_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    match service.remove(AllocationId(allocation_id), today_or(query.as_of)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn financials_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Path(allocation_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    match service.refresh_financials(AllocationId(allocation_id), today_or(query.as_of)) {
        Ok(financial) => (StatusCode::OK, axum::Json(financial)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Path(employee_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    match service.employee_status(EmployeeId(employee_id), today_or(query.as_of)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn declare_notice_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Path(employee_id): Path<u64>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    match service.declare_notice_period(EmployeeId(employee_id)) {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(json!({ "status": "NOTICE_PERIOD" })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clear_notice_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Path(employee_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    match service.clear_notice_period(EmployeeId(employee_id), today_or(query.as_of)) {
        Ok(status) => (
            StatusCode::OK,
            axum::Json(json!({ "status": status.label() })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn allocation_report_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    let kind = match query.kind.as_deref() {
        None => ReportKind::Internal,
        Some(raw) => match ReportKind::parse(raw) {
            Ok(kind) => kind,
            Err(error) => {
                let payload = json!({ "error": error.to_string() });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
    };

    let today = today_or(query.as_of);
    let start_date = query.start_date.unwrap_or(today);
    let end_date = query
        .end_date
        .unwrap_or(today + chrono::Duration::days(30));
    let period = ReportPeriod {
        start_date,
        end_date,
    };

    match service.allocation_report(kind, period, today) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn project_roi_handler<R, D, C, P>(
    State(service): State<Arc<AllocationService<R, D, C, P>>>,
    Query(query): Query<RoiQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    let threshold = query.threshold.unwrap_or(10.0);
    match service.project_roi(threshold, today_or(query.as_of)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AllocationServiceError) -> Response {
    match error {
        AllocationServiceError::Rejected(rejection) => rejection_response(rejection),
        AllocationServiceError::UnknownEmployee(_)
        | AllocationServiceError::UnknownProject(_)
        | AllocationServiceError::UnknownAllocation(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        AllocationServiceError::InactiveEmployee(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        AllocationServiceError::EmployeeMismatch { .. } => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        AllocationServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "allocation already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        AllocationServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "record not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        AllocationServiceError::Repository(RepositoryError::Unavailable(detail)) => {
            let payload = json!({ "error": format!("repository unavailable: {detail}") });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn rejection_response(rejection: AllocationRejection) -> Response {
    let payload = match rejection {
        AllocationRejection::OverAllocation(decision) => {
            serde_json::to_value(&decision).unwrap_or_else(|_| {
                json!({ "is_valid": false, "error_message": "over-allocated" })
            })
        }
        AllocationRejection::Percentage(error) => json!({
            "is_valid": false,
            "error_message": error.to_string(),
        }),
        AllocationRejection::Trainee(violations) => json!({
            "is_valid": false,
            "error_message": format!("trainee invariants violated: {violations}"),
            "violations": violations
                .0
                .iter()
                .map(|violation| violation.to_string())
                .collect::<Vec<_>>(),
        }),
    };

    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
