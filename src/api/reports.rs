use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::context::AppContext;
use crate::report::{RenderedReport, ReportError};

#[derive(Deserialize, ToSchema)]
pub struct PeriodReportRequest {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-12-31", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct DepartmentReportRequest {
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct EmployeeReportRequest {
    #[schema(example = 420100100)]
    pub user_id: i64,
}

fn document_response(report: RenderedReport) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(report.content_type)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", report.file_name),
        ))
        .body(report.bytes)
}

fn report_failure(e: ReportError) -> HttpResponse {
    match e {
        ReportError::Empty => HttpResponse::NotFound().json(json!({
            "message": "No data for the report"
        })),
        ReportError::UnknownUser(user_id) => HttpResponse::NotFound().json(json!({
            "message": format!("User {user_id} not found")
        })),
        ReportError::InvalidPeriod => HttpResponse::BadRequest().json(json!({
            "message": "Invalid report period"
        })),
        ReportError::Render(render) => {
            error!(error = %render, "Report rendering failed");
            HttpResponse::InternalServerError().json(json!({
                "message": format!("Report rendering failed: {render}")
            }))
        }
        ReportError::Store(store) => {
            error!(error = %store, "Report query failed");
            HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }))
        }
    }
}

/// Applications within a date range, rendered as a document
#[utoipa::path(
    post,
    path = "/api/v1/reports/period",
    request_body = PeriodReportRequest,
    responses(
        (status = 200, description = "Rendered report document"),
        (status = 404, description = "No data for the report"),
        (status = 400, description = "Invalid report period")
    ),
    tag = "Reports"
)]
pub async fn period_report(
    ctx: web::Data<AppContext>,
    payload: web::Json<PeriodReportRequest>,
) -> impl Responder {
    match ctx
        .reports
        .applications_in_period(payload.start_date, payload.end_date)
        .await
    {
        Ok(report) => document_response(report),
        Err(e) => report_failure(e),
    }
}

/// Total leave days per department for one year
#[utoipa::path(
    post,
    path = "/api/v1/reports/departments",
    request_body = DepartmentReportRequest,
    responses(
        (status = 200, description = "Rendered report document"),
        (status = 404, description = "No data for the report")
    ),
    tag = "Reports"
)]
pub async fn department_report(
    ctx: web::Data<AppContext>,
    payload: web::Json<DepartmentReportRequest>,
) -> impl Responder {
    match ctx.reports.duration_by_department(payload.year).await {
        Ok(report) => document_response(report),
        Err(e) => report_failure(e),
    }
}

/// All applications of one employee
#[utoipa::path(
    post,
    path = "/api/v1/reports/employee",
    request_body = EmployeeReportRequest,
    responses(
        (status = 200, description = "Rendered report document"),
        (status = 404, description = "User unknown or has no applications")
    ),
    tag = "Reports"
)]
pub async fn employee_report(
    ctx: web::Data<AppContext>,
    payload: web::Json<EmployeeReportRequest>,
) -> impl Responder {
    match ctx.reports.employee_applications(payload.user_id).await {
        Ok(report) => document_response(report),
        Err(e) => report_failure(e),
    }
}
