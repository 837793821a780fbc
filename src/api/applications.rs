use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::context::AppContext;
use crate::model::application::Application;
use crate::review::{DecisionOutcome, PAGE_SIZE, ReviewError, StatusFilter};
use crate::store::ApplicationWithUser;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ApplicationQuery {
    /// Substring of a first/last name, or an exact application id
    pub search: Option<String>,
    /// One status, or "all" for the pending work queue
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct ApplicationView {
    #[schema(example = 1)]
    pub application_id: u64,
    #[schema(example = 420100100)]
    pub user_id: i64,
    #[schema(example = "John Doe")]
    pub employee: String,
    #[schema(example = "annual basic paid leave")]
    pub leave_type: String,
    #[schema(example = "2026-06-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-06-10", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "family trip", nullable = true)]
    pub reason: Option<String>,
}

impl From<&ApplicationWithUser> for ApplicationView {
    fn from(row: &ApplicationWithUser) -> Self {
        Self {
            application_id: row.application.application_id,
            user_id: row.application.user_id,
            employee: row.user.full_name(),
            leave_type: row.application.leave_type.to_string(),
            start_date: row.application.start_date,
            end_date: row.application.end_date,
            status: row.application.status.to_string(),
            reason: row.application.reason.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ApplicationListResponse {
    pub data: Vec<ApplicationView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectApplication {
    #[schema(example = "overlapping team leave")]
    pub reason: String,
}

fn list_response(
    rows: Vec<ApplicationWithUser>,
    total: i64,
    page: u32,
) -> ApplicationListResponse {
    ApplicationListResponse {
        data: rows.iter().map(ApplicationView::from).collect(),
        page,
        per_page: PAGE_SIZE,
        total,
    }
}

fn internal_error(e: ReviewError) -> actix_web::Error {
    error!(error = %e, "Review operation failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Paginated application listing with search and status filter
#[utoipa::path(
    get,
    path = "/api/v1/applications",
    params(ApplicationQuery),
    responses(
        (status = 200, description = "Paginated application list", body = ApplicationListResponse),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "Applications"
)]
pub async fn list_applications(
    ctx: web::Data<AppContext>,
    query: web::Query<ApplicationQuery>,
) -> actix_web::Result<impl Responder> {
    let Some(filter) = StatusFilter::parse(query.status.as_deref()) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Unknown status filter"
        })));
    };
    let page = query.page.unwrap_or(1).max(1);
    let (rows, total) = ctx
        .review
        .applications(query.search.clone(), filter, page)
        .await
        .map_err(internal_error)?;
    Ok(HttpResponse::Ok().json(list_response(rows, total, page)))
}

/// Processed (approved/rejected) applications
#[utoipa::path(
    get,
    path = "/api/v1/applications/history",
    params(("page" = Option<u32>, Query, description = "Pagination page number")),
    responses(
        (status = 200, description = "Paginated application history", body = ApplicationListResponse)
    ),
    tag = "Applications"
)]
pub async fn application_history(
    ctx: web::Data<AppContext>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let (rows, total) = ctx.review.history(page).await.map_err(internal_error)?;
    Ok(HttpResponse::Ok().json(list_response(rows, total, page)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Single application details
#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}",
    params(("id" = u64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application found", body = Application),
        (status = 404, description = "Application not found")
    ),
    tag = "Applications"
)]
pub async fn get_application(
    ctx: web::Data<AppContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    match ctx.review.application(id).await.map_err(internal_error)? {
        Some(application) => Ok(HttpResponse::Ok().json(application)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Application not found"
        }))),
    }
}

/// Approve a pending application
#[utoipa::path(
    put,
    path = "/api/v1/applications/{id}/approve",
    params(("id" = u64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application approved", body = Object, example = json!({
            "message": "Application approved"
        })),
        (status = 400, description = "Not found or already processed", body = Object, example = json!({
            "message": "Application not found or already processed"
        }))
    ),
    tag = "Applications"
)]
pub async fn approve_application(
    ctx: web::Data<AppContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    match ctx.review.approve(id).await.map_err(internal_error)? {
        DecisionOutcome::Applied => Ok(HttpResponse::Ok().json(json!({
            "message": "Application approved"
        }))),
        DecisionOutcome::NotPending | DecisionOutcome::NotFound => {
            Ok(HttpResponse::BadRequest().json(json!({
                "message": "Application not found or already processed"
            })))
        }
    }
}

/// Reject a pending application with a mandatory reason
#[utoipa::path(
    put,
    path = "/api/v1/applications/{id}/reject",
    params(("id" = u64, Path, description = "Application id")),
    request_body = RejectApplication,
    responses(
        (status = 200, description = "Application rejected", body = Object, example = json!({
            "message": "Application rejected"
        })),
        (status = 400, description = "Missing reason, not found, or already processed")
    ),
    tag = "Applications"
)]
pub async fn reject_application(
    ctx: web::Data<AppContext>,
    path: web::Path<u64>,
    payload: web::Json<RejectApplication>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Rejection reason is required"
        })));
    }
    match ctx.review.reject(id, reason).await.map_err(internal_error)? {
        DecisionOutcome::Applied => Ok(HttpResponse::Ok().json(json!({
            "message": "Application rejected"
        }))),
        DecisionOutcome::NotPending | DecisionOutcome::NotFound => {
            Ok(HttpResponse::BadRequest().json(json!({
                "message": "Application not found or already processed"
            })))
        }
    }
}
