use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::context::AppContext;
use crate::review::{PAGE_SIZE, ReviewError};
use crate::store::ActorLog;

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LogView {
    #[schema(example = 1)]
    pub log_id: u64,
    #[schema(example = 420100100)]
    pub user_id: i64,
    /// First name of the actor, or the bare identity if the user is gone
    #[schema(example = "John")]
    pub actor: String,
    #[schema(example = "Submitted application #1")]
    pub action: String,
    #[schema(example = "2026-05-01T00:00:00Z", format = "date-time", value_type = String)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&ActorLog> for LogView {
    fn from(row: &ActorLog) -> Self {
        Self {
            log_id: row.log.log_id,
            user_id: row.log.user_id,
            actor: row
                .first_name
                .clone()
                .unwrap_or_else(|| row.log.user_id.to_string()),
            action: row.log.action.clone(),
            timestamp: row.log.timestamp,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LogListResponse {
    pub data: Vec<LogView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
}

/// Paginated audit log, newest first
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Paginated audit log", body = LogListResponse)
    ),
    tag = "Logs"
)]
pub async fn list_logs(
    ctx: web::Data<AppContext>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let logs = ctx.review.logs(page).await.map_err(|e: ReviewError| {
        error!(error = %e, "Log listing failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    Ok(HttpResponse::Ok().json(LogListResponse {
        data: logs.iter().map(LogView::from).collect(),
        page,
        per_page: PAGE_SIZE,
    }))
}
