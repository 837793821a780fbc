use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::context::AppContext;
use crate::model::user::User;
use crate::review::{PAGE_SIZE, ReviewError};

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
}

/// Admin overwrite of a user's profile; empty position/department clear the
/// stored value.
#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "Engineer", nullable = true)]
    pub position: Option<String>,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
}

fn internal_error(e: ReviewError) -> actix_web::Error {
    error!(error = %e, "User operation failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Paginated user listing
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse)
    ),
    tag = "Users"
)]
pub async fn list_users(
    ctx: web::Data<AppContext>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let users = ctx.review.users(page).await.map_err(internal_error)?;
    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page,
        per_page: PAGE_SIZE,
    }))
}

/// Overwrite a user's details
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User chat identity")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = Object, example = json!({
            "message": "User updated"
        })),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn update_user(
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    let payload = payload.into_inner();
    let user = User {
        user_id,
        first_name: payload.first_name,
        last_name: payload.last_name,
        position: payload.position.filter(|s| !s.is_empty()),
        department: payload.department.filter(|s| !s.is_empty()),
        email: payload.email,
    };
    if ctx.review.update_user(user).await.map_err(internal_error)? {
        Ok(HttpResponse::Ok().json(json!({ "message": "User updated" })))
    } else {
        Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })))
    }
}

/// Delete a user together with their applications and logs
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User chat identity")),
    responses(
        (status = 200, description = "User deleted", body = Object, example = json!({
            "message": "User deleted",
            "applications": 2,
            "logs": 5
        })),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn delete_user(
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    match ctx
        .review
        .delete_user(user_id)
        .await
        .map_err(internal_error)?
    {
        Some(cascade) => Ok(HttpResponse::Ok().json(json!({
            "message": "User deleted",
            "applications": cascade.applications,
            "logs": cascade.logs
        }))),
        None => Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" }))),
    }
}
