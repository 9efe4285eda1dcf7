//! In-app notification feed.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::NotificationListResponse;

/// Query parameters for the feed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    50
}

/// List the caller's notifications, newest first, with the unread count.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(("limit" = Option<u64>, Query, description = "Page size (max 100)")),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/notifications")]
pub async fn list_notifications(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let notifications = pool
        .list_notifications_for_user(auth.user_id, query.limit)
        .await?;
    let unread = pool.count_unread_notifications(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(NotificationListResponse {
        notifications,
        unread,
    }))
}

/// Mark one of the caller's notifications as read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification UUID")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    pool.mark_notification_read(path.into_inner(), auth.user_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure notification routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_notifications).service(mark_read);
}
