//! Request intake, listing and client-side status transitions.

use actix_web::{HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::lifecycle::{Actor, LifecycleEngine, TransitionOptions};
use crate::models::{
    CreateRequestRequest, ListRequestsQuery, RequestListResponse, TransitionRequest,
};

/// Create a shipment request.
///
/// Every request starts in CREATED and belongs to the caller.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "Requests",
    request_body = CreateRequestRequest,
    responses(
        (status = 201, description = "Request created", body = crate::models::ShipmentRequest),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/requests")]
pub async fn create_request(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    body: web::Json<CreateRequestRequest>,
) -> AppResult<HttpResponse> {
    let request = pool
        .insert_request(Uuid::now_v7(), auth.user_id, &body)
        .await?;

    info!(
        "Request {} created by {} ({})",
        request.id, auth.user_id, request.request_type
    );

    Ok(HttpResponse::Created().json(request))
}

/// List requests. Clients see their own; admins see everything.
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    tag = "Requests",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "Requests", body = RequestListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/requests")]
pub async fn list_requests(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    query: web::Query<ListRequestsQuery>,
) -> AppResult<HttpResponse> {
    let owner = if auth.role.has_admin_authority() {
        None
    } else {
        Some(auth.user_id)
    };

    let (requests, total) = pool.list_requests(&query, owner).await?;

    Ok(HttpResponse::Ok().json(RequestListResponse { requests, total }))
}

/// Get one request. Owner or admin only.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Request", body = crate::models::ShipmentRequest),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/requests/{id}")]
pub async fn get_request(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let request = pool
        .get_request_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;

    if !auth.can_access_user(request.user_id) {
        // Hide other clients' requests entirely.
        return Err(AppError::NotFound(format!("Request {}", id)));
    }

    Ok(HttpResponse::Ok().json(request))
}

/// Request a status transition.
///
/// The lifecycle engine decides whether the caller's role may perform the
/// requested change; guard failures come back as 409 with no mutation.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/status",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "Request UUID")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status updated", body = crate::models::ShipmentRequest),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition rejected", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/requests/{id}/status")]
pub async fn transition_status(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    engine: web::Data<LifecycleEngine>,
    path: web::Path<Uuid>,
    body: web::Json<TransitionRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    // Clients may only transition their own requests.
    if !auth.role.has_admin_authority() {
        let request = pool
            .get_request_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;
        if request.user_id != auth.user_id {
            return Err(AppError::NotFound(format!("Request {}", id)));
        }
    }

    let updated = engine
        .transition_status(
            id,
            body.to,
            Actor::new(auth.user_id, auth.role),
            TransitionOptions {
                notify_client: body.notify_client.unwrap_or(true),
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Configure request routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_request)
        .service(list_requests)
        .service(get_request)
        .service(transition_status);
}
