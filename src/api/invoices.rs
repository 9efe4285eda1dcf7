//! Invoice read endpoint.

use actix_web::{HttpResponse, get, web};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

/// Get one invoice. Owner of the parent request or admin only.
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Invoice", body = crate::models::Invoice),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/invoices/{id}")]
pub async fn get_invoice(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let invoice = pool
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

    // Ownership lives on the parent request.
    let request = pool
        .get_request_by_id(invoice.request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;
    if !auth.can_access_user(request.user_id) {
        return Err(AppError::NotFound(format!("Invoice {}", id)));
    }

    Ok(HttpResponse::Ok().json(invoice))
}

/// Configure invoice routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_invoice);
}
