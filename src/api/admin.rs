//! Admin workflow endpoints: pricing, payment confirmation, publication,
//! corrective actions. Thin dispatch into the lifecycle engine.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::lifecycle::{
    Actor, FinalFile, LifecycleEngine, SendDraftInput, TransitionOptions,
};
use crate::models::{
    Delivery, DraftKind, ForceStatusRequest, Invoice, InvoiceSource, RequestDraft, ShipmentRequest,
};

use super::MultipartForm;

/// Response for draft issuance.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendDraftResponse {
    pub request: ShipmentRequest,
    pub invoice: Invoice,
    pub draft: RequestDraft,
}

/// Response for final document publication.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResponse {
    pub request: ShipmentRequest,
    pub deliveries: Vec<Delivery>,
}

/// Response for manual BL generation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ManualBlResponse {
    pub request: ShipmentRequest,
    pub manual_bl: Option<String>,
}

/// Force a status, bypassing the transition table.
///
/// Corrective escape hatch: it can move a request into any state, including
/// out of a terminal one. Every use is audited as forced.
#[utoipa::path(
    post,
    path = "/api/v1/admin/requests/{id}/force-status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Request UUID")),
    request_body = ForceStatusRequest,
    responses(
        (status = 200, description = "Status forced", body = ShipmentRequest),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/admin/requests/{id}/force-status")]
pub async fn force_status(
    auth: AuthContext,
    engine: web::Data<LifecycleEngine>,
    path: web::Path<Uuid>,
    body: web::Json<ForceStatusRequest>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let updated = engine
        .force_update_status(
            path.into_inner(),
            body.status,
            Actor::new(auth.user_id, auth.role),
            TransitionOptions {
                notify_client: body.notify_client.unwrap_or(true),
            },
            body.reason.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Issue a priced draft (multipart).
///
/// Fields: `amount`, `currency`, `cargo_route`, optional `customer_ref`,
/// optional `source` (SYSTEM/MANUAL), optional `kind`
/// (DRAFT_FERI/PROFORMA); exactly one attached file.
#[utoipa::path(
    post,
    path = "/api/v1/admin/requests/{id}/draft",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Draft issued", body = SendDraftResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition rejected", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/admin/requests/{id}/draft")]
pub async fn send_draft(
    auth: AuthContext,
    engine: web::Data<LifecycleEngine>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let form = MultipartForm::read(payload, config.max_upload_size).await?;

    let amount: Decimal = form
        .require_field("amount")?
        .parse()
        .map_err(|_| AppError::Validation("amount must be a decimal number".to_string()))?;

    let source = match form.optional_field("source") {
        Some(raw) => InvoiceSource::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown invoice source '{}'", raw)))?,
        None => InvoiceSource::System,
    };
    let kind = match form.optional_field("kind") {
        Some(raw) => DraftKind::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown draft kind '{}'", raw)))?,
        None => DraftKind::Proforma,
    };

    if form.files.len() != 1 {
        return Err(AppError::Validation(
            "Exactly one draft file must be attached".to_string(),
        ));
    }
    let file = form.files.into_iter().next().unwrap_or_else(|| unreachable!());

    let input = SendDraftInput {
        amount,
        currency: form.fields.get("currency").cloned().unwrap_or_default(),
        cargo_route: form.fields.get("cargo_route").cloned().unwrap_or_default(),
        customer_ref: form.fields.get("customer_ref").cloned().filter(|v| !v.trim().is_empty()),
        source,
        kind,
        file_name: file.file_name,
        file_bytes: file.bytes,
        content_type: file.content_type,
    };

    let outcome = engine
        .send_draft(path.into_inner(), input, Actor::new(auth.user_id, auth.role))
        .await?;

    Ok(HttpResponse::Ok().json(SendDraftResponse {
        request: outcome.request,
        invoice: outcome.invoice,
        draft: outcome.draft,
    }))
}

/// Confirm a client's payment.
#[utoipa::path(
    post,
    path = "/api/v1/admin/requests/{id}/confirm-payment",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Payment confirmed", body = ShipmentRequest),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not awaiting confirmation", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/admin/requests/{id}/confirm-payment")]
pub async fn confirm_payment(
    auth: AuthContext,
    engine: web::Data<LifecycleEngine>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let updated = engine
        .confirm_payment(path.into_inner(), Actor::new(auth.user_id, auth.role))
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Publish the final documents (multipart).
///
/// Attach the main certificate and, for mixed requests, an optional
/// secondary AD file. With no attachments, previously staged
/// FINAL_CANDIDATE documents are promoted instead. Optional `feri_ref`
/// field records the issuing authority's reference.
#[utoipa::path(
    post,
    path = "/api/v1/admin/requests/{id}/publish",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Documents published", body = PublishResponse),
        (status = 400, description = "Nothing to publish", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already completed", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/admin/requests/{id}/publish")]
pub async fn publish_final_documents(
    auth: AuthContext,
    engine: web::Data<LifecycleEngine>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let form = MultipartForm::read(payload, config.max_upload_size).await?;
    let feri_ref = form.optional_field("feri_ref").map(String::from);

    let files = form
        .files
        .into_iter()
        .map(|f| FinalFile {
            file_name: f.file_name,
            bytes: f.bytes,
            content_type: f.content_type,
        })
        .collect();

    let outcome = engine
        .publish_final_documents(
            path.into_inner(),
            files,
            feri_ref.as_deref(),
            Actor::new(auth.user_id, auth.role),
        )
        .await?;

    Ok(HttpResponse::Ok().json(PublishResponse {
        request: outcome.request,
        deliveries: outcome.deliveries,
    }))
}

/// Generate a manual BL reference.
///
/// No-op when the request already has one; the existing value is returned.
#[utoipa::path(
    post,
    path = "/api/v1/admin/requests/{id}/manual-bl",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Reference generated or already present", body = ManualBlResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/admin/requests/{id}/manual-bl")]
pub async fn regenerate_manual_bl(
    auth: AuthContext,
    engine: web::Data<LifecycleEngine>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let request = engine
        .regenerate_manual_bl(path.into_inner(), Actor::new(auth.user_id, auth.role))
        .await?;

    let manual_bl = request.manual_bl.clone();
    Ok(HttpResponse::Ok().json(ManualBlResponse { request, manual_bl }))
}

/// Configure admin routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(force_status)
        .service(send_draft)
        .service(confirm_payment)
        .service(publish_final_documents)
        .service(regenerate_manual_bl);
}
