//! Supporting document uploads and listings.
//!
//! Uploading a payment proof also advances the request to
//! PAYMENT_PROOF_UPLOADED through the lifecycle engine, which is why this
//! thin handler takes the engine alongside the pool.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::lifecycle::{Actor, LifecycleEngine, TransitionOptions};
use crate::models::{
    DocumentCategory, DocumentListResponse, DocumentWithUrl, RequestStatus, ShipmentRequest,
};
use crate::services::storage::{BlobStore, Storage};

use super::MultipartForm;

async fn load_owned_request(
    pool: &DbPool,
    auth: &AuthContext,
    id: Uuid,
) -> AppResult<ShipmentRequest> {
    let request = pool
        .get_request_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;
    if !auth.can_access_user(request.user_id) {
        return Err(AppError::NotFound(format!("Request {}", id)));
    }
    Ok(request)
}

/// Upload documents for a request (multipart).
///
/// The optional `category` field selects SUPPORTING (default),
/// PAYMENT_PROOF or FINAL_CANDIDATE; the latter is admin-only staging for
/// publication.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/documents",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 201, description = "Documents stored", body = DocumentListResponse),
        (status = 400, description = "Invalid upload", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/requests/{id}/documents")]
pub async fn upload_documents(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    engine: web::Data<LifecycleEngine>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    let request = load_owned_request(&pool, &auth, request_id).await?;

    let form = MultipartForm::read(payload, config.max_upload_size).await?;
    if form.files.is_empty() {
        return Err(AppError::Validation(
            "At least one file is required".to_string(),
        ));
    }

    let category = match form.optional_field("category") {
        Some(raw) => DocumentCategory::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown category '{}'", raw)))?,
        None => DocumentCategory::Supporting,
    };
    if category == DocumentCategory::FinalCandidate {
        auth.require_admin()?;
    }

    let mut stored = Vec::with_capacity(form.files.len());
    for file in form.files {
        let key = match category {
            DocumentCategory::PaymentProof => {
                Storage::proof_key(&request_id.to_string(), &file.file_name)
            }
            _ => Storage::document_key(&request_id.to_string(), &file.file_name),
        };

        storage
            .put(&key, file.bytes, file.content_type.as_deref())
            .await?;

        // Upload-then-record; a failed row insert deletes the blob.
        let document = match pool
            .insert_document(request_id, &file.file_name, &key, category, auth.user_id)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = storage.delete(&key).await {
                    warn!("Compensating delete of document blob {} failed: {}", key, cleanup);
                }
                return Err(e);
            }
        };

        stored.push(document);
    }

    // A proof upload moves the payment flow forward when the request is in
    // a state that allows it; otherwise the documents are stored anyway.
    if category == DocumentCategory::PaymentProof
        && request.status != RequestStatus::PaymentProofUploaded
    {
        if let Err(e) = engine
            .transition_status(
                request_id,
                RequestStatus::PaymentProofUploaded,
                Actor::new(auth.user_id, auth.role),
                TransitionOptions::default(),
            )
            .await
        {
            warn!(
                "Proof stored but request {} not transitioned: {}",
                request_id, e
            );
        }
    }

    let mut documents = Vec::with_capacity(stored.len());
    for document in stored {
        let url = storage
            .sign(&document.file_path, config.signed_url_ttl_secs)
            .await?;
        documents.push(DocumentWithUrl { document, url });
    }

    Ok(HttpResponse::Created().json(DocumentListResponse { documents }))
}

/// List a request's documents with signed download URLs.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/documents",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Documents", body = DocumentListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/requests/{id}/documents")]
pub async fn list_documents(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    load_owned_request(&pool, &auth, request_id).await?;

    let rows = pool.list_documents_for_request(request_id, None).await?;

    let mut documents = Vec::with_capacity(rows.len());
    for document in rows {
        match storage
            .sign(&document.file_path, config.signed_url_ttl_secs)
            .await
        {
            Ok(url) => documents.push(DocumentWithUrl { document, url }),
            // A missing blob should not hide the rest of the listing.
            Err(e) => warn!("Could not sign document {}: {}", document.id, e),
        }
    }

    Ok(HttpResponse::Ok().json(DocumentListResponse { documents }))
}

/// Configure document routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_documents).service(list_documents);
}
