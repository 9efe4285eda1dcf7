//! Disputes and message threads attached to a request.
//!
//! Both are side channels: they read the request for ownership checks but
//! never touch its status. Creation fans notifications out best-effort, so
//! a down relay never fails the write.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::config::Config;
use crate::db::{DbPool, disputes, messages};
use crate::error::{AppError, AppResult};
use crate::lifecycle::run_best_effort;
use crate::models::{
    ActorRole, Dispute, DocumentCategory, Message, NewAuditEntry, NotificationEvent,
    NotificationRequest, PostMessageRequest, ShipmentRequest, actions,
};
use crate::services::notifier::Notifier;
use crate::services::storage::{BlobStore, Storage};

use super::MultipartForm;

/// Response wrapper for a dispute list.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeListResponse {
    pub disputes: Vec<Dispute>,
}

/// Response wrapper for a message thread.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

/// How a request is named in notification copy: its BL when one is known,
/// the UUID otherwise.
fn request_label(request: &ShipmentRequest) -> String {
    request
        .bill_of_lading()
        .map(String::from)
        .unwrap_or_else(|| request.id.to_string())
}

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

async fn notify_admins(
    notifier: &dyn Notifier,
    admin_emails: &[String],
    event: NotificationEvent,
    title: &str,
    message: &str,
) {
    for email in admin_emails {
        run_best_effort(
            "admin fan-out",
            notifier.send(NotificationRequest::to_address(
                email,
                ActorRole::Admin,
                event,
                title,
                message,
            )),
        )
        .await;
    }
}

/// Open a dispute (multipart).
///
/// Fields `subject` and `body` are required; at most one attached file is
/// stored as a supporting document and linked to the dispute. Admins are
/// notified after the row is durable.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/disputes",
    tag = "Disputes",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 201, description = "Dispute opened", body = Dispute),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/requests/{id}/disputes")]
pub async fn open_dispute(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    let request = load_owned_request(&pool, &auth, request_id).await?;

    let form = MultipartForm::read(payload, config.max_upload_size).await?;
    let subject = form.require_field("subject")?.to_string();
    let body = form.require_field("body")?.to_string();

    if form.files.len() > 1 {
        return Err(AppError::Validation(
            "A dispute may carry at most one attachment".to_string(),
        ));
    }

    // Optional attachment goes through the document store first so the
    // dispute row can reference it.
    let mut attachment_id = None;
    if let Some(file) = form.files.into_iter().next() {
        let key = Storage::document_key(&request_id.to_string(), &file.file_name);
        storage
            .put(&key, file.bytes, file.content_type.as_deref())
            .await?;

        let document = match pool
            .insert_document(
                request_id,
                &file.file_name,
                &key,
                DocumentCategory::Supporting,
                auth.user_id,
            )
            .await
        {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = storage.delete(&key).await {
                    warn!("Compensating delete of dispute attachment {} failed: {}", key, cleanup);
                }
                return Err(e);
            }
        };
        attachment_id = Some(document.id);
    }

    let dispute = disputes::insert(
        pool.connection(),
        request_id,
        auth.user_id,
        &subject,
        &body,
        attachment_id,
    )
    .await?;

    run_best_effort(
        "dispute audit",
        pool.append_audit(
            &NewAuditEntry::new(auth.user_id, actions::OPEN_DISPUTE, "dispute", dispute.id)
                .with_metadata(json!({ "request_id": request_id, "subject": subject })),
        ),
    )
    .await;

    let label = request_label(&request);
    notify_admins(
        notifier.as_ref(),
        &config.admin_emails,
        NotificationEvent::DisputeOpened,
        &format!("Dispute opened on request {}", label),
        &format!("{}: {}", subject, body),
    )
    .await;

    Ok(HttpResponse::Created().json(dispute))
}

/// List a request's disputes.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/disputes",
    tag = "Disputes",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Disputes", body = DisputeListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/requests/{id}/disputes")]
pub async fn list_disputes(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    load_owned_request(&pool, &auth, request_id).await?;

    let disputes = disputes::list_for_request(pool.connection(), request_id).await?;

    Ok(HttpResponse::Ok().json(DisputeListResponse { disputes }))
}

/// Post a message to a request's thread.
///
/// A client message notifies the configured admins; an admin message
/// notifies the request owner in-app.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/messages",
    tag = "Disputes",
    params(("id" = Uuid, Path, description = "Request UUID")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = Message),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[post("/requests/{id}/messages")]
pub async fn post_message(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    body: web::Json<PostMessageRequest>,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    let request = load_owned_request(&pool, &auth, request_id).await?;

    let text = body.body.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message body is required".to_string()));
    }

    let message = messages::insert(pool.connection(), request_id, auth.user_id, text).await?;

    run_best_effort(
        "message audit",
        pool.append_audit(
            &NewAuditEntry::new(auth.user_id, actions::POST_MESSAGE, "message", message.id)
                .with_metadata(json!({ "request_id": request_id })),
        ),
    )
    .await;

    let title = format!("New message on request {}", request_label(&request));
    if auth.role.has_admin_authority() {
        // MESSAGE_POSTED is outside the client email whitelist, so the
        // owner gets the in-app row only.
        run_best_effort(
            "owner message notification",
            notifier.send(NotificationRequest::to_user(
                request.user_id,
                ActorRole::Client,
                NotificationEvent::MessagePosted,
                &title,
                text,
            )),
        )
        .await;
    } else {
        notify_admins(
            notifier.as_ref(),
            &config.admin_emails,
            NotificationEvent::MessagePosted,
            &title,
            text,
        )
        .await;
    }

    Ok(HttpResponse::Created().json(message))
}

/// List a request's message thread.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/messages",
    tag = "Disputes",
    params(("id" = Uuid, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Messages", body = MessageListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/requests/{id}/messages")]
pub async fn list_messages(
    auth: AuthContext,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let request_id = path.into_inner();
    load_owned_request(&pool, &auth, request_id).await?;

    let messages = messages::list_for_request(pool.connection(), request_id).await?;

    Ok(HttpResponse::Ok().json(MessageListResponse { messages }))
}

/// Configure dispute and message routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(open_dispute)
        .service(list_disputes)
        .service(post_message)
        .service(list_messages);
}
