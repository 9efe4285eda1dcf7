//! Final document publication: record deliveries, complete the request,
//! email the documents to the client.

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    ActorRole, CertificateKind, Delivery, DocumentCategory, NewAuditEntry, NotificationAttachment,
    NotificationEvent, NotificationRequest, RequestStatus, ShipmentRequest, actions,
};
use crate::services::storage::Storage;

use super::engine::TransitionOptions;
use super::{Actor, LifecycleEngine, run_best_effort};

/// One final file attached to a publish call: the main certificate, plus an
/// optional secondary AD file for mixed requests.
#[derive(Debug, Clone)]
pub struct FinalFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// What publication produced.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub request: ShipmentRequest,
    pub deliveries: Vec<Delivery>,
}

impl LifecycleEngine {
    /// Publish the final documents for a request.
    ///
    /// Rejected outright when the request is already COMPLETED: nothing is
    /// uploaded and no row is written. Each attached file is uploaded then
    /// recorded as a delivery; a failed row insert deletes the just-uploaded
    /// blob and aborts the publish. With no attached files, previously
    /// staged FINAL_CANDIDATE documents are promoted instead (error when
    /// none exist). Completion bypasses the transition table via the forced
    /// update, then the documents go out by email as attachments.
    pub async fn publish_final_documents(
        &self,
        request_id: Uuid,
        files: Vec<FinalFile>,
        feri_ref: Option<&str>,
        actor: Actor,
    ) -> AppResult<PublishOutcome> {
        if !actor.role.has_admin_authority() {
            return Err(AppError::Forbidden(
                "Publishing final documents requires admin authority".to_string(),
            ));
        }

        let request = self.load_request(request_id).await?;
        if request.status == RequestStatus::Completed {
            return Err(AppError::TerminalState(format!(
                "request {} is already COMPLETED",
                request_id
            )));
        }

        let deliveries = if files.is_empty() {
            self.promote_candidate_documents(&request, feri_ref, actor).await?
        } else {
            self.record_uploaded_deliveries(&request, files, feri_ref, actor).await?
        };

        let request = self
            .force_update_status(
                request_id,
                RequestStatus::Completed,
                actor,
                TransitionOptions { notify_client: false },
                None,
            )
            .await?;

        let audit =
            NewAuditEntry::new(actor.id, actions::PUBLISH_FINAL_DOCUMENTS, "request", request_id)
                .with_metadata(json!({
                    "deliveries": deliveries.iter().map(|d| d.id).collect::<Vec<_>>(),
                    "files": deliveries.iter().map(|d| d.file_name.clone()).collect::<Vec<_>>(),
                }));
        run_best_effort("audit publish", self.store.append_audit(&audit)).await;

        self.email_delivered_documents(&request, &deliveries).await;

        Ok(PublishOutcome {
            request,
            deliveries,
        })
    }

    /// Upload each attached file and record its delivery row. A row-insert
    /// failure deletes the orphaned blob and aborts; rows already recorded
    /// in this publish stay, the request simply never completes.
    async fn record_uploaded_deliveries(
        &self,
        request: &ShipmentRequest,
        files: Vec<FinalFile>,
        feri_ref: Option<&str>,
        actor: Actor,
    ) -> AppResult<Vec<Delivery>> {
        let mut deliveries = Vec::with_capacity(files.len());

        for file in files {
            let blob_key = Storage::delivery_key(&request.id.to_string(), &file.file_name);
            self.blobs
                .put(&blob_key, file.bytes, file.content_type.as_deref())
                .await?;

            let delivery = match self
                .store
                .insert_delivery(request.id, &blob_key, &file.file_name, actor.id, feri_ref)
                .await
            {
                Ok(delivery) => delivery,
                Err(e) => {
                    if let Err(cleanup) = self.blobs.delete(&blob_key).await {
                        warn!(
                            "Compensating delete of delivery blob {} failed: {}",
                            blob_key, cleanup
                        );
                    }
                    return Err(e);
                }
            };

            deliveries.push(delivery);
        }

        Ok(deliveries)
    }

    /// Fallback when the admin attached nothing: promote staged
    /// FINAL_CANDIDATE documents to deliveries, reusing their blobs.
    async fn promote_candidate_documents(
        &self,
        request: &ShipmentRequest,
        feri_ref: Option<&str>,
        actor: Actor,
    ) -> AppResult<Vec<Delivery>> {
        let existing = self.store.list_deliveries(request.id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let candidates = self
            .store
            .list_documents(request.id, Some(DocumentCategory::FinalCandidate))
            .await?;
        if candidates.is_empty() {
            return Err(AppError::Validation(format!(
                "Request {} has no final files to publish",
                request.id
            )));
        }

        let mut deliveries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let delivery = self
                .store
                .insert_delivery(
                    request.id,
                    &candidate.file_path,
                    &candidate.file_name,
                    actor.id,
                    feri_ref,
                )
                .await?;
            deliveries.push(delivery);
        }

        Ok(deliveries)
    }

    /// Sign one URL per delivered document and email them as attachments
    /// (the relay downloads and attaches; clients get files, not links).
    /// Best effort; the request is already COMPLETED.
    async fn email_delivered_documents(
        &self,
        request: &ShipmentRequest,
        deliveries: &[Delivery],
    ) {
        let mut attachments = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            match self.blobs.sign(&delivery.pdf_url, self.signed_url_ttl_secs).await {
                Ok(url) => {
                    let kind = CertificateKind::for_file(request.request_type, &delivery.file_name);
                    attachments.push(NotificationAttachment {
                        file_name: format!("{}-{}", kind, delivery.file_name),
                        url,
                    });
                }
                Err(e) => warn!(
                    "Could not sign delivery {} for email: {}",
                    delivery.id, e
                ),
            }
        }

        let notification = NotificationRequest::to_user(
            request.user_id,
            ActorRole::Client,
            NotificationEvent::DocumentsDelivered,
            "Your documents are ready",
            "Your final certificate documents are attached.",
        )
        .with_attachments(attachments)
        .with_metadata(json!({ "request_id": request.id }));

        run_best_effort("delivery email", self.notifier.send(notification)).await;
    }
}
