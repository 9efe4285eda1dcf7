//! Draft issuance ("send draft"): price the request, persist the proforma
//! file, move to PROFORMAT_SENT, tell the client.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{
    ActorRole, DraftKind, Invoice, InvoiceSource, NewAuditEntry, NotificationEvent,
    NotificationLink, NotificationRequest, RequestDraft, RequestStatus, ShipmentRequest, actions,
};
use crate::services::storage::Storage;

use super::engine::TransitionOptions;
use super::invoices::InvoiceInput;
use super::{Actor, LifecycleEngine, run_best_effort, transitions};

/// Validated input for draft issuance. The controller enforces "exactly one
/// attached file" at the multipart boundary; here the file is simply
/// required.
#[derive(Debug, Clone)]
pub struct SendDraftInput {
    pub amount: Decimal,
    pub currency: String,
    pub cargo_route: String,
    pub customer_ref: Option<String>,
    pub source: InvoiceSource,
    pub kind: DraftKind,
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl SendDraftInput {
    fn validate(&self) -> AppResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(AppError::Validation("currency is required".to_string()));
        }
        if self.cargo_route.trim().is_empty() {
            return Err(AppError::Validation("cargo route is required".to_string()));
        }
        if self.file_name.trim().is_empty() || self.file_bytes.is_empty() {
            return Err(AppError::Validation(
                "one attached draft file is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// What draft issuance produced.
#[derive(Debug, Clone)]
pub struct SendDraftOutcome {
    pub request: ShipmentRequest,
    pub invoice: Invoice,
    pub draft: RequestDraft,
}

impl LifecycleEngine {
    /// Issue a priced draft to the client.
    ///
    /// Sequence: validate -> create-or-update the invoice -> upload the
    /// draft blob and record its row (compensating blob delete on row
    /// failure) -> transition to PROFORMAT_SENT -> audit -> notify.
    ///
    /// The transition guard runs up front so a request that cannot reach
    /// PROFORMAT_SENT fails before any write. After that point the invoice
    /// row, once durable, is never rolled back; it is a financial record
    /// and re-running the operation re-prices it. Audit and notification
    /// failures after the draft is durable are swallowed. Manual-source
    /// invoices never notify the client.
    pub async fn send_draft(
        &self,
        request_id: uuid::Uuid,
        input: SendDraftInput,
        actor: Actor,
    ) -> AppResult<SendDraftOutcome> {
        if !actor.role.has_admin_authority() {
            return Err(AppError::Forbidden(
                "Draft issuance requires admin authority".to_string(),
            ));
        }
        input.validate()?;

        let request = self.load_request(request_id).await?;
        transitions::check(request.status, RequestStatus::ProformatSent, actor.role)?;

        let invoice = self
            .create_or_update_invoice(
                &request,
                &InvoiceInput {
                    amount: input.amount,
                    currency: input.currency.clone(),
                    cargo_route: Some(input.cargo_route.clone()),
                    customer_ref: input.customer_ref.clone(),
                    source: input.source,
                },
                actor.id,
            )
            .await?;

        // Upload-then-record: the blob store has no transactions, so a
        // failed row insert deletes the orphaned blob.
        let blob_key = Storage::draft_key(&request_id.to_string(), &input.file_name);
        self.blobs
            .put(&blob_key, input.file_bytes.clone(), input.content_type.as_deref())
            .await?;

        let draft = match self
            .store
            .insert_draft(
                request_id,
                &input.file_name,
                &blob_key,
                input.kind,
                Some(invoice.id),
                actor.id,
            )
            .await
        {
            Ok(draft) => draft,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&blob_key).await {
                    warn!(
                        "Compensating delete of draft blob {} failed: {}",
                        blob_key, cleanup
                    );
                }
                return Err(e);
            }
        };

        let request = self
            .transition_status(
                request_id,
                RequestStatus::ProformatSent,
                actor,
                TransitionOptions { notify_client: false },
            )
            .await?;

        let audit = NewAuditEntry::new(actor.id, actions::SEND_DRAFT, "request", request_id)
            .with_metadata(json!({
                "invoice_id": invoice.id,
                "invoice_number": invoice.invoice_number,
                "amount": invoice.amount.to_string(),
                "currency": invoice.currency,
                "draft_id": draft.id,
            }));
        run_best_effort("audit send draft", self.store.append_audit(&audit)).await;

        if invoice.source != InvoiceSource::Manual {
            self.notify_draft_available(&request, &invoice, &draft).await;
        }

        Ok(SendDraftOutcome {
            request,
            invoice,
            draft,
        })
    }

    /// Best-effort DRAFT_AVAILABLE dispatch with a signed draft link and a
    /// magic preview link for the invoice.
    async fn notify_draft_available(
        &self,
        request: &ShipmentRequest,
        invoice: &Invoice,
        draft: &RequestDraft,
    ) {
        let mut links = Vec::new();

        match self.blobs.sign(&draft.file_path, self.signed_url_ttl_secs).await {
            Ok(url) => links.push(NotificationLink {
                label: format!("Draft: {}", draft.file_name),
                url,
            }),
            Err(e) => warn!("Could not sign draft link for {}: {}", draft.id, e),
        }

        match self
            .magic_links
            .link_for(request.user_id, &format!("/invoices/{}", invoice.id))
        {
            Ok(url) => links.push(NotificationLink {
                label: format!("Invoice {}", invoice.invoice_number),
                url,
            }),
            Err(e) => warn!("Could not mint magic link for invoice {}: {}", invoice.id, e),
        }

        let notification = NotificationRequest::to_user(
            request.user_id,
            ActorRole::Client,
            NotificationEvent::DraftAvailable,
            "Your draft is ready",
            &format!(
                "A priced draft ({} {}) is ready for your review.",
                invoice.amount, invoice.currency
            ),
        )
        .with_links(links)
        .with_metadata(json!({
            "request_id": request.id,
            "invoice_number": invoice.invoice_number,
        }));

        run_best_effort("draft notification", self.notifier.send(notification)).await;
    }
}
