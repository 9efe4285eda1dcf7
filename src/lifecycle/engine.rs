//! The lifecycle engine: guarded status transitions and their side effects.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    ActorRole, NewAuditEntry, NotificationEvent, NotificationRequest, RequestStatus,
    ShipmentRequest, actions,
};
use crate::services::{MagicLinkService, Notifier};
use crate::services::storage::BlobStore;

use super::store::WorkflowStore;
use super::{Actor, run_best_effort, transitions};

/// Options for a status transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionOptions {
    /// Dispatch a client-facing notification when the target maps to one.
    pub notify_client: bool,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self { notify_client: true }
    }
}

/// Orchestrates every mutation of a request's `status` plus the mandated
/// side effects. Collaborators are injected so the engine runs unchanged
/// against fakes in tests.
#[derive(Clone)]
pub struct LifecycleEngine {
    pub(super) store: Arc<dyn WorkflowStore>,
    pub(super) blobs: Arc<dyn BlobStore>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) magic_links: MagicLinkService,
    /// Back-office addresses copied on payment events.
    pub(super) admin_emails: Vec<String>,
    pub(super) signed_url_ttl_secs: u64,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        magic_links: MagicLinkService,
        admin_emails: Vec<String>,
        signed_url_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            blobs,
            notifier,
            magic_links,
            admin_emails,
            signed_url_ttl_secs,
        }
    }

    pub(super) async fn load_request(&self, id: Uuid) -> AppResult<ShipmentRequest> {
        self.store
            .get_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))
    }

    /// Move a request to `to`, enforcing the transition table.
    ///
    /// Guard failures mutate nothing and write no audit entry. A request
    /// already in `to` succeeds as a no-op (duplicate client retries are
    /// tolerated); the audit entry is still written but no notification is
    /// re-sent. Once the status write is durable, audit and notification
    /// failures are swallowed.
    pub async fn transition_status(
        &self,
        request_id: Uuid,
        to: RequestStatus,
        actor: Actor,
        opts: TransitionOptions,
    ) -> AppResult<ShipmentRequest> {
        let request = self.load_request(request_id).await?;
        let from = request.status;

        transitions::check(from, to, actor.role)?;

        let updated = if from == to {
            request
        } else {
            self.store.update_request_status(request_id, to).await?
        };

        info!(
            "Request {} status {} -> {} by {} {}",
            request_id, from, to, actor.role, actor.id
        );

        let audit = NewAuditEntry::new(actor.id, actions::STATUS_TRANSITION, "request", request_id)
            .with_metadata(json!({ "from": from.as_str(), "to": to.as_str() }));
        run_best_effort("audit status transition", self.store.append_audit(&audit)).await;

        if opts.notify_client && from != to {
            self.notify_status_change(&updated, to).await;
        }

        Ok(updated)
    }

    /// Admin/system escape hatch: apply `to` without consulting the
    /// transition table, terminal sources included. Corrective use only;
    /// the audit entry records the bypass.
    pub async fn force_update_status(
        &self,
        request_id: Uuid,
        to: RequestStatus,
        actor: Actor,
        opts: TransitionOptions,
        reason: Option<&str>,
    ) -> AppResult<ShipmentRequest> {
        if !actor.role.has_admin_authority() {
            return Err(AppError::Forbidden(
                "Force status updates require admin authority".to_string(),
            ));
        }

        let request = self.load_request(request_id).await?;
        let from = request.status;

        let updated = if from == to {
            request
        } else {
            self.store.update_request_status(request_id, to).await?
        };

        info!(
            "Request {} status FORCED {} -> {} by {} {}",
            request_id, from, to, actor.role, actor.id
        );

        let mut metadata = json!({
            "from": from.as_str(),
            "to": to.as_str(),
            "forced": true,
        });
        if let Some(reason) = reason {
            metadata["reason"] = json!(reason);
        }
        let audit = NewAuditEntry::new(actor.id, actions::STATUS_TRANSITION, "request", request_id)
            .with_metadata(metadata);
        run_best_effort("audit forced status update", self.store.append_audit(&audit)).await;

        if opts.notify_client && from != to {
            self.notify_status_change(&updated, to).await;
        }

        Ok(updated)
    }

    /// Dispatch the client-facing notification mapped to `to`, if any.
    /// Best effort; the status change is already committed.
    pub(super) async fn notify_status_change(&self, request: &ShipmentRequest, to: RequestStatus) {
        let Some(event) = NotificationEvent::for_status(to) else {
            return;
        };

        let (title, message) = status_notification_copy(to, request);
        let notification = NotificationRequest::to_user(
            request.user_id,
            ActorRole::Client,
            event,
            &title,
            &message,
        );
        run_best_effort("status notification", self.notifier.send(notification)).await;
    }
}

/// Subject and body for a client status notification.
fn status_notification_copy(to: RequestStatus, request: &ShipmentRequest) -> (String, String) {
    let reference = request
        .bill_of_lading()
        .map(|bl| format!("request (BL {})", bl))
        .unwrap_or_else(|| format!("request {}", request.id));

    match to {
        RequestStatus::DraftSent | RequestStatus::ProformatSent => (
            "Your draft is ready".to_string(),
            format!("A priced draft for your {} is available for review.", reference),
        ),
        RequestStatus::PaymentConfirmed => (
            "Payment confirmed".to_string(),
            format!("We confirmed the payment for your {}.", reference),
        ),
        RequestStatus::Completed => (
            "Documents delivered".to_string(),
            format!("The final documents for your {} have been issued.", reference),
        ),
        RequestStatus::Rejected => (
            "Request rejected".to_string(),
            format!("Your {} was rejected. Contact support for details.", reference),
        ),
        RequestStatus::AwaitingDocuments => (
            "Documents required".to_string(),
            format!("Additional documents are needed for your {}.", reference),
        ),
        RequestStatus::Validated => (
            "Request validated".to_string(),
            format!("Your {} passed validation.", reference),
        ),
        other => (
            format!("Request update: {}", other),
            format!("Your {} moved to {}.", reference, other),
        ),
    }
}
