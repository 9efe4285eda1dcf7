//! Payment confirmation.

use futures_util::future::join_all;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    ActorRole, NewAuditEntry, NotificationEvent, NotificationRequest, RequestStatus,
    ShipmentRequest, actions,
};

use super::engine::TransitionOptions;
use super::{Actor, LifecycleEngine, run_best_effort};

impl LifecycleEngine {
    /// Confirm a payment whose proof the client uploaded.
    ///
    /// The precondition is strict: the request must be exactly in
    /// PAYMENT_PROOF_UPLOADED. Re-running after success rejects rather
    /// than silently succeeding; payment confirmation is not a retryable
    /// no-op. On success the invoice moves to PAID, the confirmation is
    /// audited, and client plus configured admin recipients are notified
    /// in parallel, tolerating individual failures.
    pub async fn confirm_payment(
        &self,
        request_id: Uuid,
        actor: Actor,
    ) -> AppResult<ShipmentRequest> {
        if !actor.role.has_admin_authority() {
            return Err(AppError::Forbidden(
                "Payment confirmation requires admin authority".to_string(),
            ));
        }

        let request = self.load_request(request_id).await?;
        if request.status != RequestStatus::PaymentProofUploaded {
            return Err(AppError::InvalidTransition(format!(
                "payment confirmation requires status PAYMENT_PROOF_UPLOADED, found {}",
                request.status
            )));
        }

        let request = self
            .transition_status(
                request_id,
                RequestStatus::PaymentConfirmed,
                actor,
                TransitionOptions { notify_client: false },
            )
            .await?;

        // The invoice is the financial record; flip it to PAID. A missing
        // row (manual flows priced outside the system) is logged, not fatal.
        match self.store.find_invoice_by_request(request_id).await? {
            Some(invoice) => {
                self.store.mark_invoice_paid(invoice.id).await?;
            }
            None => warn!("Request {} has no invoice to mark paid", request_id),
        }

        let audit = NewAuditEntry::new(actor.id, actions::CONFIRM_PAYMENT, "request", request_id)
            .with_metadata(json!({ "status": RequestStatus::PaymentConfirmed.as_str() }));
        run_best_effort("audit confirm payment", self.store.append_audit(&audit)).await;

        self.fan_out_payment_confirmed(&request).await;

        Ok(request)
    }

    /// Notify the client and every configured admin address at once.
    /// `join_all` waits for the full set and never propagates a partial
    /// failure.
    async fn fan_out_payment_confirmed(&self, request: &ShipmentRequest) {
        let reference = request
            .bill_of_lading()
            .map(|bl| format!("BL {}", bl))
            .unwrap_or_else(|| format!("request {}", request.id));

        let mut dispatches = vec![NotificationRequest::to_user(
            request.user_id,
            ActorRole::Client,
            NotificationEvent::PaymentConfirmed,
            "Payment confirmed",
            &format!("We confirmed the payment for your {}.", reference),
        )];

        for address in &self.admin_emails {
            dispatches.push(NotificationRequest::to_address(
                address,
                ActorRole::Admin,
                NotificationEvent::PaymentConfirmed,
                "Payment confirmed",
                &format!("Payment confirmed for {}.", reference),
            ));
        }

        let results = join_all(
            dispatches
                .into_iter()
                .map(|notification| self.notifier.send(notification)),
        )
        .await;

        for result in results {
            if let Err(e) = result {
                warn!("Payment confirmation notification failed: {}", e);
            }
        }
    }
}
