//! Draft issuance and invoicing: pricing, numbering under contention, and
//! the compensating cleanup when the draft row fails.

use rust_decimal::Decimal;

use feridesk_lib::error::AppError;
use feridesk_lib::models::{
    DraftKind, InvoiceSource, InvoiceStatus, NotificationEvent, RequestStatus, actions,
};

use crate::support::*;

/// (1) Full draft issuance: invoice INV-00001, draft blob and row, status
/// PROFORMAT_SENT, one DRAFT_AVAILABLE notification carrying both links.
#[actix_rt::test]
async fn test_send_draft_full_flow() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Created);

    let outcome = h
        .engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap();

    assert_eq!(outcome.invoice.invoice_number, "INV-00001");
    assert_eq!(outcome.invoice.amount, Decimal::new(450, 0));
    assert_eq!(outcome.invoice.bill_of_lading, "MAEU12345678");
    assert_eq!(outcome.invoice.status, InvoiceStatus::Draft);
    assert_eq!(outcome.draft.kind, DraftKind::Proforma);
    assert_eq!(outcome.draft.invoice_id, Some(outcome.invoice.id));
    assert_eq!(outcome.request.status, RequestStatus::ProformatSent);

    let expected_key = format!("requests/{}/drafts/proforma.pdf", request.id);
    assert_eq!(outcome.draft.file_path, expected_key);
    assert!(h.blobs.contains(&expected_key));

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, NotificationEvent::DraftAvailable);
    // Signed draft link plus the magic invoice link.
    assert_eq!(sent[0].links.len(), 2);
    assert!(sent[0].links[0].url.starts_with("https://blobs.test/"));
    assert!(sent[0].links[1].url.contains("/api/v1/auth/magic?token="));

    let audits = h.store.audit_actions();
    assert!(audits.contains(&actions::STATUS_TRANSITION.to_string()));
    assert!(audits.contains(&actions::SEND_DRAFT.to_string()));
}

/// (2) A second issuance re-prices the existing invoice in place: same row,
/// same number, new amount, status back to DRAFT.
#[actix_rt::test]
async fn test_send_draft_reprices_existing_invoice() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    h.engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap();

    let mut input = draft_input();
    input.amount = Decimal::new(500, 0);
    input.file_name = "proforma-v2.pdf".to_string();
    let outcome = h.engine.send_draft(request.id, input, admin()).await.unwrap();

    let invoices = h.store.invoices();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].invoice_number, "INV-00001");
    assert_eq!(invoices[0].amount, Decimal::new(500, 0));
    assert_eq!(invoices[0].status, InvoiceStatus::Draft);
    assert_eq!(outcome.invoice.id, invoices[0].id);
    // Both draft files remain on record.
    assert_eq!(h.store.drafts().len(), 2);
}

/// (3) Manual-source invoices never notify the client.
#[actix_rt::test]
async fn test_manual_source_skips_client_notification() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    let mut input = draft_input();
    input.source = InvoiceSource::Manual;
    let outcome = h.engine.send_draft(request.id, input, admin()).await.unwrap();

    assert_eq!(outcome.invoice.source, InvoiceSource::Manual);
    assert_eq!(outcome.request.status, RequestStatus::ProformatSent);
    assert!(h.notifier.sent().is_empty());
}

/// (4) A numbering collision retries with a bumped sequence.
#[actix_rt::test]
async fn test_invoice_numbering_retries_on_conflict() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);
    h.store.inject_invoice_conflicts(1);

    let outcome = h
        .engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap();

    assert_eq!(outcome.invoice.invoice_number, "INV-00002");
    assert_eq!(h.store.invoices().len(), 1);
}

/// (5) Three consecutive collisions exhaust the retries and surface a
/// conflict; no invoice is written.
#[actix_rt::test]
async fn test_invoice_numbering_gives_up() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);
    h.store.inject_invoice_conflicts(3);

    let err = h
        .engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert!(h.store.invoices().is_empty());
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
}

/// (6) A request with no bill of lading anywhere cannot be invoiced;
/// nothing is written.
#[actix_rt::test]
async fn test_send_draft_requires_bill_of_lading() {
    let h = harness();
    let request = seed_request_without_bl(&h.store, RequestStatus::Submitted);

    let err = h
        .engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.store.invoices().is_empty());
    assert!(h.blobs.is_empty());
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
}

/// (7) A failed draft row deletes the just-uploaded blob. The invoice is a
/// financial record and stays; the status never moves.
#[actix_rt::test]
async fn test_failed_draft_row_compensates_blob() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);
    h.store.fail_draft_inserts();

    let err = h
        .engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert!(h.blobs.is_empty());
    assert_eq!(h.store.invoices().len(), 1);
    assert!(h.store.drafts().is_empty());
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
}

/// (8) Draft issuance is admin-only.
#[actix_rt::test]
async fn test_send_draft_requires_admin() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    let err = h
        .engine
        .send_draft(request.id, draft_input(), client(request.user_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(h.store.invoices().is_empty());
}

/// (9) Non-positive amounts are rejected before any read or write.
#[actix_rt::test]
async fn test_send_draft_rejects_non_positive_amount() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    let mut input = draft_input();
    input.amount = Decimal::ZERO;
    let err = h.engine.send_draft(request.id, input, admin()).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.store.invoices().is_empty());
    assert!(h.blobs.is_empty());
}

/// (10) The transition guard runs before any write: a terminal request
/// fails draft issuance with nothing persisted.
#[actix_rt::test]
async fn test_send_draft_guard_runs_before_writes() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Cancelled);

    let err = h
        .engine
        .send_draft(request.id, draft_input(), admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TerminalState(_)));
    assert!(h.store.invoices().is_empty());
    assert!(h.blobs.is_empty());
}
