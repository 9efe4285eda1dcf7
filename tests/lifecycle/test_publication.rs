//! Payment confirmation and final document publication.

use feridesk_lib::error::AppError;
use feridesk_lib::lifecycle::FinalFile;
use feridesk_lib::models::{
    DocumentCategory, InvoiceStatus, NotificationEvent, Recipient, RequestStatus, actions,
};
use feridesk_lib::services::storage::BlobStore;

use crate::support::*;

fn final_file(name: &str) -> FinalFile {
    FinalFile {
        file_name: name.to_string(),
        bytes: format!("%PDF-1.7 {}", name).into_bytes(),
        content_type: Some("application/pdf".to_string()),
    }
}

/// (1) Publishing two files records both deliveries, completes the request
/// and emails the documents with certificate-kind prefixes.
#[actix_rt::test]
async fn test_publish_two_files_completes_request() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentConfirmed);

    let outcome = h
        .engine
        .publish_final_documents(
            request.id,
            vec![final_file("feri-cert.pdf"), final_file("ad-cert.pdf")],
            None,
            admin(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.request.status, RequestStatus::Completed);
    assert_eq!(outcome.deliveries.len(), 2);
    for delivery in &outcome.deliveries {
        assert_eq!(delivery.status, "COMPLETED");
        assert!(h.blobs.contains(&delivery.pdf_url));
    }

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, NotificationEvent::DocumentsDelivered);
    let names: Vec<&str> = sent[0]
        .attachments
        .iter()
        .map(|a| a.file_name.as_str())
        .collect();
    assert_eq!(names, ["FERI-feri-cert.pdf", "AD-ad-cert.pdf"]);

    assert!(
        h.store
            .audit_actions()
            .contains(&actions::PUBLISH_FINAL_DOCUMENTS.to_string())
    );
}

/// (2) Publishing a COMPLETED request is rejected outright; nothing is
/// uploaded or recorded.
#[actix_rt::test]
async fn test_publish_rejected_when_already_completed() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Completed);

    let err = h
        .engine
        .publish_final_documents(request.id, vec![final_file("feri.pdf")], None, admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TerminalState(_)));
    assert!(h.store.deliveries().is_empty());
    assert!(h.blobs.is_empty());
}

/// (3) No attached files and no staged candidates is an error; the request
/// stays where it was.
#[actix_rt::test]
async fn test_publish_without_files_or_candidates_fails() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentConfirmed);

    let err = h
        .engine
        .publish_final_documents(request.id, Vec::new(), None, admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(
        h.store.request(request.id).status,
        RequestStatus::PaymentConfirmed
    );
}

/// (4) With no attached files, staged FINAL_CANDIDATE documents are
/// promoted to deliveries, reusing their blobs.
#[actix_rt::test]
async fn test_publish_promotes_staged_candidates() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentConfirmed);

    let key = format!("requests/{}/documents/staged-feri.pdf", request.id);
    h.blobs
        .put(&key, b"%PDF-1.7 staged".to_vec(), Some("application/pdf"))
        .await
        .unwrap();
    h.store.put_document(feridesk_lib::models::Document {
        id: uuid::Uuid::now_v7(),
        request_id: request.id,
        file_name: "staged-feri.pdf".to_string(),
        file_path: key.clone(),
        category: DocumentCategory::FinalCandidate,
        uploaded_by: uuid::Uuid::now_v7(),
        created_at: chrono::Utc::now(),
    });

    let outcome = h
        .engine
        .publish_final_documents(request.id, Vec::new(), None, admin())
        .await
        .unwrap();

    assert_eq!(outcome.request.status, RequestStatus::Completed);
    assert_eq!(outcome.deliveries.len(), 1);
    assert_eq!(outcome.deliveries[0].pdf_url, key);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments.len(), 1);
}

/// (5) A failed delivery row deletes the just-uploaded blob and aborts the
/// publish before completion.
#[actix_rt::test]
async fn test_failed_delivery_row_compensates_blob() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentConfirmed);
    h.store.fail_delivery_inserts();

    let err = h
        .engine
        .publish_final_documents(request.id, vec![final_file("feri.pdf")], None, admin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert!(h.blobs.is_empty());
    assert!(h.store.deliveries().is_empty());
    assert_eq!(
        h.store.request(request.id).status,
        RequestStatus::PaymentConfirmed
    );
}

/// (6) A supplied FERI reference is recorded on every delivery.
#[actix_rt::test]
async fn test_publish_records_feri_reference() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Validated);

    let outcome = h
        .engine
        .publish_final_documents(
            request.id,
            vec![final_file("feri.pdf")],
            Some("FERI-2026-0117"),
            admin(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.deliveries[0].feri_ref.as_deref(),
        Some("FERI-2026-0117")
    );
}

/// (7) Publication is admin-only.
#[actix_rt::test]
async fn test_publish_requires_admin() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentConfirmed);

    let err = h
        .engine
        .publish_final_documents(
            request.id,
            vec![final_file("feri.pdf")],
            None,
            client(request.user_id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
}

/// (8) Confirming a payment moves the request forward, marks the invoice
/// PAID and fans out to the client plus every configured admin address.
#[actix_rt::test]
async fn test_confirm_payment_happy_path() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentProofUploaded);
    seed_invoice(&h.store, &request);

    let updated = h.engine.confirm_payment(request.id, admin()).await.unwrap();

    assert_eq!(updated.status, RequestStatus::PaymentConfirmed);
    assert_eq!(h.store.invoices()[0].status, InvoiceStatus::Paid);
    assert!(
        h.store
            .audit_actions()
            .contains(&actions::CONFIRM_PAYMENT.to_string())
    );

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|n| n.event == NotificationEvent::PaymentConfirmed));
    assert!(
        sent.iter()
            .any(|n| n.recipient == Recipient::UserId(request.user_id))
    );
    assert!(
        sent.iter()
            .any(|n| n.recipient == Recipient::Email(OPS_EMAIL.to_string()))
    );
}

/// (9) Payment confirmation is not a retryable no-op: a second call fails.
#[actix_rt::test]
async fn test_confirm_payment_rejects_second_call() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentProofUploaded);
    seed_invoice(&h.store, &request);

    h.engine.confirm_payment(request.id, admin()).await.unwrap();
    let err = h.engine.confirm_payment(request.id, admin()).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidTransition(_)));
}

/// (10) Confirmation requires exactly PAYMENT_PROOF_UPLOADED.
#[actix_rt::test]
async fn test_confirm_payment_wrong_state() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    let err = h.engine.confirm_payment(request.id, admin()).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
}

/// (11) Payment confirmation is admin-only.
#[actix_rt::test]
async fn test_confirm_payment_requires_admin() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentProofUploaded);

    let err = h
        .engine
        .confirm_payment(request.id, client(request.user_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
}

/// (12) A request priced outside the system has no invoice row; the
/// confirmation still succeeds.
#[actix_rt::test]
async fn test_confirm_payment_without_invoice() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentProofUploaded);

    let updated = h.engine.confirm_payment(request.id, admin()).await.unwrap();

    assert_eq!(updated.status, RequestStatus::PaymentConfirmed);
}

/// (13) A down notification relay never fails the confirmation; the status
/// change is already durable.
#[actix_rt::test]
async fn test_confirm_payment_tolerates_notifier_failure() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::PaymentProofUploaded);
    seed_invoice(&h.store, &request);
    h.notifier.set_fail(true);

    let updated = h.engine.confirm_payment(request.id, admin()).await.unwrap();

    assert_eq!(updated.status, RequestStatus::PaymentConfirmed);
    assert!(h.notifier.sent().is_empty());
}
