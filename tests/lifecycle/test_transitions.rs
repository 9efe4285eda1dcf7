//! Status transition scenarios: role gates, terminal locks, retries, the
//! forced escape hatch and manual BL generation.

use chrono::{Datelike, Utc};
use serde_json::json;

use feridesk_lib::error::AppError;
use feridesk_lib::lifecycle::TransitionOptions;
use feridesk_lib::models::{NotificationEvent, RequestStatus, actions};

use crate::support::*;

/// (1) The request owner may complete their submission.
#[actix_rt::test]
async fn test_client_submits_own_request() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Created);

    let updated = h
        .engine
        .transition_status(
            request.id,
            RequestStatus::Submitted,
            client(request.user_id),
            TransitionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, RequestStatus::Submitted);
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
    assert_eq!(h.store.audit_actions(), vec![actions::STATUS_TRANSITION]);
}

/// (2) A client cannot take an admin-gated transition; nothing is written.
#[actix_rt::test]
async fn test_client_cannot_start_processing() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    let err = h
        .engine
        .transition_status(
            request.id,
            RequestStatus::Processing,
            client(request.user_id),
            TransitionOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
    assert!(h.store.audits().is_empty());
    assert!(h.notifier.sent().is_empty());
}

/// (3) Terminal statuses never transition, even to otherwise legal targets.
#[actix_rt::test]
async fn test_terminal_request_is_locked() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Cancelled);

    let err = h
        .engine
        .transition_status(
            request.id,
            RequestStatus::Submitted,
            admin(),
            TransitionOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TerminalState(_)));
    assert_eq!(h.store.request(request.id).status, RequestStatus::Cancelled);
}

/// (4) A duplicate retry into the current status succeeds as a no-op for
/// every non-terminal state: audited, but no notification goes back out.
#[actix_rt::test]
async fn test_same_target_retry_is_audited_noop() {
    for status in RequestStatus::ALL {
        if status.is_terminal() {
            continue;
        }
        let h = harness();
        let request = seed_request(&h.store, status);

        let updated = h
            .engine
            .transition_status(request.id, status, admin(), TransitionOptions::default())
            .await
            .unwrap();

        assert_eq!(updated.status, status);
        assert_eq!(
            h.store.audit_actions(),
            vec![actions::STATUS_TRANSITION],
            "from {}",
            status
        );
        assert!(h.notifier.sent().is_empty(), "from {}", status);
    }
}

/// (5) Admins may reject from every non-terminal status.
#[actix_rt::test]
async fn test_admin_rejects_from_any_non_terminal_status() {
    for status in RequestStatus::ALL {
        if status.is_terminal() {
            continue;
        }
        let h = harness();
        let request = seed_request(&h.store, status);

        let updated = h
            .engine
            .transition_status(
                request.id,
                RequestStatus::Rejected,
                admin(),
                TransitionOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, RequestStatus::Rejected, "from {}", status);
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1, "from {}", status);
        assert_eq!(sent[0].event, NotificationEvent::RequestRejected);
    }
}

/// (6) Clients can cancel up to the proforma, not once payment started.
#[actix_rt::test]
async fn test_client_cancellation_window() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::ProformatSent);
    let updated = h
        .engine
        .transition_status(
            request.id,
            RequestStatus::Cancelled,
            client(request.user_id),
            TransitionOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, RequestStatus::Cancelled);

    let request = seed_request(&h.store, RequestStatus::PaymentProofUploaded);
    let err = h
        .engine
        .transition_status(
            request.id,
            RequestStatus::Cancelled,
            client(request.user_id),
            TransitionOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

/// (7) Moving to AWAITING_DOCUMENTS notifies the client, unless the caller
/// suppressed the notification.
#[actix_rt::test]
async fn test_awaiting_documents_notification_and_suppression() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    h.engine
        .transition_status(
            request.id,
            RequestStatus::AwaitingDocuments,
            admin(),
            TransitionOptions::default(),
        )
        .await
        .unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, NotificationEvent::DocumentsRequested);

    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    h.engine
        .transition_status(
            request.id,
            RequestStatus::AwaitingDocuments,
            admin(),
            TransitionOptions { notify_client: false },
        )
        .await
        .unwrap();

    assert!(h.notifier.sent().is_empty());
}

/// (8) The forced update bypasses the table, terminal sources included, and
/// its audit entry records the bypass and the reason.
#[actix_rt::test]
async fn test_force_update_exits_terminal_state() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Cancelled);

    let updated = h
        .engine
        .force_update_status(
            request.id,
            RequestStatus::Submitted,
            admin(),
            TransitionOptions { notify_client: false },
            Some("cancelled by mistake"),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, RequestStatus::Submitted);

    let audits = h.store.audits();
    assert_eq!(audits.len(), 1);
    let metadata = audits[0].metadata.clone().unwrap();
    assert_eq!(metadata["forced"], json!(true));
    assert_eq!(metadata["reason"], json!("cancelled by mistake"));
}

/// (9) The forced update is admin-only.
#[actix_rt::test]
async fn test_force_update_requires_admin() {
    let h = harness();
    let request = seed_request(&h.store, RequestStatus::Submitted);

    let err = h
        .engine
        .force_update_status(
            request.id,
            RequestStatus::Completed,
            client(request.user_id),
            TransitionOptions::default(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(h.store.request(request.id).status, RequestStatus::Submitted);
}

/// (10) Unknown requests surface as NotFound.
#[actix_rt::test]
async fn test_transition_unknown_request() {
    let h = harness();

    let err = h
        .engine
        .transition_status(
            uuid::Uuid::now_v7(),
            RequestStatus::Submitted,
            admin(),
            TransitionOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

/// (11) Manual BL generation writes the year-scoped reference into both BL
/// fields and audits it.
#[actix_rt::test]
async fn test_manual_bl_generation() {
    let h = harness();
    let request = seed_request_without_bl(&h.store, RequestStatus::Created);

    let updated = h.engine.regenerate_manual_bl(request.id, admin()).await.unwrap();

    let expected = format!("MKC{}0001", Utc::now().year());
    assert_eq!(updated.manual_bl.as_deref(), Some(expected.as_str()));
    assert_eq!(updated.bl_number.as_deref(), Some(expected.as_str()));
    assert_eq!(h.store.audit_actions(), vec![actions::REGENERATE_MANUAL_BL]);
}

/// (12) A request that already has a manual BL keeps it; references are
/// never reissued.
#[actix_rt::test]
async fn test_manual_bl_never_reissued() {
    let h = harness();
    let mut request = seed_request_without_bl(&h.store, RequestStatus::Created);
    request.manual_bl = Some("MKC20240042".to_string());
    h.store.put_request(request.clone());

    let updated = h.engine.regenerate_manual_bl(request.id, admin()).await.unwrap();

    assert_eq!(updated.manual_bl.as_deref(), Some("MKC20240042"));
    assert!(h.store.audits().is_empty());
}

/// (13) The sequence continues from the highest existing reference of the
/// current year.
#[actix_rt::test]
async fn test_manual_bl_sequence_continues() {
    let h = harness();
    let year = Utc::now().year();

    let mut other = seed_request_without_bl(&h.store, RequestStatus::Completed);
    other.manual_bl = Some(format!("MKC{}0007", year));
    h.store.put_request(other);

    let request = seed_request_without_bl(&h.store, RequestStatus::Created);
    let updated = h.engine.regenerate_manual_bl(request.id, admin()).await.unwrap();

    assert_eq!(
        updated.manual_bl.as_deref(),
        Some(format!("MKC{}0008", year).as_str())
    );
}

/// (14) Manual BL generation is admin-only.
#[actix_rt::test]
async fn test_manual_bl_requires_admin() {
    let h = harness();
    let request = seed_request_without_bl(&h.store, RequestStatus::Created);

    let err = h
        .engine
        .regenerate_manual_bl(request.id, client(request.user_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
}
