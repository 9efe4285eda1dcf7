//! Request lifecycle core: the state machine, its transition guard, and the
//! orchestrated workflows (draft issuance, payment confirmation, final
//! publication, manual BL generation) built on top of it.
//!
//! The engine owns the `status` field of a request. Controllers never write
//! it directly; they call [`LifecycleEngine`] which validates the transition
//! against the table in [`transitions`], persists the new status, and runs
//! the mandated side effects. Audit writes and notification dispatch are
//! best effort: once the status (and any invoice/delivery row) is durable,
//! nothing rolls it back.

pub mod engine;
pub mod invoices;
pub mod manual_bl;
pub mod payments;
pub mod publish;
pub mod store;
pub mod transitions;

mod drafts;

pub use drafts::{SendDraftInput, SendDraftOutcome};
pub use engine::{LifecycleEngine, TransitionOptions};
pub use invoices::InvoiceInput;
pub use publish::{FinalFile, PublishOutcome};
pub use store::WorkflowStore;

use std::future::Future;

use tracing::warn;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::ActorRole;

/// Who is performing a lifecycle operation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }
}

/// Run a non-critical side effect: audit writes and notification dispatch
/// must never fail the operation that triggered them. Errors are logged at
/// warn level and swallowed.
pub(crate) async fn run_best_effort<T, F>(label: &str, fut: F)
where
    F: Future<Output = AppResult<T>>,
{
    if let Err(e) = fut.await {
        warn!("Best-effort step '{}' failed: {}", label, e);
    }
}
