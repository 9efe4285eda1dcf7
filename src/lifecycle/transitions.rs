//! The transition table: which status changes are legal, and for whom.
//!
//! Each target status lists the statuses it may be reached from and the
//! roles allowed to request it. `SYSTEM` carries admin authority everywhere,
//! so the table only distinguishes "admin only" from "client or admin".
//! Terminal statuses never appear as a source; the engine rejects them
//! before consulting the table.

use crate::error::{AppError, AppResult};
use crate::models::{ActorRole, RequestStatus};

use RequestStatus::*;

/// Roles permitted to request a given transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    AdminOnly,
    ClientOrAdmin,
}

impl Gate {
    fn permits(&self, role: ActorRole) -> bool {
        match self {
            Gate::AdminOnly => role.has_admin_authority(),
            Gate::ClientOrAdmin => true,
        }
    }
}

/// The permitted source statuses and role gate for a target status, or
/// `None` for terminal targets' sources (terminal statuses are targets only).
fn rule(to: RequestStatus) -> Option<(&'static [RequestStatus], Gate)> {
    match to {
        AwaitingDocuments => Some((&[Created, Submitted, UnderReview], Gate::AdminOnly)),
        Submitted => Some((&[Created, AwaitingDocuments], Gate::ClientOrAdmin)),
        Processing => Some((&[Created, Submitted], Gate::AdminOnly)),
        UnderReview => Some((&[Submitted, Processing], Gate::AdminOnly)),
        DraftSent => Some((&[Submitted, Processing, UnderReview], Gate::AdminOnly)),
        ProformatSent => Some((
            &[
                Created,
                AwaitingDocuments,
                Submitted,
                Processing,
                UnderReview,
                DraftSent,
            ],
            Gate::AdminOnly,
        )),
        PaymentProofUploaded => Some((
            &[DraftSent, ProformatSent, PaymentSubmitted],
            Gate::ClientOrAdmin,
        )),
        PaymentSubmitted => Some((
            &[DraftSent, ProformatSent, PaymentProofUploaded],
            Gate::ClientOrAdmin,
        )),
        PaymentConfirmed => Some((&[PaymentProofUploaded, PaymentSubmitted], Gate::AdminOnly)),
        Validated => Some((&[PaymentConfirmed, UnderReview], Gate::AdminOnly)),
        Issued => Some((&[Validated, PaymentConfirmed], Gate::AdminOnly)),
        Completed => Some((&[Issued, Validated, PaymentConfirmed], Gate::AdminOnly)),
        // Admins may reject from any non-terminal status.
        Rejected => None,
        Cancelled => Some((
            &[
                Created,
                AwaitingDocuments,
                Submitted,
                Processing,
                UnderReview,
                DraftSent,
                ProformatSent,
            ],
            Gate::ClientOrAdmin,
        )),
        // Requests start in CREATED; nothing transitions back into it.
        Created => Some((&[], Gate::AdminOnly)),
    }
}

/// Whether `role` may move a request from `from` to `to`.
///
/// Assumes `from` is non-terminal and `from != to`; the engine handles the
/// terminal and same-target cases before calling this.
pub fn is_allowed(from: RequestStatus, to: RequestStatus, role: ActorRole) -> bool {
    match rule(to) {
        Some((sources, gate)) => sources.contains(&from) && gate.permits(role),
        // Rejection: any non-terminal source, admin authority required.
        None => role.has_admin_authority(),
    }
}

/// Guard a requested transition, producing the error the caller surfaces.
///
/// Order matters: terminal source beats everything, then the same-target
/// no-op is accepted for duplicate retries, then the table decides.
pub fn check(from: RequestStatus, to: RequestStatus, role: ActorRole) -> AppResult<()> {
    if from.is_terminal() {
        return Err(AppError::TerminalState(format!(
            "request is {} and cannot transition",
            from
        )));
    }
    if from == to {
        return Ok(());
    }
    if !is_allowed(from, to, role) {
        return Err(AppError::InvalidTransition(format!(
            "{} -> {} not permitted for {}",
            from, to, role
        )));
    }
    Ok(())
}
