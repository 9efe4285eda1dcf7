//! Shipment request domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a shipment request.
///
/// Mutated only through the lifecycle engine; `Completed`, `Rejected` and
/// `Cancelled` are terminal and have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Submitted by the client, not yet picked up.
    Created,
    /// Admin requested additional supporting documents.
    AwaitingDocuments,
    /// Client completed the submission.
    Submitted,
    /// Admin started working the request.
    Processing,
    /// Under back-office review.
    UnderReview,
    /// A draft certificate was sent to the client.
    DraftSent,
    /// A priced proforma was sent to the client.
    ProformatSent,
    /// Client uploaded a proof of payment.
    PaymentProofUploaded,
    /// Client declared the payment as made.
    PaymentSubmitted,
    /// Admin confirmed the payment.
    PaymentConfirmed,
    /// Request validated for issuance.
    Validated,
    /// Final documents delivered. Terminal.
    Completed,
    /// Certificate issued by the authority.
    Issued,
    /// Rejected by an admin. Terminal.
    Rejected,
    /// Cancelled before payment. Terminal.
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::AwaitingDocuments => "AWAITING_DOCUMENTS",
            Self::Submitted => "SUBMITTED",
            Self::Processing => "PROCESSING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::DraftSent => "DRAFT_SENT",
            Self::ProformatSent => "PROFORMAT_SENT",
            Self::PaymentProofUploaded => "PAYMENT_PROOF_UPLOADED",
            Self::PaymentSubmitted => "PAYMENT_SUBMITTED",
            Self::PaymentConfirmed => "PAYMENT_CONFIRMED",
            Self::Validated => "VALIDATED",
            Self::Completed => "COMPLETED",
            Self::Issued => "ISSUED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "AWAITING_DOCUMENTS" => Some(Self::AwaitingDocuments),
            "SUBMITTED" => Some(Self::Submitted),
            "PROCESSING" => Some(Self::Processing),
            "UNDER_REVIEW" => Some(Self::UnderReview),
            "DRAFT_SENT" => Some(Self::DraftSent),
            "PROFORMAT_SENT" => Some(Self::ProformatSent),
            "PAYMENT_PROOF_UPLOADED" => Some(Self::PaymentProofUploaded),
            "PAYMENT_SUBMITTED" => Some(Self::PaymentSubmitted),
            "PAYMENT_CONFIRMED" => Some(Self::PaymentConfirmed),
            "VALIDATED" => Some(Self::Validated),
            "COMPLETED" => Some(Self::Completed),
            "ISSUED" => Some(Self::Issued),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// All statuses, in lifecycle order.
    pub const ALL: [RequestStatus; 15] = [
        Self::Created,
        Self::AwaitingDocuments,
        Self::Submitted,
        Self::Processing,
        Self::UnderReview,
        Self::DraftSent,
        Self::ProformatSent,
        Self::PaymentProofUploaded,
        Self::PaymentSubmitted,
        Self::PaymentConfirmed,
        Self::Validated,
        Self::Completed,
        Self::Issued,
        Self::Rejected,
        Self::Cancelled,
    ];
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Certificate type requested; immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    FeriOnly,
    AdOnly,
    FeriAndAd,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeriOnly => "FERI_ONLY",
            Self::AdOnly => "AD_ONLY",
            Self::FeriAndAd => "FERI_AND_AD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FERI_ONLY" => Some(Self::FeriOnly),
            "AD_ONLY" => Some(Self::AdOnly),
            "FERI_AND_AD" => Some(Self::FeriAndAd),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is acting on a request.
///
/// `System` is granted the same authority as `Admin` for every gated
/// transition; it identifies automated back-office callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Client,
    Admin,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CLIENT" => Some(Self::Client),
            "ADMIN" => Some(Self::Admin),
            "SYSTEM" => Some(Self::System),
            _ => None,
        }
    }

    /// System callers act with admin authority.
    pub fn has_admin_authority(&self) -> bool {
        matches!(self, Self::Admin | Self::System)
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A shipment request with its bill-of-lading fields normalized.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShipmentRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub request_type: RequestType,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bl_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_bl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_bl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentRequest {
    /// The authoritative bill of lading, resolved once here by precedence
    /// `bl_number > extracted_bl > manual_bl`. Blank strings count as absent.
    /// Callers must not re-implement this fallback chain.
    pub fn bill_of_lading(&self) -> Option<&str> {
        non_blank(&self.bl_number)
            .or_else(|| non_blank(&self.extracted_bl))
            .or_else(|| non_blank(&self.manual_bl))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Request to create a new shipment request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRequestRequest {
    pub request_type: RequestType,
    #[serde(default)]
    pub bl_number: Option<String>,
    #[serde(default)]
    pub cargo_route: Option<String>,
    #[serde(default)]
    pub customer_ref: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub cargo_description: Option<String>,
}

/// Body for a status transition.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Target status.
    pub to: RequestStatus,
    /// Suppress the client-facing notification on success (default: notify).
    #[serde(default)]
    pub notify_client: Option<bool>,
}

/// Body for an admin force-status update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForceStatusRequest {
    /// Target status, applied without consulting the transition table.
    pub status: RequestStatus,
    #[serde(default)]
    pub notify_client: Option<bool>,
    /// Free-form justification recorded in the audit trail.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query parameters for listing requests.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListRequestsQuery {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Response wrapper for a request list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestListResponse {
    pub requests: Vec<ShipmentRequest>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in RequestStatus::ALL {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(!RequestStatus::Issued.is_terminal());
        assert!(!RequestStatus::Created.is_terminal());
    }

    #[test]
    fn test_system_has_admin_authority() {
        assert!(ActorRole::System.has_admin_authority());
        assert!(ActorRole::Admin.has_admin_authority());
        assert!(!ActorRole::Client.has_admin_authority());
    }

    fn request_with_bls(
        bl_number: Option<&str>,
        extracted: Option<&str>,
        manual: Option<&str>,
    ) -> ShipmentRequest {
        ShipmentRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            request_type: RequestType::FeriOnly,
            status: RequestStatus::Created,
            bl_number: bl_number.map(String::from),
            extracted_bl: extracted.map(String::from),
            manual_bl: manual.map(String::from),
            cargo_route: None,
            customer_ref: None,
            origin: None,
            destination: None,
            cargo_description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bill_of_lading_precedence() {
        let req = request_with_bls(Some("BL-1"), Some("EX-1"), Some("MKC20260001"));
        assert_eq!(req.bill_of_lading(), Some("BL-1"));

        let req = request_with_bls(None, Some("EX-1"), Some("MKC20260001"));
        assert_eq!(req.bill_of_lading(), Some("EX-1"));

        let req = request_with_bls(None, None, Some("MKC20260001"));
        assert_eq!(req.bill_of_lading(), Some("MKC20260001"));

        let req = request_with_bls(None, None, None);
        assert_eq!(req.bill_of_lading(), None);
    }

    #[test]
    fn test_bill_of_lading_ignores_blank_values() {
        let req = request_with_bls(Some("   "), Some(""), Some("MKC20260002"));
        assert_eq!(req.bill_of_lading(), Some("MKC20260002"));
    }
}
