//! Notification models: events, channels and per-role email whitelists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use super::request::{ActorRole, RequestStatus};

/// Every notification event the system can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    DraftAvailable,
    PaymentConfirmed,
    DocumentsDelivered,
    RequestRejected,
    DocumentsRequested,
    RequestValidated,
    PaymentProofUploaded,
    PaymentSubmitted,
    RequestSubmitted,
    DisputeOpened,
    MessagePosted,
}

/// Client-facing events that also go out by email. Everything else reaches
/// clients in-app only.
const CLIENT_EMAIL_EVENTS: [NotificationEvent; 5] = [
    NotificationEvent::DraftAvailable,
    NotificationEvent::PaymentConfirmed,
    NotificationEvent::DocumentsDelivered,
    NotificationEvent::RequestRejected,
    NotificationEvent::DocumentsRequested,
];

/// Admin email coverage is broader: everything clients get plus the
/// operational events the back office watches for.
const ADMIN_EMAIL_EVENTS: [NotificationEvent; 11] = [
    NotificationEvent::DraftAvailable,
    NotificationEvent::PaymentConfirmed,
    NotificationEvent::DocumentsDelivered,
    NotificationEvent::RequestRejected,
    NotificationEvent::DocumentsRequested,
    NotificationEvent::RequestValidated,
    NotificationEvent::PaymentProofUploaded,
    NotificationEvent::PaymentSubmitted,
    NotificationEvent::RequestSubmitted,
    NotificationEvent::DisputeOpened,
    NotificationEvent::MessagePosted,
];

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DraftAvailable => "DRAFT_AVAILABLE",
            Self::PaymentConfirmed => "PAYMENT_CONFIRMED",
            Self::DocumentsDelivered => "DOCUMENTS_DELIVERED",
            Self::RequestRejected => "REQUEST_REJECTED",
            Self::DocumentsRequested => "DOCUMENTS_REQUESTED",
            Self::RequestValidated => "REQUEST_VALIDATED",
            Self::PaymentProofUploaded => "PAYMENT_PROOF_UPLOADED",
            Self::PaymentSubmitted => "PAYMENT_SUBMITTED",
            Self::RequestSubmitted => "REQUEST_SUBMITTED",
            Self::DisputeOpened => "DISPUTE_OPENED",
            Self::MessagePosted => "MESSAGE_POSTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT_AVAILABLE" => Some(Self::DraftAvailable),
            "PAYMENT_CONFIRMED" => Some(Self::PaymentConfirmed),
            "DOCUMENTS_DELIVERED" => Some(Self::DocumentsDelivered),
            "REQUEST_REJECTED" => Some(Self::RequestRejected),
            "DOCUMENTS_REQUESTED" => Some(Self::DocumentsRequested),
            "REQUEST_VALIDATED" => Some(Self::RequestValidated),
            "PAYMENT_PROOF_UPLOADED" => Some(Self::PaymentProofUploaded),
            "PAYMENT_SUBMITTED" => Some(Self::PaymentSubmitted),
            "REQUEST_SUBMITTED" => Some(Self::RequestSubmitted),
            "DISPUTE_OPENED" => Some(Self::DisputeOpened),
            "MESSAGE_POSTED" => Some(Self::MessagePosted),
            _ => None,
        }
    }

    /// Whether this event goes out by email to a recipient with the given
    /// role. An event outside the whitelist is skipped silently, not an
    /// error; the in-app row is written regardless.
    pub fn email_allowed_for(&self, role: ActorRole) -> bool {
        match role {
            ActorRole::Client => CLIENT_EMAIL_EVENTS.contains(self),
            ActorRole::Admin | ActorRole::System => ADMIN_EMAIL_EVENTS.contains(self),
        }
    }

    /// The client-facing event a successful transition into `status` emits,
    /// if any.
    pub fn for_status(status: RequestStatus) -> Option<Self> {
        match status {
            RequestStatus::DraftSent | RequestStatus::ProformatSent => Some(Self::DraftAvailable),
            RequestStatus::PaymentConfirmed => Some(Self::PaymentConfirmed),
            RequestStatus::Completed => Some(Self::DocumentsDelivered),
            RequestStatus::Rejected => Some(Self::RequestRejected),
            RequestStatus::AwaitingDocuments => Some(Self::DocumentsRequested),
            RequestStatus::Validated => Some(Self::RequestValidated),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
}

/// Where a notification goes: a known user, or a raw address override
/// (used for configured admin recipients with no user account).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    UserId(Uuid),
    Email(String),
}

/// A hyperlink included in a notification body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationLink {
    pub label: String,
    pub url: String,
}

/// A file the email relay should download and attach.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationAttachment {
    pub file_name: String,
    /// Signed URL the relay fetches the content from.
    pub url: String,
}

/// A single dispatch requested from the notifier.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub recipient: Recipient,
    /// Role used for email whitelist filtering.
    pub recipient_role: ActorRole,
    pub event: NotificationEvent,
    pub title: String,
    pub message: String,
    pub channels: Vec<Channel>,
    pub links: Vec<NotificationLink>,
    pub attachments: Vec<NotificationAttachment>,
    pub metadata: Option<JsonValue>,
}

impl NotificationRequest {
    /// Dispatch to a user on both channels with no extras.
    pub fn to_user(
        user_id: Uuid,
        role: ActorRole,
        event: NotificationEvent,
        title: &str,
        message: &str,
    ) -> Self {
        Self {
            recipient: Recipient::UserId(user_id),
            recipient_role: role,
            event,
            title: title.to_string(),
            message: message.to_string(),
            channels: vec![Channel::InApp, Channel::Email],
            links: Vec::new(),
            attachments: Vec::new(),
            metadata: None,
        }
    }

    /// Dispatch to a raw email address (email channel only).
    pub fn to_address(
        email: &str,
        role: ActorRole,
        event: NotificationEvent,
        title: &str,
        message: &str,
    ) -> Self {
        Self {
            recipient: Recipient::Email(email.to_string()),
            recipient_role: role,
            event,
            title: title.to_string(),
            message: message.to_string(),
            channels: vec![Channel::Email],
            links: Vec::new(),
            attachments: Vec::new(),
            metadata: None,
        }
    }

    pub fn with_links(mut self, links: Vec<NotificationLink>) -> Self {
        self.links = links;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<NotificationAttachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Stored in-app notification row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InAppNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event: NotificationEvent,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Response wrapper for the in-app feed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<InAppNotification>,
    pub unread: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_email_whitelist_is_curated() {
        assert!(NotificationEvent::DraftAvailable.email_allowed_for(ActorRole::Client));
        assert!(NotificationEvent::DocumentsDelivered.email_allowed_for(ActorRole::Client));
        assert!(!NotificationEvent::RequestValidated.email_allowed_for(ActorRole::Client));
        assert!(!NotificationEvent::DisputeOpened.email_allowed_for(ActorRole::Client));
    }

    #[test]
    fn test_admin_email_whitelist_is_broader() {
        assert!(NotificationEvent::PaymentProofUploaded.email_allowed_for(ActorRole::Admin));
        assert!(NotificationEvent::DisputeOpened.email_allowed_for(ActorRole::Admin));
        assert!(NotificationEvent::RequestValidated.email_allowed_for(ActorRole::System));
    }

    #[test]
    fn test_status_event_mapping() {
        assert_eq!(
            NotificationEvent::for_status(RequestStatus::ProformatSent),
            Some(NotificationEvent::DraftAvailable)
        );
        assert_eq!(
            NotificationEvent::for_status(RequestStatus::DraftSent),
            Some(NotificationEvent::DraftAvailable)
        );
        assert_eq!(
            NotificationEvent::for_status(RequestStatus::Completed),
            Some(NotificationEvent::DocumentsDelivered)
        );
        assert_eq!(NotificationEvent::for_status(RequestStatus::Processing), None);
        assert_eq!(NotificationEvent::for_status(RequestStatus::Issued), None);
    }
}
