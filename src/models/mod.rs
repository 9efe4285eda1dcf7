//! Domain models for the FERI/AD request lifecycle.

pub mod audit;
pub mod delivery;
pub mod dispute;
pub mod document;
pub mod draft;
pub mod invoice;
pub mod notification;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use audit::{AuditEntry, NewAuditEntry, actions};
pub use delivery::{CertificateKind, Delivery};
pub use dispute::{Dispute, DisputeStatus, Message, OpenDisputeRequest, PostMessageRequest};
pub use document::{Document, DocumentCategory, DocumentListResponse, DocumentWithUrl};
pub use draft::{DraftKind, RequestDraft};
pub use invoice::{Invoice, InvoiceSource, InvoiceStatus};
pub use notification::{
    Channel, InAppNotification, NotificationAttachment, NotificationEvent, NotificationLink,
    NotificationListResponse, NotificationRequest, Recipient,
};
pub use request::{
    ActorRole, CreateRequestRequest, ForceStatusRequest, ListRequestsQuery, RequestListResponse,
    RequestStatus, RequestType, ShipmentRequest, TransitionRequest,
};
pub use user::{User, UserResponse};
