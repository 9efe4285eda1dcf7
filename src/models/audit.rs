//! Audit trail models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Well-known audit action tags.
pub mod actions {
    pub const STATUS_TRANSITION: &str = "STATUS_TRANSITION";
    pub const SEND_DRAFT: &str = "SEND_DRAFT";
    pub const CONFIRM_PAYMENT: &str = "CONFIRM_PAYMENT";
    pub const PUBLISH_FINAL_DOCUMENTS: &str = "PUBLISH_FINAL_DOCUMENTS";
    pub const REGENERATE_MANUAL_BL: &str = "REGENERATE_MANUAL_BL";
    pub const OPEN_DISPUTE: &str = "OPEN_DISPUTE";
    pub const POST_MESSAGE: &str = "POST_MESSAGE";
}

/// One append-only audit record. Never updated or deleted; a failed write
/// is logged and swallowed so it cannot abort the triggering operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    /// Free-form action tag, e.g. `CONFIRM_PAYMENT`.
    pub action: String,
    /// Entity kind, e.g. `request` or `invoice`.
    pub entity: String,
    pub entity_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending an audit record.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Uuid,
    pub action: String,
    pub entity: String,
    pub entity_id: Uuid,
    pub metadata: Option<JsonValue>,
}

impl NewAuditEntry {
    pub fn new(actor_id: Uuid, action: &str, entity: &str, entity_id: Uuid) -> Self {
        Self {
            actor_id,
            action: action.to_string(),
            entity: entity.to_string(),
            entity_id,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
