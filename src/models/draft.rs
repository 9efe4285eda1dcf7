//! Draft document models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What kind of preliminary document a draft row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftKind {
    /// Unpriced draft certificate.
    DraftFeri,
    /// Priced proforma tied to an invoice.
    Proforma,
}

impl DraftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DraftFeri => "DRAFT_FERI",
            Self::Proforma => "PROFORMA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT_FERI" => Some(Self::DraftFeri),
            "PROFORMA" => Some(Self::Proforma),
            _ => None,
        }
    }
}

impl std::fmt::Display for DraftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata row for a draft blob. The blob and the row are created together;
/// if either write fails the other is rolled back. Immutable afterwards.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestDraft {
    pub id: Uuid,
    pub request_id: Uuid,
    pub file_name: String,
    /// Blob key in object storage.
    pub file_path: String,
    pub kind: DraftKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}
