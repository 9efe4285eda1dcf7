//! Uploaded supporting document models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What an uploaded document is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCategory {
    /// Supporting paperwork uploaded by the client.
    Supporting,
    /// Proof-of-payment upload.
    PaymentProof,
    /// Admin-staged file that publishing may promote to a delivery.
    FinalCandidate,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supporting => "SUPPORTING",
            Self::PaymentProof => "PAYMENT_PROOF",
            Self::FinalCandidate => "FINAL_CANDIDATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUPPORTING" => Some(Self::Supporting),
            "PAYMENT_PROOF" => Some(Self::PaymentProof),
            "FINAL_CANDIDATE" => Some(Self::FinalCandidate),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata row for an uploaded document blob.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub request_id: Uuid,
    pub file_name: String,
    /// Blob key in object storage.
    pub file_path: String,
    pub category: DocumentCategory,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Document plus a freshly signed download URL.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentWithUrl {
    #[serde(flatten)]
    pub document: Document,
    pub url: String,
}

/// Response wrapper listing a request's documents.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentWithUrl>,
}
