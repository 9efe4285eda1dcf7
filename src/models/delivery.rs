//! Final document delivery models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::request::RequestType;

/// Which certificate a delivered file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateKind {
    Feri,
    Ad,
}

impl CertificateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feri => "FERI",
            Self::Ad => "AD",
        }
    }

    /// Derive the certificate kind for a delivered file.
    ///
    /// Unambiguous request types decide directly; mixed requests fall back
    /// to a filename heuristic (a name containing "ad" is the AD file).
    pub fn for_file(request_type: RequestType, file_name: &str) -> Self {
        match request_type {
            RequestType::FeriOnly => Self::Feri,
            RequestType::AdOnly => Self::Ad,
            RequestType::FeriAndAd => {
                if file_name.to_lowercase().contains("ad") {
                    Self::Ad
                } else {
                    Self::Feri
                }
            }
        }
    }
}

impl std::fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finalized, delivered certificate document. Created only when final
/// documents are published; immutable once created. A request may have
/// several (separate FERI and AD files).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Delivery {
    pub id: Uuid,
    pub request_id: Uuid,
    /// Blob key of the delivered PDF.
    pub pdf_url: String,
    pub file_name: String,
    pub admin_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feri_ref: Option<String>,
    /// Always `COMPLETED`; kept as a column for reporting queries.
    pub status: String,
    pub delivered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_unambiguous_request_type() {
        assert_eq!(
            CertificateKind::for_file(RequestType::FeriOnly, "ad-certificate.pdf"),
            CertificateKind::Feri
        );
        assert_eq!(
            CertificateKind::for_file(RequestType::AdOnly, "feri.pdf"),
            CertificateKind::Ad
        );
    }

    #[test]
    fn test_kind_from_filename_for_mixed_requests() {
        assert_eq!(
            CertificateKind::for_file(RequestType::FeriAndAd, "AD-2026-041.pdf"),
            CertificateKind::Ad
        );
        assert_eq!(
            CertificateKind::for_file(RequestType::FeriAndAd, "certificate-final.pdf"),
            CertificateKind::Feri
        );
    }
}
