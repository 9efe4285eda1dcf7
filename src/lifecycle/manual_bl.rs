//! Manual bill-of-lading references for requests where extraction failed.
//!
//! References follow `MKC{year}{seq}` with the sequence zero-padded to four
//! digits and scoped to the calendar year: `MKC20260001`, `MKC20260002`, ...
//! The next value comes from scanning the stored references for the current
//! year and taking max + 1.

use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewAuditEntry, ShipmentRequest, actions};

use super::{Actor, LifecycleEngine, run_best_effort};

const MANUAL_BL_PREFIX: &str = "MKC";

/// The year prefix all of this year's references share, e.g. `MKC2026`.
pub fn year_prefix(year: i32) -> String {
    format!("{}{}", MANUAL_BL_PREFIX, year)
}

/// Parse the sequence out of a reference for the given year. Sequences
/// shorter than four digits or non-numeric suffixes do not count.
pub fn parse_sequence(reference: &str, year: i32) -> Option<u32> {
    let suffix = reference.strip_prefix(&year_prefix(year))?;
    if suffix.len() < 4 {
        return None;
    }
    suffix.parse::<u32>().ok()
}

/// Compute the next reference for `year` given the existing references.
pub fn next_reference<'a, I>(year: i32, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|r| parse_sequence(r, year))
        .max()
        .unwrap_or(0);
    format!("{}{:04}", year_prefix(year), max + 1)
}

impl LifecycleEngine {
    /// Generate and persist a manual BL reference for a request.
    ///
    /// A request that already carries a `manual_bl` is returned unchanged;
    /// references are never reissued. Otherwise the next sequence for the
    /// current year is computed, written into both `manual_bl` and
    /// `bl_number` in one update, and audited.
    pub async fn regenerate_manual_bl(
        &self,
        request_id: Uuid,
        actor: Actor,
    ) -> AppResult<ShipmentRequest> {
        if !actor.role.has_admin_authority() {
            return Err(AppError::Forbidden(
                "Manual BL generation requires admin authority".to_string(),
            ));
        }

        let request = self.load_request(request_id).await?;
        if request
            .manual_bl
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
        {
            return Ok(request);
        }

        let year = Utc::now().year();
        let existing = self
            .store
            .bl_references_with_prefix(&year_prefix(year))
            .await?;
        let reference = next_reference(year, existing.iter().map(String::as_str));

        let updated = self.store.set_manual_bl(request_id, &reference).await?;

        let audit =
            NewAuditEntry::new(actor.id, actions::REGENERATE_MANUAL_BL, "request", request_id)
                .with_metadata(json!({ "reference": reference }));
        run_best_effort("audit manual BL", self.store.append_audit(&audit)).await;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("MKC20260001", 2026), Some(1));
        assert_eq!(parse_sequence("MKC20260107", 2026), Some(107));
        // Five-digit overflow still parses.
        assert_eq!(parse_sequence("MKC202610001", 2026), Some(10001));
    }

    #[test]
    fn test_parse_rejects_other_years_and_junk() {
        assert_eq!(parse_sequence("MKC20250042", 2026), None);
        assert_eq!(parse_sequence("MKC2026", 2026), None);
        assert_eq!(parse_sequence("MKC202601", 2026), None); // too short
        assert_eq!(parse_sequence("MKC2026ABCD", 2026), None);
        assert_eq!(parse_sequence("BL-12345", 2026), None);
    }

    #[test]
    fn test_next_reference_from_existing() {
        let existing = ["MKC20260001", "MKC20260007"];
        assert_eq!(next_reference(2026, existing), "MKC20260008");
    }

    #[test]
    fn test_next_reference_starts_at_one() {
        assert_eq!(next_reference(2026, []), "MKC20260001");
        // Other years' references do not advance this year's sequence.
        assert_eq!(
            next_reference(2026, ["MKC20250099"]),
            "MKC20260001"
        );
    }
}
