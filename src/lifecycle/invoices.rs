//! Invoice ledger: one invoice per request, best-effort-sequential numbers.
//!
//! Numbering is scan-and-increment: take the highest existing numeric
//! suffix under the `INV-` prefix and add one. Two concurrent first-time
//! creations can compute the same number from a stale scan, so the unique
//! index on `invoice_number` is the arbiter and the insert retries with a
//! bumped number. Sequences may legitimately skip values under concurrency;
//! they are never gap-free.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::db::invoices::NewInvoice;
use crate::error::{AppError, AppResult};
use crate::models::{Invoice, InvoiceSource, ShipmentRequest};

use super::LifecycleEngine;

/// Human-readable numbering scheme prefix.
pub const INVOICE_PREFIX: &str = "INV-";

/// Bounded optimistic retries for the numbering race.
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Backoff step between attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Format a sequence value as an invoice number, e.g. `INV-00042`.
pub fn format_invoice_number(seq: u64) -> String {
    format!("{}{:05}", INVOICE_PREFIX, seq)
}

/// The highest numeric suffix among existing numbers, or 0 when none parse.
/// Malformed numbers are skipped rather than failing the scan.
pub fn max_invoice_seq<'a, I>(numbers: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    numbers
        .into_iter()
        .filter_map(|n| n.strip_prefix(INVOICE_PREFIX))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Pricing input for draft issuance.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    pub amount: Decimal,
    pub currency: String,
    pub cargo_route: Option<String>,
    pub customer_ref: Option<String>,
    pub source: InvoiceSource,
}

impl LifecycleEngine {
    /// Create the invoice for a request, or update the existing one.
    ///
    /// At most one invoice exists per request: a second call re-prices the
    /// existing row (status back to DRAFT, number unchanged) instead of
    /// inserting. First-time creation races on the number; the store's
    /// uniqueness constraint arbitrates and the insert retries with
    /// `max + attempt + 1` before giving up with `Conflict`.
    pub async fn create_or_update_invoice(
        &self,
        request: &ShipmentRequest,
        input: &InvoiceInput,
        created_by: Uuid,
    ) -> AppResult<Invoice> {
        let bill_of_lading = request.bill_of_lading().ok_or_else(|| {
            AppError::Validation(format!(
                "Request {} has no bill of lading; cannot invoice",
                request.id
            ))
        })?;

        if let Some(existing) = self.store.find_invoice_by_request(request.id).await? {
            return self
                .store
                .reprice_invoice(
                    existing.id,
                    input.amount,
                    &input.currency,
                    input.cargo_route.as_deref(),
                    input.customer_ref.as_deref(),
                )
                .await;
        }

        let numbers = self.store.invoice_numbers_with_prefix(INVOICE_PREFIX).await?;
        let max_seq = max_invoice_seq(numbers.iter().map(String::as_str));

        let mut last_conflict = None;
        for attempt in 0..MAX_NUMBER_ATTEMPTS {
            let new = NewInvoice {
                request_id: request.id,
                invoice_number: format_invoice_number(max_seq + u64::from(attempt) + 1),
                amount: input.amount,
                currency: input.currency.clone(),
                cargo_route: input.cargo_route.clone(),
                customer_ref: input.customer_ref.clone(),
                bill_of_lading: bill_of_lading.to_string(),
                source: input.source,
                created_by,
            };

            match self.store.insert_invoice(&new).await {
                Ok(invoice) => return Ok(invoice),
                Err(AppError::Conflict(msg)) => {
                    warn!(
                        "Invoice number {} collided (attempt {}), retrying",
                        new.invoice_number,
                        attempt + 1
                    );
                    last_conflict = Some(msg);
                    tokio::time::sleep(RETRY_BACKOFF * (attempt + 1)).await;
                }
                Err(other) => return Err(other),
            }
        }

        Err(AppError::Conflict(format!(
            "Invoice numbering retries exhausted for request {}: {}",
            request.id,
            last_conflict.unwrap_or_default()
        )))
    }
}
