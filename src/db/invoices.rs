//! Database queries for invoices.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::entity::invoice::{self, ActiveModel, Entity as InvoiceEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Invoice, InvoiceSource, InvoiceStatus};

use super::DbPool;

/// Field values for a fresh invoice row.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub request_id: Uuid,
    pub invoice_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub cargo_route: Option<String>,
    pub customer_ref: Option<String>,
    pub bill_of_lading: String,
    pub source: InvoiceSource,
    pub created_by: Uuid,
}

impl DbPool {
    /// Find the invoice for a request, if one exists. At most one row by
    /// schema constraint.
    pub async fn find_invoice_by_request(&self, request_id: Uuid) -> AppResult<Option<Invoice>> {
        let result = InvoiceEntity::find()
            .filter(invoice::Column::RequestId.eq(request_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find invoice: {}", e)))?;

        result.map(model_to_invoice).transpose()
    }

    /// Get an invoice by ID.
    pub async fn get_invoice_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        let result = InvoiceEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get invoice: {}", e)))?;

        result.map(model_to_invoice).transpose()
    }

    /// Insert a new DRAFT invoice.
    ///
    /// A unique-constraint violation (number or request race) surfaces as
    /// `Conflict` so the caller can retry with a fresh number.
    pub async fn insert_invoice(&self, new: &NewInvoice) -> AppResult<Invoice> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            request_id: Set(new.request_id),
            invoice_number: Set(new.invoice_number.clone()),
            amount: Set(new.amount),
            currency: Set(new.currency.clone()),
            cargo_route: Set(new.cargo_route.clone()),
            customer_ref: Set(new.customer_ref.clone()),
            bill_of_lading: Set(new.bill_of_lading.clone()),
            status: Set(InvoiceStatus::Draft.as_str().to_string()),
            source: Set(new.source.as_str().to_string()),
            created_by: Set(new.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(self.connection()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict(format!(
                    "Invoice number {} already taken",
                    new.invoice_number
                ))
            } else {
                AppError::Database(format!("Failed to insert invoice: {}", e))
            }
        })?;

        model_to_invoice(result)
    }

    /// Re-price an existing invoice: new amount/currency, status back to
    /// DRAFT, cargo route kept when the new one is blank. The number never
    /// changes.
    pub async fn reprice_invoice(
        &self,
        id: Uuid,
        amount: Decimal,
        currency: &str,
        cargo_route: Option<&str>,
        customer_ref: Option<&str>,
    ) -> AppResult<Invoice> {
        let found = InvoiceEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get invoice: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

        let prior_route = found.cargo_route.clone();
        let prior_ref = found.customer_ref.clone();

        let mut active: ActiveModel = found.into();
        active.amount = Set(amount);
        active.currency = Set(currency.to_string());
        active.cargo_route = Set(match cargo_route {
            Some(route) if !route.trim().is_empty() => Some(route.to_string()),
            _ => prior_route,
        });
        active.customer_ref = Set(match customer_ref {
            Some(r) if !r.trim().is_empty() => Some(r.to_string()),
            _ => prior_ref,
        });
        active.status = Set(InvoiceStatus::Draft.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update invoice: {}", e)))?;

        model_to_invoice(result)
    }

    /// Mark an invoice as paid.
    pub async fn mark_invoice_paid(&self, id: Uuid) -> AppResult<Invoice> {
        let found = InvoiceEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get invoice: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;

        let mut active: ActiveModel = found.into();
        active.status = Set(InvoiceStatus::Paid.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark invoice paid: {}", e)))?;

        model_to_invoice(result)
    }

    /// Every invoice number starting with `prefix`, for numbering scans.
    pub async fn invoice_numbers_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let rows = InvoiceEntity::find()
            .filter(invoice::Column::InvoiceNumber.starts_with(prefix))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to scan invoice numbers: {}", e)))?;

        Ok(rows.into_iter().map(|m| m.invoice_number).collect())
    }
}

pub(crate) fn model_to_invoice(m: invoice::Model) -> AppResult<Invoice> {
    let status = InvoiceStatus::parse(&m.status)
        .ok_or_else(|| AppError::Database(format!("Unknown invoice status '{}'", m.status)))?;
    let source = InvoiceSource::parse(&m.source)
        .ok_or_else(|| AppError::Database(format!("Unknown invoice source '{}'", m.source)))?;

    Ok(Invoice {
        id: m.id,
        request_id: m.request_id,
        invoice_number: m.invoice_number,
        amount: m.amount,
        currency: m.currency,
        cargo_route: m.cargo_route,
        customer_ref: m.customer_ref,
        bill_of_lading: m.bill_of_lading,
        status,
        source,
        created_by: m.created_by,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
