//! Table-store capability consumed by the lifecycle engine.
//!
//! The engine never talks to SeaORM directly; it goes through this trait so
//! the whole state machine runs against an in-memory store in tests. The
//! production implementation delegates to the `DbPool` query methods.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::db::invoices::NewInvoice;
use crate::error::AppResult;
use crate::models::{
    AuditEntry, Delivery, Document, DocumentCategory, DraftKind, Invoice, NewAuditEntry,
    RequestDraft, RequestStatus, ShipmentRequest,
};

/// The collections a lifecycle operation touches.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    // Requests
    async fn get_request(&self, id: Uuid) -> AppResult<Option<ShipmentRequest>>;
    async fn update_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> AppResult<ShipmentRequest>;
    async fn set_manual_bl(&self, id: Uuid, reference: &str) -> AppResult<ShipmentRequest>;
    async fn bl_references_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;

    // Invoices
    async fn find_invoice_by_request(&self, request_id: Uuid) -> AppResult<Option<Invoice>>;
    async fn insert_invoice(&self, new: &NewInvoice) -> AppResult<Invoice>;
    async fn reprice_invoice(
        &self,
        id: Uuid,
        amount: rust_decimal::Decimal,
        currency: &str,
        cargo_route: Option<&str>,
        customer_ref: Option<&str>,
    ) -> AppResult<Invoice>;
    async fn mark_invoice_paid(&self, id: Uuid) -> AppResult<Invoice>;
    async fn invoice_numbers_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;

    // Drafts and deliveries
    async fn insert_draft(
        &self,
        request_id: Uuid,
        file_name: &str,
        file_path: &str,
        kind: DraftKind,
        invoice_id: Option<Uuid>,
        uploaded_by: Uuid,
    ) -> AppResult<RequestDraft>;
    async fn insert_delivery(
        &self,
        request_id: Uuid,
        pdf_url: &str,
        file_name: &str,
        admin_id: Uuid,
        feri_ref: Option<&str>,
    ) -> AppResult<Delivery>;
    async fn list_deliveries(&self, request_id: Uuid) -> AppResult<Vec<Delivery>>;

    // Documents (publish fallback candidates)
    async fn list_documents(
        &self,
        request_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>>;

    // Audit log
    async fn append_audit(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry>;
}

#[async_trait]
impl WorkflowStore for DbPool {
    async fn get_request(&self, id: Uuid) -> AppResult<Option<ShipmentRequest>> {
        self.get_request_by_id(id).await
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> AppResult<ShipmentRequest> {
        DbPool::update_request_status(self, id, status).await
    }

    async fn set_manual_bl(&self, id: Uuid, reference: &str) -> AppResult<ShipmentRequest> {
        DbPool::set_manual_bl(self, id, reference).await
    }

    async fn bl_references_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        DbPool::bl_references_with_prefix(self, prefix).await
    }

    async fn find_invoice_by_request(&self, request_id: Uuid) -> AppResult<Option<Invoice>> {
        DbPool::find_invoice_by_request(self, request_id).await
    }

    async fn insert_invoice(&self, new: &NewInvoice) -> AppResult<Invoice> {
        DbPool::insert_invoice(self, new).await
    }

    async fn reprice_invoice(
        &self,
        id: Uuid,
        amount: rust_decimal::Decimal,
        currency: &str,
        cargo_route: Option<&str>,
        customer_ref: Option<&str>,
    ) -> AppResult<Invoice> {
        DbPool::reprice_invoice(self, id, amount, currency, cargo_route, customer_ref).await
    }

    async fn mark_invoice_paid(&self, id: Uuid) -> AppResult<Invoice> {
        DbPool::mark_invoice_paid(self, id).await
    }

    async fn invoice_numbers_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        DbPool::invoice_numbers_with_prefix(self, prefix).await
    }

    async fn insert_draft(
        &self,
        request_id: Uuid,
        file_name: &str,
        file_path: &str,
        kind: DraftKind,
        invoice_id: Option<Uuid>,
        uploaded_by: Uuid,
    ) -> AppResult<RequestDraft> {
        DbPool::insert_draft(self, request_id, file_name, file_path, kind, invoice_id, uploaded_by)
            .await
    }

    async fn insert_delivery(
        &self,
        request_id: Uuid,
        pdf_url: &str,
        file_name: &str,
        admin_id: Uuid,
        feri_ref: Option<&str>,
    ) -> AppResult<Delivery> {
        DbPool::insert_delivery(self, request_id, pdf_url, file_name, admin_id, feri_ref).await
    }

    async fn list_deliveries(&self, request_id: Uuid) -> AppResult<Vec<Delivery>> {
        self.list_deliveries_for_request(request_id).await
    }

    async fn list_documents(
        &self,
        request_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>> {
        self.list_documents_for_request(request_id, category).await
    }

    async fn append_audit(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        DbPool::append_audit(self, entry).await
    }
}
