//! In-memory fakes and a ready-made engine harness for lifecycle tests.
//!
//! The fakes honor the same contracts as the production collaborators:
//! the store enforces invoice-number uniqueness and one invoice per
//! request, the blob store returns `NotFound` for unsignable keys, and
//! both expose failure injection for the compensating-action paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;

use feridesk_lib::db::invoices::NewInvoice;
use feridesk_lib::error::{AppError, AppResult};
use feridesk_lib::lifecycle::{Actor, LifecycleEngine, SendDraftInput, WorkflowStore};
use feridesk_lib::models::{
    ActorRole, AuditEntry, Delivery, Document, DocumentCategory, DraftKind, Invoice,
    InvoiceSource, InvoiceStatus, NewAuditEntry, NotificationRequest, RequestDraft, RequestStatus,
    RequestType, ShipmentRequest,
};
use feridesk_lib::services::magic_link::MagicLinkService;
use feridesk_lib::services::notifier::Notifier;
use feridesk_lib::services::storage::BlobStore;

pub const OPS_EMAIL: &str = "ops@feri.test";

#[derive(Default)]
struct StoreState {
    requests: HashMap<Uuid, ShipmentRequest>,
    invoices: Vec<Invoice>,
    drafts: Vec<RequestDraft>,
    deliveries: Vec<Delivery>,
    documents: Vec<Document>,
    audits: Vec<AuditEntry>,
    /// Fail the next N invoice inserts with `Conflict`, as the unique
    /// index would under a numbering race.
    invoice_conflicts: u32,
    fail_draft_inserts: bool,
    fail_delivery_inserts: bool,
}

/// In-memory `WorkflowStore`.
#[derive(Clone, Default)]
pub struct MemoryStore(Arc<Mutex<StoreState>>);

impl MemoryStore {
    pub fn put_request(&self, request: ShipmentRequest) {
        self.0.lock().unwrap().requests.insert(request.id, request);
    }

    pub fn put_invoice(&self, invoice: Invoice) {
        self.0.lock().unwrap().invoices.push(invoice);
    }

    pub fn put_document(&self, document: Document) {
        self.0.lock().unwrap().documents.push(document);
    }

    pub fn request(&self, id: Uuid) -> ShipmentRequest {
        self.0.lock().unwrap().requests[&id].clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.0.lock().unwrap().invoices.clone()
    }

    pub fn drafts(&self) -> Vec<RequestDraft> {
        self.0.lock().unwrap().drafts.clone()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.0.lock().unwrap().deliveries.clone()
    }

    pub fn audits(&self) -> Vec<AuditEntry> {
        self.0.lock().unwrap().audits.clone()
    }

    pub fn audit_actions(&self) -> Vec<String> {
        self.audits().into_iter().map(|a| a.action).collect()
    }

    pub fn inject_invoice_conflicts(&self, count: u32) {
        self.0.lock().unwrap().invoice_conflicts = count;
    }

    pub fn fail_draft_inserts(&self) {
        self.0.lock().unwrap().fail_draft_inserts = true;
    }

    pub fn fail_delivery_inserts(&self) {
        self.0.lock().unwrap().fail_delivery_inserts = true;
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn get_request(&self, id: Uuid) -> AppResult<Option<ShipmentRequest>> {
        Ok(self.0.lock().unwrap().requests.get(&id).cloned())
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> AppResult<ShipmentRequest> {
        let mut state = self.0.lock().unwrap();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn set_manual_bl(&self, id: Uuid, reference: &str) -> AppResult<ShipmentRequest> {
        let mut state = self.0.lock().unwrap();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;
        request.manual_bl = Some(reference.to_string());
        request.bl_number = Some(reference.to_string());
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn bl_references_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let state = self.0.lock().unwrap();
        Ok(state
            .requests
            .values()
            .flat_map(|r| [&r.bl_number, &r.manual_bl, &r.extracted_bl])
            .filter_map(|v| v.as_deref())
            .filter(|v| v.starts_with(prefix))
            .map(String::from)
            .collect())
    }

    async fn find_invoice_by_request(&self, request_id: Uuid) -> AppResult<Option<Invoice>> {
        let state = self.0.lock().unwrap();
        Ok(state
            .invoices
            .iter()
            .find(|i| i.request_id == request_id)
            .cloned())
    }

    async fn insert_invoice(&self, new: &NewInvoice) -> AppResult<Invoice> {
        let mut state = self.0.lock().unwrap();

        if state.invoice_conflicts > 0 {
            state.invoice_conflicts -= 1;
            return Err(AppError::Conflict(format!(
                "duplicate key value violates unique constraint: {}",
                new.invoice_number
            )));
        }
        if state
            .invoices
            .iter()
            .any(|i| i.invoice_number == new.invoice_number)
        {
            return Err(AppError::Conflict(format!(
                "duplicate key value violates unique constraint: {}",
                new.invoice_number
            )));
        }
        if state.invoices.iter().any(|i| i.request_id == new.request_id) {
            return Err(AppError::Conflict(format!(
                "request {} already has an invoice",
                new.request_id
            )));
        }

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::now_v7(),
            request_id: new.request_id,
            invoice_number: new.invoice_number.clone(),
            amount: new.amount,
            currency: new.currency.clone(),
            cargo_route: new.cargo_route.clone(),
            customer_ref: new.customer_ref.clone(),
            bill_of_lading: new.bill_of_lading.clone(),
            status: InvoiceStatus::Draft,
            source: new.source,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn reprice_invoice(
        &self,
        id: Uuid,
        amount: Decimal,
        currency: &str,
        cargo_route: Option<&str>,
        customer_ref: Option<&str>,
    ) -> AppResult<Invoice> {
        let mut state = self.0.lock().unwrap();
        let invoice = state
            .invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;
        invoice.amount = amount;
        invoice.currency = currency.to_string();
        if let Some(route) = cargo_route {
            invoice.cargo_route = Some(route.to_string());
        }
        if let Some(reference) = customer_ref {
            invoice.customer_ref = Some(reference.to_string());
        }
        invoice.status = InvoiceStatus::Draft;
        invoice.updated_at = Utc::now();
        Ok(invoice.clone())
    }

    async fn mark_invoice_paid(&self, id: Uuid) -> AppResult<Invoice> {
        let mut state = self.0.lock().unwrap();
        let invoice = state
            .invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))?;
        invoice.status = InvoiceStatus::Paid;
        invoice.updated_at = Utc::now();
        Ok(invoice.clone())
    }

    async fn invoice_numbers_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let state = self.0.lock().unwrap();
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.invoice_number.starts_with(prefix))
            .map(|i| i.invoice_number.clone())
            .collect())
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
        let mut state = self.0.lock().unwrap();
        if state.fail_draft_inserts {
            return Err(AppError::Database("injected draft insert failure".to_string()));
        }
        let draft = RequestDraft {
            id: Uuid::now_v7(),
            request_id,
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            kind,
            invoice_id,
            uploaded_by,
            created_at: Utc::now(),
        };
        state.drafts.push(draft.clone());
        Ok(draft)
    }

    async fn insert_delivery(
        &self,
        request_id: Uuid,
        pdf_url: &str,
        file_name: &str,
        admin_id: Uuid,
        feri_ref: Option<&str>,
    ) -> AppResult<Delivery> {
        let mut state = self.0.lock().unwrap();
        if state.fail_delivery_inserts {
            return Err(AppError::Database(
                "injected delivery insert failure".to_string(),
            ));
        }
        let delivery = Delivery {
            id: Uuid::now_v7(),
            request_id,
            pdf_url: pdf_url.to_string(),
            file_name: file_name.to_string(),
            admin_id,
            feri_ref: feri_ref.map(String::from),
            status: "COMPLETED".to_string(),
            delivered_at: Utc::now(),
        };
        state.deliveries.push(delivery.clone());
        Ok(delivery)
    }

    async fn list_deliveries(&self, request_id: Uuid) -> AppResult<Vec<Delivery>> {
        let state = self.0.lock().unwrap();
        Ok(state
            .deliveries
            .iter()
            .filter(|d| d.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn list_documents(
        &self,
        request_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>> {
        let state = self.0.lock().unwrap();
        Ok(state
            .documents
            .iter()
            .filter(|d| d.request_id == request_id)
            .filter(|d| category.is_none_or(|c| d.category == c))
            .cloned()
            .collect())
    }

    async fn append_audit(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        let mut state = self.0.lock().unwrap();
        let audit = AuditEntry {
            id: Uuid::now_v7(),
            actor_id: entry.actor_id,
            action: entry.action.clone(),
            entity: entry.entity.clone(),
            entity_id: entry.entity_id,
            metadata: entry.metadata.clone(),
            created_at: Utc::now(),
        };
        state.audits.push(audit.clone());
        Ok(audit)
    }
}

/// In-memory `BlobStore`.
#[derive(Clone, Default)]
pub struct MemoryBlobs(Arc<Mutex<HashMap<String, Vec<u8>>>>);

impl MemoryBlobs {
    pub fn contains(&self, key: &str) -> bool {
        self.0.lock().unwrap().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: Option<&str>) -> AppResult<()> {
        self.0.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn sign(&self, key: &str, ttl_secs: u64) -> AppResult<String> {
        if self.contains(key) {
            Ok(format!("https://blobs.test/{}?exp={}", key, ttl_secs))
        } else {
            Err(AppError::NotFound(format!("File {}", key)))
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.0.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Capturing `Notifier` with an optional failure switch.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<NotificationRequest>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, request: NotificationRequest) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Notification("relay down".to_string()));
        }
        self.sent.lock().unwrap().push(request);
        Ok(())
    }
}

/// Engine wired to the fakes.
pub struct Harness {
    pub store: MemoryStore,
    pub blobs: MemoryBlobs,
    pub notifier: RecordingNotifier,
    pub engine: LifecycleEngine,
}

pub fn harness() -> Harness {
    let store = MemoryStore::default();
    let blobs = MemoryBlobs::default();
    let notifier = RecordingNotifier::default();

    let magic_links = MagicLinkService::new(
        SecretString::from("test-secret".to_string()),
        "https://feri.test".to_string(),
        900,
    );

    let engine = LifecycleEngine::new(
        Arc::new(store.clone()),
        Arc::new(blobs.clone()),
        Arc::new(notifier.clone()),
        magic_links,
        vec![OPS_EMAIL.to_string()],
        3600,
    );

    Harness {
        store,
        blobs,
        notifier,
        engine,
    }
}

pub fn admin() -> Actor {
    Actor::new(Uuid::now_v7(), ActorRole::Admin)
}

pub fn client(user_id: Uuid) -> Actor {
    Actor::new(user_id, ActorRole::Client)
}

/// Seed a request with a known BL and route, owned by a fresh user.
pub fn seed_request(store: &MemoryStore, status: RequestStatus) -> ShipmentRequest {
    let now = Utc::now();
    let request = ShipmentRequest {
        id: Uuid::now_v7(),
        user_id: Uuid::now_v7(),
        request_type: RequestType::FeriAndAd,
        status,
        bl_number: Some("MAEU12345678".to_string()),
        extracted_bl: None,
        manual_bl: None,
        cargo_route: Some("CGPNR-USNYC".to_string()),
        customer_ref: Some("PO-7741".to_string()),
        origin: Some("Pointe-Noire".to_string()),
        destination: Some("New York".to_string()),
        cargo_description: Some("Machinery parts".to_string()),
        created_at: now,
        updated_at: now,
    };
    store.put_request(request.clone());
    request
}

/// Seed a request with no bill of lading anywhere.
pub fn seed_request_without_bl(store: &MemoryStore, status: RequestStatus) -> ShipmentRequest {
    let mut request = seed_request(store, status);
    request.bl_number = None;
    request.customer_ref = None;
    store.put_request(request.clone());
    request
}

/// Seed an unpaid invoice for a request, as draft issuance would have
/// left it.
pub fn seed_invoice(store: &MemoryStore, request: &ShipmentRequest) -> Invoice {
    let now = Utc::now();
    let invoice = Invoice {
        id: Uuid::now_v7(),
        request_id: request.id,
        invoice_number: "INV-00001".to_string(),
        amount: Decimal::new(450, 0),
        currency: "USD".to_string(),
        cargo_route: request.cargo_route.clone(),
        customer_ref: request.customer_ref.clone(),
        bill_of_lading: request
            .bill_of_lading()
            .map(String::from)
            .unwrap_or_default(),
        status: InvoiceStatus::Draft,
        source: InvoiceSource::System,
        created_by: Uuid::now_v7(),
        created_at: now,
        updated_at: now,
    };
    store.put_invoice(invoice.clone());
    invoice
}

/// Standard pricing input: 450 USD proforma with one PDF attached.
pub fn draft_input() -> SendDraftInput {
    SendDraftInput {
        amount: Decimal::new(450, 0),
        currency: "USD".to_string(),
        cargo_route: "CGPNR-USNYC".to_string(),
        customer_ref: Some("PO-7741".to_string()),
        source: InvoiceSource::System,
        kind: DraftKind::Proforma,
        file_name: "proforma.pdf".to_string(),
        file_bytes: b"%PDF-1.7 proforma".to_vec(),
        content_type: Some("application/pdf".to_string()),
    }
}
