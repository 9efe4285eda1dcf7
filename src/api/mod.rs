//! API endpoint modules.

pub mod admin;
pub mod disputes;
pub mod documents;
pub mod health;
pub mod invoices;
pub mod magic;
pub mod notifications;
pub mod openapi;
pub mod requests;

pub use admin::configure_routes as configure_admin_routes;
pub use disputes::configure_routes as configure_dispute_routes;
pub use documents::configure_routes as configure_document_routes;
pub use health::configure_health_routes;
pub use invoices::configure_routes as configure_invoice_routes;
pub use magic::configure_routes as configure_magic_routes;
pub use notifications::configure_routes as configure_notification_routes;
pub use openapi::ApiDoc;
pub use requests::configure_routes as configure_request_routes;

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::error::{AppError, AppResult};

/// One file pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field name, e.g. `file` or `ad_file`.
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Text fields and files from a multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Read the whole form. Parts with a filename become files, everything
    /// else a text field; any single part over `max_size` bytes rejects
    /// the request.
    pub async fn read(mut payload: Multipart, max_size: usize) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;

            let name = field
                .content_disposition()
                .and_then(|cd| cd.get_name())
                .unwrap_or_default()
                .to_string();
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(String::from);
            let content_type = field.content_type().map(|m| m.to_string());

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::Validation(format!("Read error: {}", e)))?;
                if data.len() + chunk.len() > max_size {
                    return Err(AppError::Validation(format!(
                        "Uploaded part '{}' exceeds the {} byte limit",
                        name, max_size
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            match file_name {
                Some(file_name) => form.files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes: data,
                }),
                None => {
                    let value = String::from_utf8(data).map_err(|_| {
                        AppError::Validation(format!("Field '{}' is not valid UTF-8", name))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// A required text field, trimmed.
    pub fn require_field(&self, name: &str) -> AppResult<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation(format!("Field '{}' is required", name)))
    }

    /// An optional text field, trimmed, blank treated as absent.
    pub fn optional_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
