//! Database queries for draft documents.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::request_draft::{self, ActiveModel, Entity as Draft};
use crate::error::{AppError, AppResult};
use crate::models::{DraftKind, RequestDraft};

use super::DbPool;

impl DbPool {
    /// Insert a draft metadata row pointing at an uploaded blob.
    pub async fn insert_draft(
        &self,
        request_id: Uuid,
        file_name: &str,
        file_path: &str,
        kind: DraftKind,
        invoice_id: Option<Uuid>,
        uploaded_by: Uuid,
    ) -> AppResult<RequestDraft> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            request_id: Set(request_id),
            file_name: Set(file_name.to_string()),
            file_path: Set(file_path.to_string()),
            kind: Set(kind.as_str().to_string()),
            invoice_id: Set(invoice_id),
            uploaded_by: Set(uploaded_by),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert draft: {}", e)))?;

        model_to_draft(result)
    }

    /// List a request's drafts, newest first.
    pub async fn list_drafts_for_request(&self, request_id: Uuid) -> AppResult<Vec<RequestDraft>> {
        let rows = Draft::find()
            .filter(request_draft::Column::RequestId.eq(request_id))
            .order_by_desc(request_draft::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list drafts: {}", e)))?;

        rows.into_iter().map(model_to_draft).collect()
    }
}

pub(crate) fn model_to_draft(m: request_draft::Model) -> AppResult<RequestDraft> {
    let kind = DraftKind::parse(&m.kind)
        .ok_or_else(|| AppError::Database(format!("Unknown draft kind '{}'", m.kind)))?;

    Ok(RequestDraft {
        id: m.id,
        request_id: m.request_id,
        file_name: m.file_name,
        file_path: m.file_path,
        kind,
        invoice_id: m.invoice_id,
        uploaded_by: m.uploaded_by,
        created_at: m.created_at,
    })
}
