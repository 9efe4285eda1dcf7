//! Database queries for uploaded documents.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::document::{self, ActiveModel, Entity as DocumentEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Document, DocumentCategory};

use super::DbPool;

impl DbPool {
    /// Insert a document metadata row pointing at an uploaded blob.
    pub async fn insert_document(
        &self,
        request_id: Uuid,
        file_name: &str,
        file_path: &str,
        category: DocumentCategory,
        uploaded_by: Uuid,
    ) -> AppResult<Document> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            request_id: Set(request_id),
            file_name: Set(file_name.to_string()),
            file_path: Set(file_path.to_string()),
            category: Set(category.as_str().to_string()),
            uploaded_by: Set(uploaded_by),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert document: {}", e)))?;

        model_to_document(result)
    }

    /// Get a document by ID.
    pub async fn get_document_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        let result = DocumentEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get document: {}", e)))?;

        result.map(model_to_document).transpose()
    }

    /// List a request's documents, optionally narrowed to one category,
    /// newest first.
    pub async fn list_documents_for_request(
        &self,
        request_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>> {
        let mut select = DocumentEntity::find()
            .filter(document::Column::RequestId.eq(request_id));

        if let Some(category) = category {
            select = select.filter(document::Column::Category.eq(category.as_str()));
        }

        let rows = select
            .order_by_desc(document::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list documents: {}", e)))?;

        rows.into_iter().map(model_to_document).collect()
    }
}

pub(crate) fn model_to_document(m: document::Model) -> AppResult<Document> {
    let category = DocumentCategory::parse(&m.category)
        .ok_or_else(|| AppError::Database(format!("Unknown document category '{}'", m.category)))?;

    Ok(Document {
        id: m.id,
        request_id: m.request_id,
        file_name: m.file_name,
        file_path: m.file_path,
        category,
        uploaded_by: m.uploaded_by,
        created_at: m.created_at,
    })
}
