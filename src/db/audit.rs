//! Database queries for the audit log.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::audit_log::{self, ActiveModel, Entity as AuditLog};
use crate::error::{AppError, AppResult};
use crate::models::{AuditEntry, NewAuditEntry};

use super::DbPool;

impl DbPool {
    /// Append one audit record. Append-only; there is no update path.
    pub async fn append_audit(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            actor_id: Set(entry.actor_id),
            action: Set(entry.action.clone()),
            entity: Set(entry.entity.clone()),
            entity_id: Set(entry.entity_id),
            metadata: Set(entry.metadata.clone()),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to append audit entry: {}", e)))?;

        Ok(model_to_audit(result))
    }

    /// List audit entries for one entity, newest first.
    pub async fn list_audit_for_entity(
        &self,
        entity: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<AuditEntry>> {
        let rows = AuditLog::find()
            .filter(audit_log::Column::Entity.eq(entity))
            .filter(audit_log::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_log::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list audit entries: {}", e)))?;

        Ok(rows.into_iter().map(model_to_audit).collect())
    }
}

pub(crate) fn model_to_audit(m: audit_log::Model) -> AuditEntry {
    AuditEntry {
        id: m.id,
        actor_id: m.actor_id,
        action: m.action,
        entity: m.entity,
        entity_id: m.entity_id,
        metadata: m.metadata,
        created_at: m.created_at,
    }
}
