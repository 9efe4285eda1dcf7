//! Database operations for disputes.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Dispute, DisputeStatus};

/// Open a new dispute against a request.
pub async fn insert(
    db: &DatabaseConnection,
    request_id: Uuid,
    opened_by: Uuid,
    subject: &str,
    body: &str,
    attachment_id: Option<Uuid>,
) -> AppResult<Dispute> {
    let now = Utc::now();

    let model = crate::entity::dispute::ActiveModel {
        id: Set(Uuid::now_v7()),
        request_id: Set(request_id),
        opened_by: Set(opened_by),
        subject: Set(subject.to_string()),
        body: Set(body.to_string()),
        status: Set(DisputeStatus::Open.as_str().to_string()),
        attachment_id: Set(attachment_id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let result = model.insert(db).await?;

    model_to_dispute(result)
}

/// List a request's disputes, newest first.
pub async fn list_for_request(db: &DatabaseConnection, request_id: Uuid) -> AppResult<Vec<Dispute>> {
    let rows = crate::entity::dispute::Entity::find()
        .filter(crate::entity::dispute::Column::RequestId.eq(request_id))
        .order_by_desc(crate::entity::dispute::Column::CreatedAt)
        .all(db)
        .await?;

    rows.into_iter().map(model_to_dispute).collect()
}

fn model_to_dispute(m: crate::entity::dispute::Model) -> AppResult<Dispute> {
    let status = DisputeStatus::parse(&m.status)
        .ok_or_else(|| AppError::Database(format!("Unknown dispute status '{}'", m.status)))?;

    Ok(Dispute {
        id: m.id,
        request_id: m.request_id,
        opened_by: m.opened_by,
        subject: m.subject,
        body: m.body,
        status,
        attachment_id: m.attachment_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
