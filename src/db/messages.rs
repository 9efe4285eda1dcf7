//! Database operations for request message threads.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Message;

/// Post a message to a request's thread.
pub async fn insert(
    db: &DatabaseConnection,
    request_id: Uuid,
    sender_id: Uuid,
    body: &str,
) -> AppResult<Message> {
    let model = crate::entity::message::ActiveModel {
        id: Set(Uuid::now_v7()),
        request_id: Set(request_id),
        sender_id: Set(sender_id),
        body: Set(body.to_string()),
        created_at: Set(Utc::now()),
    };

    let result = model.insert(db).await?;

    Ok(model_to_message(result))
}

/// List a request's messages in thread order.
pub async fn list_for_request(db: &DatabaseConnection, request_id: Uuid) -> AppResult<Vec<Message>> {
    let rows = crate::entity::message::Entity::find()
        .filter(crate::entity::message::Column::RequestId.eq(request_id))
        .order_by_asc(crate::entity::message::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(model_to_message).collect())
}

fn model_to_message(m: crate::entity::message::Model) -> Message {
    Message {
        id: m.id,
        request_id: m.request_id,
        sender_id: m.sender_id,
        body: m.body,
        created_at: m.created_at,
    }
}
