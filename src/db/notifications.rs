//! Database queries for in-app notifications.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::notification::{self, ActiveModel, Entity as Notification};
use crate::error::{AppError, AppResult};
use crate::models::{InAppNotification, NotificationEvent};

use super::DbPool;

impl DbPool {
    /// Insert one in-app notification row.
    pub async fn insert_notification(
        &self,
        user_id: Uuid,
        event: NotificationEvent,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> AppResult<InAppNotification> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            event: Set(event.as_str().to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            link: Set(link.map(String::from)),
            read: Set(false),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert notification: {}", e)))?;

        model_to_notification(result)
    }

    /// List a user's notifications, newest first.
    pub async fn list_notifications_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> AppResult<Vec<InAppNotification>> {
        let rows = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(self.connection(), limit.clamp(1, 100))
            .fetch_page(0)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list notifications: {}", e)))?;

        rows.into_iter().map(model_to_notification).collect()
    }

    /// Count unread notifications for the badge.
    pub async fn count_unread_notifications(&self, user_id: Uuid) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count notifications: {}", e)))?;

        Ok(count)
    }

    /// Mark one notification as read. The user filter stops cross-account
    /// reads.
    pub async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let found = Notification::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get notification: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Notification {}", id)))?;

        let mut active: ActiveModel = found.into();
        active.read = Set(true);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark notification read: {}", e)))?;

        Ok(())
    }
}

pub(crate) fn model_to_notification(m: notification::Model) -> AppResult<InAppNotification> {
    let event = NotificationEvent::parse(&m.event)
        .ok_or_else(|| AppError::Database(format!("Unknown notification event '{}'", m.event)))?;

    Ok(InAppNotification {
        id: m.id,
        user_id: m.user_id,
        event,
        title: m.title,
        message: m.message,
        link: m.link,
        read: m.read,
        created_at: m.created_at,
    })
}
