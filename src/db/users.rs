//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ActorRole;
use crate::models::user::User;

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    let result = crate::entity::user::Entity::find_by_id(id).one(db).await?;

    result.map(model_to_user).transpose()
}

/// Find a user by email address.
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<User>> {
    let result = crate::entity::user::Entity::find()
        .filter(crate::entity::user::Column::Email.eq(email))
        .one(db)
        .await?;

    result.map(model_to_user).transpose()
}

/// Create a user account.
pub async fn create(
    db: &DatabaseConnection,
    email: &str,
    display_name: Option<&str>,
    role: ActorRole,
) -> AppResult<User> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = crate::entity::user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        display_name: Set(display_name.map(|s| s.to_string())),
        role: Set(role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    crate::entity::user::Entity::insert(model).exec(db).await?;

    // Fetch back the inserted user
    let inserted = crate::entity::user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Database("Failed to fetch newly inserted user".to_string()))?;

    model_to_user(inserted)
}

fn model_to_user(m: crate::entity::user::Model) -> AppResult<User> {
    let role = ActorRole::parse(&m.role)
        .ok_or_else(|| AppError::Database(format!("Unknown user role '{}'", m.role)))?;

    Ok(User {
        id: m.id,
        email: m.email,
        display_name: m.display_name,
        role,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
