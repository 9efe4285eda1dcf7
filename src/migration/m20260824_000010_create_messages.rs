//! Migration: Create messages table (request threads).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE messages (
                    id UUID PRIMARY KEY,
                    request_id UUID NOT NULL REFERENCES requests(id),
                    sender_id UUID NOT NULL REFERENCES users(id),
                    body TEXT NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_messages_request_id ON messages(request_id, created_at);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS messages CASCADE;")
            .await?;

        Ok(())
    }
}
