//! Migration: Create audit_log table.
//!
//! Append-only; rows are never updated or deleted.

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
                CREATE TABLE audit_log (
                    id UUID PRIMARY KEY,
                    actor_id UUID NOT NULL,
                    action VARCHAR(50) NOT NULL,
                    entity VARCHAR(50) NOT NULL,
                    entity_id UUID NOT NULL,

                    -- Action-specific context, e.g. {from, to} for transitions
                    metadata JSONB,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_audit_log_entity ON audit_log(entity, entity_id);

                CREATE INDEX idx_audit_log_actor_id ON audit_log(actor_id);

                CREATE INDEX idx_audit_log_created_at ON audit_log(created_at DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS audit_log CASCADE;")
            .await?;

        Ok(())
    }
}
