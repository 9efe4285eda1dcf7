//! Migration: Create disputes table.

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
                CREATE TABLE disputes (
                    id UUID PRIMARY KEY,
                    request_id UUID NOT NULL REFERENCES requests(id),
                    opened_by UUID NOT NULL REFERENCES users(id),
                    subject VARCHAR(200) NOT NULL,
                    body TEXT NOT NULL,
                    status VARCHAR(10) NOT NULL DEFAULT 'OPEN'
                        CHECK (status IN ('OPEN', 'RESOLVED')),
                    attachment_id UUID REFERENCES documents(id),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_disputes_request_id ON disputes(request_id);

                CREATE INDEX idx_disputes_status ON disputes(status)
                    WHERE status = 'OPEN';

                CREATE TRIGGER update_disputes_updated_at
                    BEFORE UPDATE ON disputes
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_disputes_updated_at ON disputes;
                DROP TABLE IF EXISTS disputes CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
