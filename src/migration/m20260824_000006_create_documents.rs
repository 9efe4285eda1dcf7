//! Migration: Create documents table.
//!
//! Uploaded supporting files, payment proofs and staged final candidates.

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
                CREATE TABLE documents (
                    id UUID PRIMARY KEY,
                    request_id UUID NOT NULL REFERENCES requests(id),
                    file_name VARCHAR(255) NOT NULL,
                    file_path VARCHAR(1024) NOT NULL,
                    category VARCHAR(20) NOT NULL
                        CHECK (category IN ('SUPPORTING', 'PAYMENT_PROOF', 'FINAL_CANDIDATE')),
                    uploaded_by UUID NOT NULL REFERENCES users(id),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_documents_request_id ON documents(request_id);

                -- Publish fallback scans candidates per request
                CREATE INDEX idx_documents_category ON documents(request_id, category);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS documents CASCADE;")
            .await?;

        Ok(())
    }
}
