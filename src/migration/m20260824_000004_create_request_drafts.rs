//! Migration: Create request_drafts table.
//!
//! Metadata rows for draft/proforma blobs. Immutable after creation, so no
//! updated_at column or trigger.

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
                CREATE TABLE request_drafts (
                    id UUID PRIMARY KEY,
                    request_id UUID NOT NULL REFERENCES requests(id),
                    file_name VARCHAR(255) NOT NULL,
                    file_path VARCHAR(1024) NOT NULL,
                    kind VARCHAR(15) NOT NULL
                        CHECK (kind IN ('DRAFT_FERI', 'PROFORMA')),
                    invoice_id UUID REFERENCES invoices(id),
                    uploaded_by UUID NOT NULL REFERENCES users(id),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_request_drafts_request_id ON request_drafts(request_id);

                CREATE INDEX idx_request_drafts_invoice_id ON request_drafts(invoice_id)
                    WHERE invoice_id IS NOT NULL;
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS request_drafts CASCADE;")
            .await?;

        Ok(())
    }
}
