//! Migration: Create deliveries table.
//!
//! Final delivered certificate documents. Immutable once created; a request
//! may have several (separate FERI and AD files).

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
                CREATE TABLE deliveries (
                    id UUID PRIMARY KEY,
                    request_id UUID NOT NULL REFERENCES requests(id),
                    pdf_url VARCHAR(1024) NOT NULL,
                    file_name VARCHAR(255) NOT NULL,
                    admin_id UUID NOT NULL REFERENCES users(id),
                    feri_ref VARCHAR(100),
                    status VARCHAR(10) NOT NULL DEFAULT 'COMPLETED'
                        CHECK (status IN ('COMPLETED')),

                    delivered_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_deliveries_request_id ON deliveries(request_id);

                CREATE INDEX idx_deliveries_delivered_at ON deliveries(delivered_at DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS deliveries CASCADE;")
            .await?;

        Ok(())
    }
}
