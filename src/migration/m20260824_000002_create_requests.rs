//! Migration: Create requests table.
//!
//! A request is a client's submission for a FERI and/or AD certificate.
//! Status is mutated only through the lifecycle engine; rows are never
//! hard-deleted (COMPLETED/REJECTED/CANCELLED are terminal).

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
                CREATE TABLE requests (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id),
                    request_type VARCHAR(20) NOT NULL
                        CHECK (request_type IN ('FERI_ONLY', 'AD_ONLY', 'FERI_AND_AD')),
                    status VARCHAR(30) NOT NULL DEFAULT 'CREATED'
                        CHECK (status IN (
                            'CREATED', 'AWAITING_DOCUMENTS', 'SUBMITTED', 'PROCESSING',
                            'UNDER_REVIEW', 'DRAFT_SENT', 'PROFORMAT_SENT',
                            'PAYMENT_PROOF_UPLOADED', 'PAYMENT_SUBMITTED',
                            'PAYMENT_CONFIRMED', 'VALIDATED', 'COMPLETED', 'ISSUED',
                            'REJECTED', 'CANCELLED'
                        )),

                    -- Bill-of-lading candidates; precedence is resolved in code
                    -- (bl_number > extracted_bl > manual_bl)
                    bl_number VARCHAR(100),
                    extracted_bl VARCHAR(100),
                    manual_bl VARCHAR(100),

                    cargo_route VARCHAR(200),
                    customer_ref VARCHAR(100),
                    origin VARCHAR(200),
                    destination VARCHAR(200),
                    cargo_description TEXT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Index for dashboard listings by status
                CREATE INDEX idx_requests_status ON requests(status);

                -- Index for a client's own requests
                CREATE INDEX idx_requests_user_id ON requests(user_id);

                -- Index for listing by creation date
                CREATE INDEX idx_requests_created_at ON requests(created_at DESC);

                -- Index for manual BL sequence scans (MKC{year}{seq})
                CREATE INDEX idx_requests_manual_bl ON requests(manual_bl)
                    WHERE manual_bl IS NOT NULL;

                CREATE TRIGGER update_requests_updated_at
                    BEFORE UPDATE ON requests
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
                DROP TRIGGER IF EXISTS update_requests_updated_at ON requests;
                DROP TABLE IF EXISTS requests CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
