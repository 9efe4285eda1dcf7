//! Migration: Create invoices table.
//!
//! One invoice per request, enforced by a unique index; invoice numbers are
//! globally unique and the unique index arbitrates concurrent numbering.

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
                CREATE TABLE invoices (
                    id UUID PRIMARY KEY,
                    request_id UUID NOT NULL UNIQUE REFERENCES requests(id),
                    invoice_number VARCHAR(20) NOT NULL UNIQUE,
                    amount NUMERIC(12, 2) NOT NULL
                        CHECK (amount > 0),
                    currency VARCHAR(3) NOT NULL,
                    cargo_route VARCHAR(200),
                    customer_ref VARCHAR(100),
                    bill_of_lading VARCHAR(100) NOT NULL,
                    status VARCHAR(10) NOT NULL DEFAULT 'DRAFT'
                        CHECK (status IN ('DRAFT', 'PAID')),
                    source VARCHAR(10) NOT NULL DEFAULT 'SYSTEM'
                        CHECK (source IN ('SYSTEM', 'MANUAL')),
                    created_by UUID NOT NULL REFERENCES users(id),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Numbering scans read all numbers with the scheme prefix
                CREATE INDEX idx_invoices_invoice_number ON invoices(invoice_number);

                CREATE INDEX idx_invoices_status ON invoices(status);

                CREATE TRIGGER update_invoices_updated_at
                    BEFORE UPDATE ON invoices
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
                DROP TRIGGER IF EXISTS update_invoices_updated_at ON invoices;
                DROP TABLE IF EXISTS invoices CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
