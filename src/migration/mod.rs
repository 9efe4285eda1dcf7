//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260824_000001_create_users;
mod m20260824_000002_create_requests;
mod m20260824_000003_create_invoices;
mod m20260824_000004_create_request_drafts;
mod m20260824_000005_create_deliveries;
mod m20260824_000006_create_documents;
mod m20260824_000007_create_audit_log;
mod m20260824_000008_create_notifications;
mod m20260824_000009_create_disputes;
mod m20260824_000010_create_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260824_000001_create_users::Migration),
            Box::new(m20260824_000002_create_requests::Migration),
            Box::new(m20260824_000003_create_invoices::Migration),
            Box::new(m20260824_000004_create_request_drafts::Migration),
            Box::new(m20260824_000005_create_deliveries::Migration),
            Box::new(m20260824_000006_create_documents::Migration),
            Box::new(m20260824_000007_create_audit_log::Migration),
            Box::new(m20260824_000008_create_notifications::Migration),
            Box::new(m20260824_000009_create_disputes::Migration),
            Box::new(m20260824_000010_create_messages::Migration),
        ]
    }
}
