//! SeaORM entity definitions for PostgreSQL database.

pub mod audit_log;
pub mod delivery;
pub mod dispute;
pub mod document;
pub mod invoice;
pub mod message;
pub mod notification;
pub mod request;
pub mod request_draft;
pub mod user;
