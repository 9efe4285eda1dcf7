//! FeriDesk server library.
//!
//! Core functionality for the FERI/AD request lifecycle backend: the state
//! machine and its workflows, database operations, authentication, object
//! storage and the HTTP API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
