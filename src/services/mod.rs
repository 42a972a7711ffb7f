/// Owner commands and housekeeping: backup, DM cleanup, shutdown.
pub mod admin_service;
/// Audit trail written to the log channels.
pub mod audit_service;
/// Game record mutations: add, rename, attribute edits.
pub mod catalog_service;
/// Base64 encode/decode commands.
pub mod codec_service;
/// List and log channel discovery from channel topics.
pub mod discovery_service;
/// Health check service.
pub mod health_service;
/// Text rendering of one record as a list message.
pub mod renderer;
/// Reconciliation and rebuild of list channels.
pub mod sync_service;
