/// Record and attribute category definitions.
pub mod models;
/// Scoped access to the JSON record file.
pub mod record_store;
/// Storage error types.
pub mod storage;
