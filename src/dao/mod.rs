/// Storage backends for the curated catalog and season data.
pub mod curator_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
