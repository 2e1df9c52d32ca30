/// Catalog reads and tier administration.
pub mod catalog_service;
/// Sync triggering, status and schedule.
pub mod curator_service;
/// Curated listing synchronization pass.
pub mod curator_sync;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Curator listing markup parsing.
pub mod listing;
/// Member directory and season results.
pub mod season_service;
/// Season leaderboard aggregation.
pub mod season_ranking;
/// Storage connection supervision with backoff.
pub mod storage_supervisor;
