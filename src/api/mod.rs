/// HTTP API Layer
///
/// This module provides the REST API endpoints for cron job management and
/// manual workflow triggering. It handles:
/// - Job CRUD operations (register, list, remove)
/// - Registry reload and scheduler status
/// - One-off dispatches outside any schedule

// Cron job management endpoints (POST/GET/DELETE)
pub mod jobs;

// Manual trigger endpoint
pub mod trigger;

// Re-export router builders
pub use jobs::{create_job_routes, AppState};
pub use trigger::create_trigger_routes;
