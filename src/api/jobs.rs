/// Cron job management REST API endpoints
///
/// CRUD surface for recurring triggers. Adds persist first and then arm the
/// timer, so a job with an unschedulable expression stays in the registry
/// until it is removed; the next reload reports it. Ids are minted here,
/// never supplied by the caller.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::JobError;
use crate::job::{
    store::JobStore,
    types::{Engine, JobDefinition},
};
use crate::runtime::{dispatcher::Dispatcher, scheduler::CronScheduler};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Durable job registry
    pub store: JobStore,
    /// Live cron scheduler
    pub scheduler: Arc<CronScheduler>,
    /// Engine dispatcher, shared with the manual trigger endpoint
    pub dispatcher: Arc<Dispatcher>,
}

/// Request body for job creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddJobRequest {
    pub workflow_id: String,
    pub engine: Engine,
    pub schedule: String,
    #[serde(default)]
    pub input_payload: Value,
}

/// Request body for job removal
#[derive(Debug, Deserialize)]
pub struct RemoveJobRequest {
    pub id: String,
}

/// Create cron job management routes
pub fn create_job_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cron", post(add_job))
        .route("/api/cron", get(list_jobs))
        .route("/api/cron", delete(remove_job))
        .route("/api/cron/reload", post(reload_jobs))
        .route("/api/cron/status", get(scheduler_status))
}

/// Register a new cron job
///
/// POST /api/cron
/// Body: { "workflowId": "...", "engine": "n8n"|"langflow", "schedule": "*/5 * * * *", "inputPayload": {...} }
async fn add_job(
    State(state): State<AppState>,
    Json(payload): Json<AddJobRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.workflow_id.is_empty() || payload.schedule.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let job = JobDefinition {
        id: uuid::Uuid::new_v4().to_string(),
        workflow_id: payload.workflow_id,
        engine: payload.engine,
        schedule: payload.schedule,
        input_payload: payload.input_payload,
    };

    if let Err(e) = state.store.add(job.clone()) {
        tracing::error!("Failed to persist cron job: {e}");
        return Err(match e {
            JobError::DuplicateId(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        });
    }

    if let Err(e) = state.scheduler.install(&job).await {
        tracing::error!("Failed to schedule cron job {}: {}", job.id, e);
        return Err(match e {
            JobError::InvalidSchedule { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        });
    }

    tracing::info!(
        "🔥 Registered cron job {} ('{}' → workflow {})",
        job.id,
        job.schedule,
        job.workflow_id
    );
    Ok(Json(json!({ "success": true, "job": job })))
}

/// List all registered cron jobs
///
/// GET /api/cron
/// Returns: { "jobs": [...] }
async fn list_jobs(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.store.load() {
        Ok(jobs) => Ok(Json(json!({ "jobs": jobs }))),
        Err(e) => {
            tracing::error!("Failed to list cron jobs: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Remove a cron job by id
///
/// DELETE /api/cron
/// Body: { "id": "..." }
/// Removing an unknown id still succeeds.
async fn remove_job(
    State(state): State<AppState>,
    Json(payload): Json<RemoveJobRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Err(e) = state.store.remove(&payload.id) {
        tracing::error!("Failed to remove cron job {}: {}", payload.id, e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.scheduler.uninstall(&payload.id).await;

    Ok(Json(json!({ "success": true })))
}

/// Rebuild all timers from the registry
///
/// POST /api/cron/reload
/// Returns: { "success": true, "installed": n }
async fn reload_jobs(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.scheduler.reload_all().await {
        Ok(installed) => Ok(Json(json!({ "success": true, "installed": installed }))),
        Err(e) => {
            tracing::error!("Failed to reload cron jobs: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Scheduler status: live timer ids and per-job firing records
///
/// GET /api/cron/status
async fn scheduler_status(State(state): State<AppState>) -> Json<Value> {
    let scheduled = state.scheduler.scheduled_ids().await;
    let stats = state.scheduler.stats().await;
    Json(json!({ "scheduled": scheduled, "stats": stats }))
}
