/// Manual workflow trigger endpoint
///
/// Fires the dispatcher once, outside any schedule. Useful for smoke-testing
/// an engine configuration: with no engine configured the mock result comes
/// back, so the endpoint works end-to-end without live backends.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::jobs::AppState;
use crate::job::types::Engine;

/// Request body for a manual trigger
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub workflow_id: String,
    pub engine: Engine,
    #[serde(default)]
    pub input_payload: Value,
}

/// Create the manual trigger route
pub fn create_trigger_routes() -> Router<AppState> {
    Router::new().route("/api/trigger", post(trigger_workflow))
}

/// Trigger a workflow once
///
/// POST /api/trigger
/// Body: { "workflowId": "...", "engine": "n8n"|"langflow", "inputPayload": {...} }
/// In strict dispatch mode an engine failure maps to 502.
async fn trigger_workflow(
    State(state): State<AppState>,
    Json(payload): Json<TriggerRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.workflow_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    tracing::info!(
        "🚀 Manual trigger: workflow {} on {}",
        payload.workflow_id,
        payload.engine
    );
    match state
        .dispatcher
        .dispatch(payload.engine, &payload.workflow_id, &payload.input_payload)
        .await
    {
        Ok(result) => Ok(Json(json!({ "success": true, "result": result }))),
        Err(e) => {
            tracing::error!("❌ Manual dispatch failed: {e}");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
