/// Core job type definitions
///
/// Defines the recurring trigger record persisted in the registry and the
/// closed set of workflow engines a job can target. Wire and disk field
/// names are camelCase, matching the registry file and the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted recurring trigger.
///
/// One record per registered cron job: which workflow to fire, on which
/// engine, on what schedule, and with what payload. The id is minted by the
/// API layer at creation time and never changes; updates are modeled as
/// remove + re-add.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    /// Unique job identifier (uuid v4, assigned at creation)
    pub id: String,
    /// Identifier of the target workflow inside the engine; opaque here
    pub workflow_id: String,
    /// Which engine backend to dispatch to
    pub engine: Engine,
    /// Standard 5-field cron expression (minute hour day month weekday)
    pub schedule: String,
    /// Arbitrary JSON payload passed verbatim to the engine on every firing
    #[serde(default)]
    pub input_payload: Value,
}

/// Supported workflow engine backends.
///
/// Closed set: unknown tags fail deserialization before they ever reach the
/// store or scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    N8n,
    Langflow,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::N8n => write!(f, "n8n"),
            Engine::Langflow => write!(f, "langflow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_serializes_with_wire_field_names() {
        let job = JobDefinition {
            id: "j1".to_string(),
            workflow_id: "wf1".to_string(),
            engine: Engine::Langflow,
            schedule: "*/5 * * * *".to_string(),
            input_payload: json!({"x": 1}),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["workflowId"], "wf1");
        assert_eq!(value["engine"], "langflow");
        assert_eq!(value["inputPayload"], json!({"x": 1}));
    }

    #[test]
    fn unknown_engine_tags_are_rejected() {
        let parsed: Result<Engine, _> = serde_json::from_str(r#""zapier""#);
        assert!(parsed.is_err());
    }
}
