/// Engine dispatch: one outbound HTTP call per job firing
///
/// Each dispatch resolves the target engine's endpoint, POSTs to its trigger
/// route with a bounded timeout, and degrades gracefully: an unconfigured
/// engine skips the network entirely and returns a synthetic mock result,
/// and in default mode every failure (timeout, transport, non-2xx) collapses
/// into the same mock result. Real run outcomes live in the engine's own
/// execution history, not here.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{EngineEndpoint, EngineSettings};
use crate::error::DispatchError;
use crate::job::types::Engine;

/// Fixed wait bound for a single engine call.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    /// Always true in default mode; failures become mock results
    pub success: bool,
    /// Whether this is a synthetic result rather than an engine reply
    pub mock: bool,
    /// The engine's JSON reply, or the synthetic mock body
    pub engine_response: Option<Value>,
}

impl DispatchResult {
    /// Synthetic success used when an engine is unconfigured or unreachable.
    pub fn mock(engine: Engine) -> Self {
        let engine_response = match engine {
            Engine::N8n => json!({
                "success": true,
                "executionId": "mock-execution-id",
                "message": "Workflow triggered successfully (mock)",
            }),
            Engine::Langflow => json!({
                "success": true,
                "run_id": "mock-run-id",
                "message": "Flow triggered successfully (mock)",
            }),
        };
        Self {
            success: true,
            mock: true,
            engine_response: Some(engine_response),
        }
    }
}

/// HTTP dispatcher for the supported workflow engines.
pub struct Dispatcher {
    client: reqwest::Client,
    engines: EngineSettings,
    strict: bool,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher for the configured engine endpoints.
    pub fn new(engines: EngineSettings, strict: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            engines,
            strict,
            timeout: DISPATCH_TIMEOUT,
        }
    }

    /// Override the per-request wait bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dispatch one trigger to an engine.
    ///
    /// Default mode never fails: any live-call problem is logged and replaced
    /// with the mock result. Strict mode returns the underlying error instead,
    /// except for unconfigured engines, which always mock-succeed.
    pub async fn dispatch(
        &self,
        engine: Engine,
        workflow_id: &str,
        input_payload: &Value,
    ) -> Result<DispatchResult, DispatchError> {
        match self.try_dispatch(engine, workflow_id, input_payload).await {
            Ok(result) => Ok(result),
            Err(e) if self.strict => Err(e),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Dispatch of workflow {} to {} failed ({}), using mock response",
                    workflow_id,
                    engine,
                    e
                );
                Ok(DispatchResult::mock(engine))
            }
        }
    }

    async fn try_dispatch(
        &self,
        engine: Engine,
        workflow_id: &str,
        input_payload: &Value,
    ) -> Result<DispatchResult, DispatchError> {
        match engine {
            Engine::N8n => {
                let Some(endpoint) = &self.engines.n8n else {
                    tracing::info!("📭 n8n not configured, using mock response");
                    return Ok(DispatchResult::mock(engine));
                };
                let url = format!("{}/rest/workflows/{}/run", trim_base(endpoint), workflow_id);
                tracing::debug!("🌐 Triggering n8n workflow at {url}");

                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(endpoint.api_key.as_deref().unwrap_or_default())
                    .timeout(self.timeout)
                    .send()
                    .await?;
                self.read_response(engine, response).await
            }
            Engine::Langflow => {
                let Some(endpoint) = &self.engines.langflow else {
                    tracing::info!("📭 Langflow not configured, using mock response");
                    return Ok(DispatchResult::mock(engine));
                };
                let url = format!("{}/api/v1/build/{}/flow", trim_base(endpoint), workflow_id);
                tracing::debug!("🌐 Triggering Langflow workflow at {url}");

                let mut request = self
                    .client
                    .post(&url)
                    .json(input_payload)
                    .timeout(self.timeout);
                if let Some(key) = &endpoint.api_key {
                    request = request.bearer_auth(key);
                }
                let response = request.send().await?;
                self.read_response(engine, response).await
            }
        }
    }

    async fn read_response(
        &self,
        engine: Engine,
        response: reqwest::Response,
    ) -> Result<DispatchResult, DispatchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::EngineStatus {
                engine,
                status: status.as_u16(),
            });
        }
        let body: Value = response.json().await?;
        tracing::debug!("📥 {engine} accepted the trigger: {body}");
        Ok(DispatchResult {
            success: true,
            mock: false,
            engine_response: Some(body),
        })
    }
}

fn trim_base(endpoint: &EngineEndpoint) -> &str {
    endpoint.base_url.trim_end_matches('/')
}
