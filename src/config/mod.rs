/// Configuration management for the cronway service
///
/// Handles server binding, registry location, and per-engine dispatch
/// endpoints. Engine endpoints come from the same environment variables the
/// engines themselves document; a missing base URL simply leaves that engine
/// in mock mode.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Job registry configuration
    pub store: StoreConfig,
    /// Engine dispatch configuration
    pub dispatch: DispatchConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Job registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON registry file (default: "data/cron-jobs.json")
    pub jobs_file: String,
}

/// Engine dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-engine endpoints; an unconfigured engine dispatches in mock mode
    pub engines: EngineSettings,
    /// When true, dispatch failures surface as errors instead of the
    /// silent mock fallback
    pub strict: bool,
}

/// Resolved endpoints for the supported engines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    pub n8n: Option<EngineEndpoint>,
    pub langflow: Option<EngineEndpoint>,
}

/// A single engine's base URL and optional credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("CRONWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CRONWAY_PORT")
                    .unwrap_or_else(|_| "3010".to_string())
                    .parse()
                    .unwrap_or(3010),
            },
            store: StoreConfig {
                jobs_file: std::env::var("CRONWAY_JOBS_FILE")
                    .unwrap_or_else(|_| "data/cron-jobs.json".to_string()),
            },
            dispatch: DispatchConfig {
                engines: EngineSettings::from_env(),
                strict: std::env::var("CRONWAY_STRICT_DISPATCH")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            },
        }
    }
}

impl EngineSettings {
    /// Resolve engine endpoints from the environment.
    pub fn from_env() -> Self {
        // n8n needs both a base URL and an API key to go live.
        let n8n = match (std::env::var("N8N_BASE_URL"), std::env::var("N8N_API_KEY")) {
            (Ok(base_url), Ok(api_key)) => Some(EngineEndpoint {
                base_url,
                api_key: Some(api_key),
            }),
            _ => None,
        };

        // Langflow can run unauthenticated; the key is optional.
        let langflow = std::env::var("LANGFLOW_BASE_URL")
            .ok()
            .map(|base_url| EngineEndpoint {
                base_url,
                api_key: std::env::var("LANGFLOW_API_KEY").ok(),
            });

        Self { n8n, langflow }
    }
}
