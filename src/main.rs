/// Cronway: Hyperminimalist cron trigger scheduling for hosted workflow engines
///
/// Main entry point for the cronway server. Initializes configuration and
/// starts the HTTP server with job management, scheduling, and dispatch.

use cronway::{config::Config, server::start_server};

/// Application entry point
///
/// Initializes the server with default configuration and starts listening.
/// The server provides:
/// - Cron job management API at /api/cron
/// - Manual workflow triggering at /api/trigger
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3010 and data/cron-jobs.json)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}
