/// Server setup and initialization
///
/// Wires together all components: job registry, engine dispatcher, cron
/// scheduler, and HTTP routes. The registry is reloaded into live timers
/// before the server starts listening; no timer survives a restart on its
/// own, so startup recovery comes first.

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;

use crate::{
    api::{jobs::AppState, create_job_routes, create_trigger_routes},
    config::Config,
    job::store::JobStore,
    runtime::{
        dispatcher::Dispatcher,
        scheduler::{CronScheduler, DispatchFn},
    },
};

/// Create the main Axum application with all routes and state
///
/// Initializes the registry, dispatcher, and scheduler, restores timers from
/// durable state, and assembles the router.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📋 Opening job registry at {}", config.store.jobs_file);
    let store = JobStore::new(&config.store.jobs_file);

    let dispatcher = Arc::new(Dispatcher::new(
        config.dispatch.engines.clone(),
        config.dispatch.strict,
    ));

    // Each firing clones the job into the dispatcher; firings are never
    // awaited by the timer, so overlapping runs stay possible.
    let dispatch_fn: DispatchFn = {
        let dispatcher = Arc::clone(&dispatcher);
        Arc::new(move |job| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                dispatcher
                    .dispatch(job.engine, &job.workflow_id, &job.input_payload)
                    .await
            })
        })
    };

    tracing::info!("⏰ Initializing cron scheduler");
    let scheduler = Arc::new(
        CronScheduler::new(store.clone(), dispatch_fn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize cron scheduler: {e}"))?,
    );

    tracing::info!("📥 Restoring cron jobs from durable state");
    let installed = scheduler
        .reload_all()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to restore cron jobs: {e}"))?;
    tracing::info!("✅ {installed} cron jobs restored");

    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start cron scheduler: {e}"))?;

    let app_state = AppState {
        store,
        scheduler,
        dispatcher,
    };

    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Cron job management API routes
        .merge(create_job_routes().with_state(app_state.clone()))
        // Manual trigger route
        .merge(create_trigger_routes().with_state(app_state));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting cronway server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
