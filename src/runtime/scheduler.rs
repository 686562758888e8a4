/// Live cron scheduler service
///
/// Owns exactly one firing timer per registered job, keyed by job id with the
/// timer runtime's uuid as the cancelation handle. The registry file is the
/// source of truth; this map is a rebuildable projection of it. Nothing here
/// survives a restart, so `reload_all` runs once at startup before the
/// service accepts requests.
///
/// Uses the remove-then-add pattern for zero-downtime job updates: installing
/// an id that is already scheduled always supersedes the old timer.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::error::{DispatchError, JobError};
use crate::job::store::JobStore;
use crate::job::types::JobDefinition;
use crate::runtime::dispatcher::DispatchResult;

/// Future returned by a dispatch callback.
pub type DispatchFuture = Pin<Box<dyn Future<Output = Result<DispatchResult, DispatchError>> + Send>>;

/// Callback invoked with a clone of the job on every timer firing.
pub type DispatchFn = Arc<dyn Fn(JobDefinition) -> DispatchFuture + Send + Sync>;

/// In-memory firing record for one job. Never persisted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireStats {
    /// How many times the timer has fired since the last (re)install
    pub fire_count: u64,
    /// When the timer last fired
    pub last_fired_at: Option<DateTime<Utc>>,
    /// Whether the most recent dispatch fell back to the synthetic mock result
    pub last_mock: Option<bool>,
}

/// Cron scheduler with uuid-tracked timers and hot install/uninstall.
pub struct CronScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    job_uuid_map: Arc<RwLock<HashMap<String, Uuid>>>,
    fire_stats: Arc<RwLock<HashMap<String, FireStats>>>,
    store: JobStore,
    dispatch: DispatchFn,
}

impl CronScheduler {
    /// Create a scheduler over the given registry and dispatch callback.
    pub async fn new(store: JobStore, dispatch: DispatchFn) -> Result<Self, JobError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;
        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            job_uuid_map: Arc::new(RwLock::new(HashMap::new())),
            fire_stats: Arc::new(RwLock::new(HashMap::new())),
            store,
            dispatch,
        })
    }

    /// Start the timer runtime. Timers installed before or after this begin
    /// firing once it runs.
    pub async fn start(&self) -> Result<(), JobError> {
        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;
        tracing::info!("⏰ Cron scheduler started");
        Ok(())
    }

    /// Install (or replace) the timer for a job.
    ///
    /// Any live timer for the same id is removed first, even when the
    /// schedule or payload differs. A schedule that is not valid 5-field
    /// cron fails with `InvalidSchedule` and nothing is installed.
    pub async fn install(&self, job: &JobDefinition) -> Result<(), JobError> {
        // Replace semantics: drop the old timer before arming the new one.
        // A failed install therefore leaves the id unscheduled.
        {
            let mut map = self.job_uuid_map.write().await;
            if let Some(old_uuid) = map.remove(&job.id) {
                let scheduler = self.scheduler.read().await;
                if let Err(e) = scheduler.remove(&old_uuid).await {
                    tracing::warn!("⚠️ Failed to remove old timer for job {}: {}", job.id, e);
                }
            }
        }

        let schedule = normalize_schedule(&job.schedule)?;

        let job_def = job.clone();
        let dispatch = Arc::clone(&self.dispatch);
        let fire_stats = Arc::clone(&self.fire_stats);
        let cron_job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
            let job = job_def.clone();
            let dispatch = Arc::clone(&dispatch);
            let fire_stats = Arc::clone(&fire_stats);
            Box::pin(async move {
                tracing::info!(
                    "🔔 Cron fired: job {} → workflow {} ({})",
                    job.id,
                    job.workflow_id,
                    job.engine
                );
                let id = job.id.clone();
                let outcome = dispatch(job).await;

                let mut stats = fire_stats.write().await;
                let entry = stats.entry(id.clone()).or_default();
                entry.fire_count += 1;
                entry.last_fired_at = Some(Utc::now());
                match outcome {
                    Ok(result) => {
                        entry.last_mock = Some(result.mock);
                        if result.mock {
                            tracing::info!("📭 Dispatch for job {id} fell back to mock result");
                        } else {
                            tracing::info!("✅ Dispatch for job {id} accepted by engine");
                        }
                    }
                    Err(e) => {
                        // Strict mode only: the failure is logged and the
                        // timer keeps running for the next tick.
                        tracing::error!("❌ Dispatch for job {id} failed: {e}");
                    }
                }
            })
        })
        .map_err(|e| JobError::InvalidSchedule {
            expression: job.schedule.clone(),
            reason: e.to_string(),
        })?;

        let new_uuid = {
            let scheduler = self.scheduler.write().await;
            scheduler
                .add(cron_job)
                .await
                .map_err(|e| JobError::Scheduler(e.to_string()))?
        };

        self.job_uuid_map
            .write()
            .await
            .insert(job.id.clone(), new_uuid);
        tracing::info!(
            "📅 Installed cron job {} ('{}' → workflow {})",
            job.id,
            job.schedule,
            job.workflow_id
        );
        Ok(())
    }

    /// Stop and discard the timer for an id. No-op for unknown ids.
    ///
    /// An in-flight dispatch from an earlier tick is not canceled.
    pub async fn uninstall(&self, id: &str) {
        let removed = self.job_uuid_map.write().await.remove(id);
        if let Some(uuid) = removed {
            let scheduler = self.scheduler.read().await;
            if let Err(e) = scheduler.remove(&uuid).await {
                tracing::warn!("⚠️ Failed to remove timer for job {id}: {e}");
            } else {
                tracing::info!("🗑️ Uninstalled cron job {id}");
            }
            self.fire_stats.write().await.remove(id);
        }
    }

    /// Rebuild every timer from the registry.
    ///
    /// All live timers are dropped first so reload never leaks a handle,
    /// then one timer is installed per stored entry. An entry whose schedule
    /// no longer parses is logged and skipped rather than failing the rest.
    /// Returns the number of timers installed.
    pub async fn reload_all(&self) -> Result<usize, JobError> {
        {
            let mut map = self.job_uuid_map.write().await;
            let scheduler = self.scheduler.read().await;
            for (id, uuid) in map.drain() {
                if let Err(e) = scheduler.remove(&uuid).await {
                    tracing::warn!("⚠️ Failed to drop stale timer for job {id}: {e}");
                }
            }
            self.fire_stats.write().await.clear();
        }

        let jobs = self.store.load()?;
        let total = jobs.len();
        let mut installed = 0;
        for job in jobs {
            match self.install(&job).await {
                Ok(()) => installed += 1,
                Err(e) => tracing::error!("❌ Skipping job {} during reload: {}", job.id, e),
            }
        }
        tracing::info!("📥 Reloaded cron jobs: {installed}/{total} installed");
        Ok(installed)
    }

    /// Ids with a live timer.
    pub async fn scheduled_ids(&self) -> Vec<String> {
        self.job_uuid_map.read().await.keys().cloned().collect()
    }

    /// Number of live timers.
    pub async fn timer_count(&self) -> usize {
        self.job_uuid_map.read().await.len()
    }

    /// Snapshot of per-job firing records.
    pub async fn stats(&self) -> HashMap<String, FireStats> {
        self.fire_stats.read().await.clone()
    }
}

/// Validate a 5-field cron expression and convert it to the seconds-first
/// 6-field form the timer runtime consumes.
fn normalize_schedule(expression: &str) -> Result<String, JobError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(JobError::InvalidSchedule {
            expression: expression.to_string(),
            reason: format!(
                "expected 5 fields (minute hour day month weekday), got {}",
                fields.len()
            ),
        });
    }
    Ok(format!("0 {}", fields.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::types::Engine;
    use serde_json::json;

    fn sample_job(id: &str) -> JobDefinition {
        JobDefinition {
            id: id.to_string(),
            workflow_id: "wf1".to_string(),
            engine: Engine::Langflow,
            schedule: "*/5 * * * *".to_string(),
            input_payload: json!({"x": 1}),
        }
    }

    fn noop_dispatch() -> DispatchFn {
        Arc::new(|_job| Box::pin(async { Ok(DispatchResult::mock(Engine::Langflow)) }))
    }

    async fn test_scheduler(name: &str) -> (CronScheduler, JobStore) {
        let dir = std::env::temp_dir().join("cronway-test-sched").join(name);
        std::fs::remove_dir_all(&dir).ok();
        let store = JobStore::new(dir.join("cron-jobs.json"));
        let scheduler = CronScheduler::new(store.clone(), noop_dispatch())
            .await
            .unwrap();
        (scheduler, store)
    }

    #[test]
    fn five_field_schedules_gain_a_seconds_prefix() {
        assert_eq!(normalize_schedule("*/5 * * * *").unwrap(), "0 */5 * * * *");
        assert_eq!(normalize_schedule("0 8 * * 1").unwrap(), "0 0 8 * * 1");
        assert!(normalize_schedule("* * * *").is_err());
        assert!(normalize_schedule("0 */5 * * * *").is_err());
    }

    #[tokio::test]
    async fn install_rejects_malformed_schedules() {
        let (scheduler, _store) = test_scheduler("bad-cron").await;

        let mut job = sample_job("j1");
        job.schedule = "not a cron".to_string();
        assert!(matches!(
            scheduler.install(&job).await,
            Err(JobError::InvalidSchedule { .. })
        ));

        // Right field count but an out-of-range minute still fails.
        job.schedule = "99 * * * *".to_string();
        assert!(matches!(
            scheduler.install(&job).await,
            Err(JobError::InvalidSchedule { .. })
        ));
        assert_eq!(scheduler.timer_count().await, 0);
    }

    #[tokio::test]
    async fn install_replaces_existing_timer() {
        let (scheduler, _store) = test_scheduler("replace").await;
        let job = sample_job("j1");
        scheduler.install(&job).await.unwrap();
        let first = scheduler
            .job_uuid_map
            .read()
            .await
            .get("j1")
            .copied()
            .unwrap();

        let mut updated = job.clone();
        updated.schedule = "0 8 * * *".to_string();
        scheduler.install(&updated).await.unwrap();

        assert_eq!(scheduler.timer_count().await, 1);
        let second = scheduler
            .job_uuid_map
            .read()
            .await
            .get("j1")
            .copied()
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn uninstall_is_a_no_op_for_unknown_ids() {
        let (scheduler, _store) = test_scheduler("uninstall").await;
        scheduler.uninstall("ghost").await;
        assert_eq!(scheduler.timer_count().await, 0);
    }

    #[tokio::test]
    async fn uninstall_drops_the_timer() {
        let (scheduler, _store) = test_scheduler("uninstall-live").await;
        scheduler.install(&sample_job("j1")).await.unwrap();
        scheduler.uninstall("j1").await;
        scheduler.uninstall("j1").await; // idempotent
        assert_eq!(scheduler.timer_count().await, 0);
    }

    #[tokio::test]
    async fn reload_installs_one_timer_per_stored_job() {
        let (scheduler, store) = test_scheduler("reload").await;
        store.add(sample_job("j1")).unwrap();
        store.add(sample_job("j2")).unwrap();

        // A stale timer from before the reload must not leak through it.
        scheduler.install(&sample_job("stale")).await.unwrap();

        let installed = scheduler.reload_all().await.unwrap();
        assert_eq!(installed, 2);
        assert_eq!(scheduler.timer_count().await, 2);
        let mut ids = scheduler.scheduled_ids().await;
        ids.sort();
        assert_eq!(ids, vec!["j1".to_string(), "j2".to_string()]);
    }

    #[tokio::test]
    async fn reload_skips_entries_with_invalid_schedules() {
        let (scheduler, store) = test_scheduler("reload-skip").await;
        store.add(sample_job("good")).unwrap();
        let mut bad = sample_job("bad");
        bad.schedule = "whenever".to_string();
        store.add(bad).unwrap();

        let installed = scheduler.reload_all().await.unwrap();
        assert_eq!(installed, 1);
        assert_eq!(scheduler.scheduled_ids().await, vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn add_list_remove_round_trip() {
        let (scheduler, store) = test_scheduler("scenario").await;
        let job = sample_job("j1");
        store.add(job.clone()).unwrap();
        scheduler.install(&job).await.unwrap();

        let listed = store.load().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].workflow_id, "wf1");
        assert_eq!(listed[0].engine, Engine::Langflow);
        assert_eq!(listed[0].schedule, "*/5 * * * *");
        assert_eq!(listed[0].input_payload, json!({"x": 1}));

        scheduler.uninstall("j1").await;
        store.remove("j1").unwrap();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(scheduler.timer_count().await, 0);
    }
}
