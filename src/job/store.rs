/// JSON-file persistence layer for the job registry
///
/// The registry is a single pretty-printed JSON array of job records at a
/// fixed path (human-readable, git-friendly) and the sole source of truth
/// across restarts. Every mutation is a full read-modify-write; writes go
/// through a temp file plus rename so a crash mid-write never clobbers
/// previously committed state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::JobError;
use crate::job::types::JobDefinition;

/// File-backed job registry.
///
/// Cheap to clone: clones share the same path and the same mutation lock, so
/// concurrent add/remove calls from API handlers serialize instead of
/// interleaving their read-modify-write cycles.
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JobStore {
    /// Create a store backed by the given registry file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full registry in record order.
    ///
    /// A missing file is a first run, not an error: returns an empty list.
    pub fn load(&self) -> Result<Vec<JobDefinition>, JobError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let jobs = serde_json::from_str(&raw)?;
        Ok(jobs)
    }

    /// Atomically replace the full registry.
    pub fn save(&self, jobs: &[JobDefinition]) -> Result<(), JobError> {
        let _guard = self.lock();
        self.persist(jobs)
    }

    /// Append a job and persist. Fails without mutating if the id exists.
    pub fn add(&self, job: JobDefinition) -> Result<Vec<JobDefinition>, JobError> {
        let _guard = self.lock();
        let mut jobs = self.load()?;
        if jobs.iter().any(|j| j.id == job.id) {
            return Err(JobError::DuplicateId(job.id));
        }
        jobs.push(job);
        self.persist(&jobs)?;
        Ok(jobs)
    }

    /// Remove a job by id and persist. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Result<Vec<JobDefinition>, JobError> {
        let _guard = self.lock();
        let mut jobs = self.load()?;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() != before {
            self.persist(&jobs)?;
        }
        Ok(jobs)
    }

    /// Write the registry to a sibling temp file, then rename into place.
    fn persist(&self, jobs: &[JobDefinition]) -> Result<(), JobError> {
        let json = serde_json::to_string_pretty(jobs)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!("💾 Saved {} cron jobs to {}", jobs.len(), self.path.display());
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // A panic in a prior holder cannot leave a half-written registry
        // (persist goes through a rename), so a poisoned lock is recoverable.
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::types::Engine;
    use serde_json::json;

    fn temp_store(name: &str) -> JobStore {
        let dir = std::env::temp_dir().join("cronway-test-store").join(name);
        std::fs::remove_dir_all(&dir).ok();
        JobStore::new(dir.join("cron-jobs.json"))
    }

    fn sample_job(id: &str) -> JobDefinition {
        JobDefinition {
            id: id.to_string(),
            workflow_id: "wf1".to_string(),
            engine: Engine::Langflow,
            schedule: "*/5 * * * *".to_string(),
            input_payload: json!({"x": 1}),
        }
    }

    #[test]
    fn load_returns_empty_without_registry() {
        let store = temp_store("missing");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn add_then_load_round_trips() {
        let store = temp_store("add");
        store.add(sample_job("j1")).unwrap();
        let jobs = store.load().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "j1");
        assert_eq!(jobs[0].workflow_id, "wf1");
        assert_eq!(jobs[0].input_payload, json!({"x": 1}));
    }

    #[test]
    fn duplicate_id_is_rejected_without_mutation() {
        let store = temp_store("dup");
        store.add(sample_job("j1")).unwrap();
        let raw_before = std::fs::read_to_string(store.path()).unwrap();

        let mut dup = sample_job("j1");
        dup.schedule = "0 0 * * *".to_string();
        let err = store.add(dup).unwrap_err();
        assert!(matches!(err, JobError::DuplicateId(id) if id == "j1"));

        let raw_after = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw_before, raw_after);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = temp_store("remove");
        store.add(sample_job("j1")).unwrap();
        store.add(sample_job("j2")).unwrap();

        let after_first = store.remove("j1").unwrap();
        let after_second = store.remove("j1").unwrap();
        assert_eq!(after_first.len(), 1);
        assert_eq!(after_second.len(), 1);
        assert_eq!(after_second[0].id, "j2");
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let store = temp_store("atomic");
        store.save(&[sample_job("j1"), sample_job("j2")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_registry_is_an_error() {
        let store = temp_store("corrupt");
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(JobError::Corrupt(_))));
    }

    #[test]
    fn registry_uses_wire_field_names_on_disk() {
        let store = temp_store("layout");
        store.add(sample_job("j1")).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"workflowId\""));
        assert!(raw.contains("\"inputPayload\""));
        assert!(raw.contains("\"langflow\""));
    }
}
