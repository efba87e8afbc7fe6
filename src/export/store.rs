use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::export::job::{Artifact, JobId, JobSnapshot, JobStatus};
use crate::export::tier::Tier;

/// Shared keyed job map.
///
/// Readers get cloned snapshots and never wait on rendering or encoding; every write is a short
/// critical section. Transition methods return `false` when the job is unknown or the transition
/// is not allowed from its current state.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobSnapshot>>,
}

impl JobStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobSnapshot>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobSnapshot>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, id: JobId, f: impl FnOnce(&mut JobSnapshot) -> bool) -> bool {
        match self.write().get_mut(&id) {
            Some(job) => f(job),
            None => false,
        }
    }

    /// Add a job.
    pub fn insert(&self, job: JobSnapshot) {
        self.write().insert(job.id, job);
    }

    /// Latest committed snapshot of `id`.
    pub fn get(&self, id: JobId) -> Option<JobSnapshot> {
        self.read().get(&id).cloned()
    }

    /// Every job, oldest first.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self.read().values().cloned().collect();
        jobs.sort_by_key(|j| (j.created_at_ms, j.id));
        jobs
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// `true` when the store holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// `Queued -> Processing` with the chosen tier.
    pub fn start(&self, id: JobId, tier: Tier, now_ms: u64) -> bool {
        self.update(id, |job| {
            if job.status != JobStatus::Queued {
                return false;
            }
            job.status = JobStatus::Processing;
            job.tier = Some(tier);
            job.updated_at_ms = now_ms;
            true
        })
    }

    /// Raise progress of a processing job. Never lowers it; values above 100 are capped.
    pub fn advance(&self, id: JobId, percent: u8, now_ms: u64) -> bool {
        self.update(id, |job| {
            let percent = percent.min(100);
            if job.status != JobStatus::Processing || percent <= job.progress_percent {
                return false;
            }
            job.progress_percent = percent;
            job.updated_at_ms = now_ms;
            true
        })
    }

    /// `Processing -> Completed` with its artifact.
    pub fn complete(&self, id: JobId, output: Artifact, now_ms: u64) -> bool {
        self.update(id, |job| {
            if job.status != JobStatus::Processing {
                return false;
            }
            job.status = JobStatus::Completed;
            job.progress_percent = 100;
            job.output = Some(output);
            job.updated_at_ms = now_ms;
            true
        })
    }

    /// `Queued | Processing -> Error`.
    pub fn fail(&self, id: JobId, message: impl Into<String>, now_ms: u64) -> bool {
        self.update(id, |job| {
            if job.status.is_terminal() {
                return false;
            }
            job.status = JobStatus::Error;
            job.error_message = Some(message.into());
            job.output = None;
            job.updated_at_ms = now_ms;
            true
        })
    }

    /// Remove and return a job.
    pub fn remove(&self, id: JobId) -> Option<JobSnapshot> {
        self.write().remove(&id)
    }

    /// Remove and return every job created more than `max_age_ms` before `now_ms`.
    pub fn evict_older_than(&self, now_ms: u64, max_age_ms: u64) -> Vec<JobSnapshot> {
        let mut jobs = self.write();
        let expired: Vec<JobId> = jobs
            .values()
            .filter(|j| now_ms.saturating_sub(j.created_at_ms) > max_age_ms)
            .map(|j| j.id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| jobs.remove(&id))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/store.rs"]
mod tests;
