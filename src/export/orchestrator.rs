use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::ExportConfig;
use crate::export::capabilities::Capabilities;
use crate::export::job::{FetchedArtifact, JobId, JobSnapshot, JobStatus};
use crate::export::pipeline::{TierInput, run_tier};
use crate::export::settings::ExportRequest;
use crate::export::store::JobStore;
use crate::export::tier::Tier;
use crate::foundation::cancel::{CancelHandle, CancelToken, cancel_pair};
use crate::foundation::clock::{Clock, SystemClock};
use crate::foundation::error::{PathreelError, PathreelResult};

/// Accepts export requests and runs them as background jobs.
///
/// Cheap to clone; clones share one job store. Status reads never wait on rendering or
/// encoding.
#[derive(Clone)]
pub struct ExportOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    store: JobStore,
    caps: Arc<Capabilities>,
    config: Arc<ExportConfig>,
    clock: Arc<dyn Clock>,
    cancels: Mutex<HashMap<JobId, CancelHandle>>,
    runtime: Handle,
    shutdown: CancelHandle,
    shutdown_token: CancelToken,
}

impl Inner {
    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn cancels(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, CancelHandle>> {
        self.cancels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExportOrchestrator {
    /// Orchestrator on the current tokio runtime with the system clock.
    pub fn new(config: ExportConfig, caps: Capabilities) -> PathreelResult<Self> {
        Self::with_clock(config, caps, Arc::new(SystemClock))
    }

    /// Orchestrator with an injected clock. Must be called from within a tokio runtime.
    pub fn with_clock(
        config: ExportConfig,
        caps: Capabilities,
        clock: Arc<dyn Clock>,
    ) -> PathreelResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            PathreelError::capability(format!("export orchestrator needs a tokio runtime: {e}"))
        })?;
        let (shutdown, shutdown_token) = cancel_pair();
        tracing::info!(tier = %caps.best_tier(), "export orchestrator ready");
        Ok(Self {
            inner: Arc::new(Inner {
                store: JobStore::new(),
                caps: Arc::new(caps),
                config: Arc::new(config),
                clock,
                cancels: Mutex::new(HashMap::new()),
                runtime,
                shutdown,
                shutdown_token,
            }),
        })
    }

    /// Capabilities injected at construction.
    pub fn capabilities(&self) -> &Capabilities {
        &self.inner.caps
    }

    /// Tier every job runs with.
    pub fn tier(&self) -> Tier {
        self.inner.caps.best_tier()
    }

    /// Validate `request`, queue a job and return its id without waiting for it.
    pub fn submit(&self, request: ExportRequest) -> PathreelResult<JobId> {
        request.validate()?;
        if self.inner.shutdown.is_cancelled() {
            return Err(PathreelError::capability("export orchestrator is shut down"));
        }

        let id = JobId::new();
        let (handle, token) = cancel_pair();
        self.inner.cancels().insert(id, handle);
        self.inner
            .store
            .insert(JobSnapshot::queued(id, self.inner.now()));
        tracing::info!(
            job = %id,
            routes = request.routes.len(),
            width = request.settings.width,
            height = request.settings.height,
            fps = request.settings.fps,
            "export submitted"
        );

        let inner = self.inner.clone();
        self.inner
            .runtime
            .spawn(process(inner, id, Arc::new(request), token));
        Ok(id)
    }

    /// Latest committed snapshot of a job.
    pub fn status(&self, id: JobId) -> PathreelResult<JobSnapshot> {
        self.inner
            .store
            .get(id)
            .ok_or_else(|| PathreelError::not_found(format!("job {id}")))
    }

    /// Every known job, oldest first.
    pub fn list(&self) -> Vec<JobSnapshot> {
        self.inner.store.list()
    }

    /// Read the artifact of a completed job.
    pub async fn fetch_artifact(&self, id: JobId) -> PathreelResult<FetchedArtifact> {
        let job = self.status(id)?;
        let artifact = match (job.status, job.output) {
            (JobStatus::Completed, Some(artifact)) => artifact,
            (status, _) => {
                return Err(PathreelError::not_found(format!(
                    "job {id} has no artifact (status {status})"
                )));
            }
        };
        let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PathreelError::not_found(format!(
                    "artifact '{}' is gone",
                    artifact.path.display()
                ))
            } else {
                PathreelError::Io(e)
            }
        })?;
        Ok(FetchedArtifact {
            bytes,
            content_type: artifact.content_type(),
            file_name: format!("{id}.{}", artifact.kind.extension()),
        })
    }

    /// Request cooperative cancellation. Returns `false` when the job already finished.
    pub fn cancel(&self, id: JobId) -> PathreelResult<bool> {
        let job = self.status(id)?;
        if job.status.is_terminal() {
            return Ok(false);
        }
        match self.inner.cancels().get(&id) {
            Some(handle) => {
                handle.cancel();
                tracing::info!(job = %id, "cancellation requested");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Evict every job created more than `max_age_ms` ago, whatever its state, deleting its
    /// artifact. Returns the number of evicted jobs.
    pub fn cleanup(&self, max_age_ms: u64) -> usize {
        let evicted = self
            .inner
            .store
            .evict_older_than(self.inner.now(), max_age_ms);
        for job in &evicted {
            if let Some(handle) = self.inner.cancels().remove(&job.id) {
                handle.cancel();
            }
            if let Some(artifact) = &job.output {
                remove_artifact(&artifact.path);
            }
        }
        if !evicted.is_empty() {
            tracing::info!(evicted = evicted.len(), max_age_ms, "cleaned up export jobs");
        }
        evicted.len()
    }

    /// Run [`cleanup`](Self::cleanup) with the configured max age every cleanup interval
    /// until [`shutdown`](Self::shutdown).
    pub fn spawn_cleanup_loop(&self) -> JoinHandle<()> {
        let this = self.clone();
        let period = self.inner.config.cleanup_interval();
        let max_age_ms = self.inner.config.max_job_age_ms();
        let shutdown = self.inner.shutdown_token.clone();
        self.inner.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("cleanup loop stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        this.cleanup(max_age_ms);
                    }
                }
            }
        })
    }

    /// Cancel every in-flight job and stop the cleanup loop. New submissions are refused.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let cancels = self.inner.cancels();
        for handle in cancels.values() {
            handle.cancel();
        }
        tracing::info!(in_flight = cancels.len(), "export orchestrator shutting down");
    }

    /// Poll until the job reaches `completed` or `error`.
    pub async fn wait(&self, id: JobId, poll: Duration) -> PathreelResult<JobSnapshot> {
        loop {
            let job = self.status(id)?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll).await;
        }
    }
}

#[tracing::instrument(skip(inner, request, cancel))]
async fn process(inner: Arc<Inner>, id: JobId, request: Arc<ExportRequest>, cancel: CancelToken) {
    let tier = inner.caps.best_tier();
    if !inner.store.start(id, tier, inner.now()) {
        inner.cancels().remove(&id);
        return;
    }
    tracing::info!(%tier, "export started");

    let progress_inner = inner.clone();
    let input = TierInput {
        job_id: id,
        request,
        config: inner.config.clone(),
        caps: inner.caps.clone(),
        cancel,
        progress: Arc::new(move |pct| {
            progress_inner
                .store
                .advance(id, pct, progress_inner.now());
        }),
    };

    let outcome = inner
        .runtime
        .spawn(async move { run_tier(tier, &input).await })
        .await
        .unwrap_or_else(|e| Err(PathreelError::render(format!("export task failed: {e}"))));

    match outcome {
        Ok(artifact) => {
            let path = artifact.path.clone();
            if inner.store.complete(id, artifact, inner.now()) {
                tracing::info!(path = %path.display(), "export completed");
            } else {
                tracing::debug!("job evicted before completion, discarding artifact");
                remove_artifact(&path);
            }
        }
        Err(e) => {
            if e.is_cancelled() {
                tracing::info!("export cancelled");
            } else {
                tracing::error!(error = %e, "export failed");
            }
            inner.store.fail(id, e.to_string(), inner.now());
        }
    }
    inner.cancels().remove(&id);
}

fn remove_artifact(path: &std::path::Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to delete artifact"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/orchestrator.rs"]
mod tests;
