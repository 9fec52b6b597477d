//! Queue handle and the single worker that applies tasks

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::render::{CollaboratorError, Renderer, UpdateNotifier};
use super::task::UpdateTask;

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    applied: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            enqueued: self.enqueued.load(Ordering::SeqCst),
            applied: self.applied.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Queue metrics for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    pub enqueued: u64,
    pub applied: u64,
    pub failed: u64,
}

impl QueueMetrics {
    /// Tasks enqueued but not yet consumed by the worker
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.applied + self.failed)
    }
}

/// Handle for submitting tasks to the update worker
///
/// Cloneable; every clone feeds the same FIFO. The worker exits once all
/// handles are dropped.
#[derive(Clone)]
pub struct UpdateQueue {
    tx: mpsc::UnboundedSender<UpdateTask>,
    counters: Arc<Counters>,
}

impl UpdateQueue {
    /// Spawn the worker for `artifact` and return a handle plus the worker task
    pub fn spawn(
        artifact: impl Into<PathBuf>,
        renderer: Arc<dyn Renderer>,
        notifier: Arc<dyn UpdateNotifier>,
    ) -> (Self, JoinHandle<QueueMetrics>) {
        let artifact = artifact.into();
        debug!(?artifact, "UpdateQueue::spawn: called");
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());

        let worker = Worker {
            artifact,
            renderer,
            notifier,
            counters: counters.clone(),
        };
        let handle = tokio::spawn(worker.run(rx));

        (Self { tx, counters }, handle)
    }

    /// Append a task; never blocks
    pub fn enqueue(&self, task: UpdateTask) {
        debug!(kind = task.kind(), "UpdateQueue::enqueue: called");
        // Count before sending so the worker can never report more consumed than enqueued
        self.counters.enqueued.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.tx.send(task) {
            self.counters.enqueued.fetch_sub(1, Ordering::SeqCst);
            warn!(kind = e.0.kind(), "Update worker is gone, dropping task");
        }
    }

    /// Current queue metrics
    pub fn metrics(&self) -> QueueMetrics {
        self.counters.snapshot()
    }
}

/// Sole writer of the artifact
struct Worker {
    artifact: PathBuf,
    renderer: Arc<dyn Renderer>,
    notifier: Arc<dyn UpdateNotifier>,
    counters: Arc<Counters>,
}

impl Worker {
    /// Runs until every queue handle is dropped, then reports final metrics
    async fn run(self, mut rx: mpsc::UnboundedReceiver<UpdateTask>) -> QueueMetrics {
        info!(artifact = ?self.artifact, "Update worker started");

        while let Some(task) = rx.recv().await {
            let kind = task.kind();
            match self.apply(task).await {
                Ok(()) => {
                    debug!(kind, "Update worker: task applied");
                    self.counters.applied.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!(kind, error = %e, "Update worker: task failed");
                    self.counters.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let metrics = self.counters.snapshot();
        info!(?metrics, "Update worker stopped");
        metrics
    }

    async fn apply(&self, task: UpdateTask) -> Result<(), CollaboratorError> {
        match task {
            UpdateTask::Draw { target, attribute } => {
                self.renderer.draw(&self.artifact, &target, &attribute).await?;
                self.notifier.artifact_updated().await;
            }
            UpdateTask::Replace { source } => {
                // rename is atomic as long as staging sits on the artifact's filesystem
                tokio::fs::rename(&source, &self.artifact).await?;
                info!(?source, artifact = ?self.artifact, "Artifact replaced");
            }
        }
        Ok(())
    }
}

/// Copy a template artifact next to `staging` and return the task that swaps it in
///
/// Each call stages into its own file derived from `staging`; the worker is the
/// only one that touches it afterwards.
pub async fn stage_fresh(template: &Path, staging: &Path) -> Result<UpdateTask, CollaboratorError> {
    let staged = unique_staging_path(staging);
    debug!(?template, ?staged, "stage_fresh: called");
    tokio::fs::copy(template, &staged).await?;
    Ok(UpdateTask::replace(staged))
}

/// `dir/map_temp.webp` becomes `dir/map_temp-<uuid>.webp`
fn unique_staging_path(staging: &Path) -> PathBuf {
    let stem = staging
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "staged".to_string());
    let name = match staging.extension() {
        Some(ext) => format!("{}-{}.{}", stem, Uuid::now_v7(), ext.to_string_lossy()),
        None => format!("{}-{}", stem, Uuid::now_v7()),
    };
    staging.with_file_name(name)
}
