//! In-memory job store
//!
//! A shared map guarded by an async `RwLock`. Reads never block each
//! other; terminal transitions are single-shot, so a job that already
//! finished keeps its first outcome.

use crate::job::{AnalysisResult, ErrorInfo, Job, JobStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Cloneable handle to the shared job map
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in the `Processing` state
    pub async fn insert(&self, id: Uuid, input_ref: String) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(id, Job::processing(id, input_ref));
    }

    /// Snapshot of a job, if known
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).cloned()
    }

    /// Move a job to `Done` with its result. Returns false when the
    /// job is unknown or already terminal; the stored outcome is left
    /// untouched in that case.
    pub async fn complete(&self, id: Uuid, result: AnalysisResult) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Processing => {
                job.status = JobStatus::Done;
                job.result = Some(result);
                true
            }
            Some(job) => {
                warn!("Ignoring completion for job {} in state {:?}", id, job.status);
                false
            }
            None => false,
        }
    }

    /// Move a job to `Error` with its classified failure. Same
    /// single-shot rule as `complete`.
    pub async fn fail(&self, id: Uuid, error: ErrorInfo) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Processing => {
                job.status = JobStatus::Error;
                job.error = Some(error);
                true
            }
            Some(job) => {
                warn!("Ignoring failure for job {} in state {:?}", id, job.status);
                false
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athlete_common::ErrorKind;
    use crate::job::VideoMetrics;

    fn dummy_result() -> AnalysisResult {
        AnalysisResult {
            sport: "tennis".to_string(),
            summary: "Focus on stance & shoulder rotation.".to_string(),
            metrics: VideoMetrics {
                frames: 10,
                width: 640,
                height: 480,
                fps: 30.0,
            },
            form_metrics: Default::default(),
            form_tips: vec![],
            drills: vec![],
            focus: None,
            focus_tips: None,
            overlay_url: "https://example.invalid/overlay".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = JobStore::new();
        let id = Uuid::new_v4();
        store.insert(id, "uploads/clip.mp4".to_string()).await;

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.input_ref, "uploads/clip.mp4");
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let store = JobStore::new();
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_terminal_transition_is_single_shot() {
        let store = JobStore::new();
        let id = Uuid::new_v4();
        store.insert(id, "uploads/clip.mp4".to_string()).await;

        assert!(store.complete(id, dummy_result()).await);
        // A later failure must not overwrite the first outcome
        assert!(
            !store
                .fail(
                    id,
                    ErrorInfo {
                        kind: ErrorKind::Internal,
                        message: "late".to_string(),
                    }
                )
                .await
        );

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.result.is_some());
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn test_fail_then_complete_keeps_error() {
        let store = JobStore::new();
        let id = Uuid::new_v4();
        store.insert(id, "uploads/clip.mp4".to_string()).await;

        assert!(
            store
                .fail(
                    id,
                    ErrorInfo {
                        kind: ErrorKind::FetchFailed,
                        message: "no such object".to_string(),
                    }
                )
                .await
        );
        assert!(!store.complete(id, dummy_result()).await);

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.unwrap().kind, ErrorKind::FetchFailed);
    }

    #[tokio::test]
    async fn test_concurrent_reads() {
        let store = JobStore::new();
        let id = Uuid::new_v4();
        store.insert(id, "uploads/clip.mp4".to_string()).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.get(id).await.is_some() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
