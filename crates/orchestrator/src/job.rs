//! Job model and analysis result payload

use athlete_common::ErrorKind;
use athlete_metrics::AggregatedMetrics;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an analysis job. Every job starts `Processing`
/// and moves exactly once to `Done` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Processing,
    Done,
    Error,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// Classified failure attached to a job that ended in `Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

/// Shape of the source video as actually decoded
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VideoMetrics {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Everything a finished job reports back to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sport: String,
    pub summary: String,
    pub metrics: VideoMetrics,
    pub form_metrics: AggregatedMetrics,
    pub form_tips: Vec<String>,
    pub drills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_tips: Option<Vec<athlete_coaching::FocusTip>>,
    pub overlay_url: String,
}

/// A single analysis job and its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub input_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Job {
    #[must_use]
    pub fn processing(id: Uuid, input_ref: String) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            input_ref,
            result: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"PROCESSING\""
        );
        assert_eq!(serde_json::to_string(&JobStatus::Done).unwrap(), "\"DONE\"");
        assert_eq!(
            serde_json::to_string(&JobStatus::Error).unwrap(),
            "\"ERROR\""
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_new_job_has_no_outcome() {
        let job = Job::processing(Uuid::new_v4(), "uploads/clip.mp4".to_string());
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
    }
}
