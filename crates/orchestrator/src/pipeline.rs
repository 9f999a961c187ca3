//! Analysis pipeline
//!
//! Drives a submitted clip through fetch, annotate, transcode, upload,
//! classification, metric aggregation, and recommendation stages, then
//! writes the single terminal outcome into the job store. All stage
//! work for a job happens inside one spawned task; the heavy FFmpeg
//! and ONNX work runs on the blocking pool.

use crate::job::{AnalysisResult, ErrorInfo, Job, VideoMetrics};
use crate::store::JobStore;
use athlete_classifier::resolve_sport;
use athlete_coaching::{coaching_plan, focus_tips, form_tips};
use athlete_common::{PipelineError, SportLabel, VideoMeta};
use athlete_metrics::MetricExtractor;
use athlete_pose::{LandmarkDetector, LandmarkFrame};
use athlete_storage::{ObjectStorage, StorageError};
use athlete_video::{VideoCodec, VideoError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinError;
use tracing::{error, info};
use uuid::Uuid;

/// Tunables for the pipeline; defaults mirror the service's standing
/// conventions (result paths, URL lifetimes, detection frame cap)
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Key prefix for annotated result videos
    pub result_prefix: String,
    /// Key prefix for client uploads
    pub upload_prefix: String,
    /// Lifetime of signed upload URLs
    pub put_url_expiry: Duration,
    /// Lifetime of signed result URLs
    pub get_url_expiry: Duration,
    /// Frame cap for standalone sport detection
    pub detect_sport_max_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            result_prefix: "results/".to_string(),
            upload_prefix: "uploads/".to_string(),
            put_url_expiry: Duration::from_secs(15 * 60),
            get_url_expiry: Duration::from_secs(240 * 60),
            detect_sport_max_frames: 120,
        }
    }
}

/// Orchestrates analysis jobs over injected collaborators. Cloning is
/// cheap; clones share the job store.
#[derive(Clone)]
pub struct AnalysisPipeline {
    storage: Arc<dyn ObjectStorage>,
    detector: Arc<dyn LandmarkDetector>,
    codec: Arc<dyn VideoCodec>,
    jobs: JobStore,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    #[must_use]
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        detector: Arc<dyn LandmarkDetector>,
        codec: Arc<dyn VideoCodec>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            storage,
            detector,
            codec,
            jobs: JobStore::new(),
            config,
        }
    }

    /// Accept a job: register it as `Processing` and hand the work to
    /// a background task. Returns immediately with the job id.
    pub async fn submit(
        &self,
        input_ref: String,
        sport_hint: Option<String>,
        focus: Option<String>,
    ) -> Uuid {
        let job_id = Uuid::new_v4();
        self.jobs.insert(job_id, input_ref.clone()).await;

        info!("Accepted job {} for {}", job_id, input_ref);

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run(job_id, input_ref, sport_hint, focus).await;
        });

        job_id
    }

    /// Look up a job snapshot
    pub async fn job(&self, id: Uuid) -> Option<Job> {
        self.jobs.get(id).await
    }

    /// Sign an upload URL for a client; the object lands under the
    /// upload prefix
    pub async fn signed_upload(
        &self,
        name: &str,
        content_type: &str,
    ) -> Result<(String, String), PipelineError> {
        let object_path = format!("{}{}", self.config.upload_prefix, name);
        let url = self
            .storage
            .presigned_put_url(&object_path, content_type, self.config.put_url_expiry)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok((url, object_path))
    }

    /// Classify a stored clip without running the full pipeline.
    /// Samples at most the configured number of frames.
    pub async fn detect_sport(&self, input_ref: &str) -> Result<SportLabel, PipelineError> {
        let workdir =
            TempDir::new().map_err(|e| PipelineError::Internal(e.to_string()))?;
        let input_path = workdir.path().join("input.mp4");

        self.storage
            .retrieve_file_to_path(input_ref, &input_path)
            .await
            .map_err(classify_fetch_error)?;

        let codec = Arc::clone(&self.codec);
        let detector = Arc::clone(&self.detector);
        let max_frames = self.config.detect_sport_max_frames;
        let path = input_path.clone();

        let (meta, series) = tokio::task::spawn_blocking(move || {
            let meta = codec.probe(&path)?;
            let series = codec.sample_landmarks(&path, detector.as_ref(), max_frames)?;
            Ok::<_, VideoError>((meta, series))
        })
        .await
        .map_err(classify_join_error)?
        .map_err(classify_video_error)?;

        Ok(resolve_sport(None, &series, meta.width, meta.height))
    }

    /// Run the full pipeline for one job and record its outcome. The
    /// terminal write is single-shot; whatever happens first wins.
    async fn run(
        self,
        job_id: Uuid,
        input_ref: String,
        sport_hint: Option<String>,
        focus: Option<String>,
    ) {
        match self.execute(job_id, &input_ref, sport_hint, focus).await {
            Ok(result) => {
                info!("Job {} done ({})", job_id, result.sport);
                self.jobs.complete(job_id, result).await;
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                self.jobs
                    .fail(
                        job_id,
                        ErrorInfo {
                            kind: e.kind(),
                            message: e.to_string(),
                        },
                    )
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        job_id: Uuid,
        input_ref: &str,
        sport_hint: Option<String>,
        focus: Option<String>,
    ) -> Result<AnalysisResult, PipelineError> {
        // Working files live in a per-job directory that is removed on
        // every exit path
        let workdir =
            TempDir::new().map_err(|e| PipelineError::Internal(e.to_string()))?;
        let input_path = workdir.path().join("input.mp4");
        let annotated_path = workdir.path().join("annotated.mp4");
        let final_path = workdir.path().join("final.mp4");

        // Stage 1: fetch the source clip
        self.storage
            .retrieve_file_to_path(input_ref, &input_path)
            .await
            .map_err(classify_fetch_error)?;

        // Stage 2: decode, detect landmarks, draw overlays, encode
        let (meta, series) = self
            .annotate_blocking(input_path.clone(), annotated_path.clone())
            .await?;

        // Stage 3: normalize the annotated clip to H.264/AAC MP4
        let codec = Arc::clone(&self.codec);
        let (src, dst) = (annotated_path.clone(), final_path.clone());
        tokio::task::spawn_blocking(move || codec.transcode(&src, &dst))
            .await
            .map_err(classify_join_error)?
            .map_err(classify_video_error)?;

        // Stage 4: upload the result to its deterministic key
        let result_key = format!("{}{}.mp4", self.config.result_prefix, job_id);
        self.storage
            .store_file_from_path(&result_key, &final_path, "video/mp4")
            .await
            .map_err(|e| PipelineError::UploadFailed(e.to_string()))?;

        // Stage 5: resolve the sport label
        let hint = sport_hint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(SportLabel::parse);
        let sport = resolve_sport(hint, &series, meta.width, meta.height);

        // Stage 6: aggregate metrics and derive recommendations
        let mut extractor = MetricExtractor::new();
        for frame in &series {
            extractor.push(frame.as_ref());
        }
        let form_metrics = extractor.aggregate();
        let tips = form_tips(&form_metrics);
        let plan = coaching_plan(sport);

        let focus = focus
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());
        let focus_tip_list = focus
            .as_deref()
            .map(|f| focus_tips(sport.as_str(), f, 3));

        // Stage 7: sign a download URL for the stored result
        let overlay_url = self
            .storage
            .presigned_get_url(&result_key, self.config.get_url_expiry)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        Ok(AnalysisResult {
            sport: sport.as_str().to_string(),
            summary: plan.summary,
            metrics: VideoMetrics {
                frames: meta.frame_count,
                width: meta.width,
                height: meta.height,
                fps: meta.fps,
            },
            form_metrics,
            form_tips: tips,
            drills: plan.drills,
            focus,
            focus_tips: focus_tip_list,
            overlay_url,
        })
    }

    async fn annotate_blocking(
        &self,
        input: PathBuf,
        output: PathBuf,
    ) -> Result<(VideoMeta, Vec<Option<LandmarkFrame>>), PipelineError> {
        let codec = Arc::clone(&self.codec);
        let detector = Arc::clone(&self.detector);

        tokio::task::spawn_blocking(move || codec.annotate(&input, &output, detector.as_ref()))
            .await
            .map_err(classify_join_error)?
            .map_err(classify_video_error)
    }
}

fn classify_fetch_error(e: StorageError) -> PipelineError {
    PipelineError::FetchFailed(e.to_string())
}

/// Decode-side failures are the clip's fault; detector failures are
/// ours; transcode failures carry the external tool's stderr
fn classify_video_error(e: VideoError) -> PipelineError {
    match e {
        VideoError::Open(_) | VideoError::NoVideoStream | VideoError::Decode(_)
        | VideoError::Encode(_) => PipelineError::DecodeFailed(e.to_string()),
        VideoError::Transcode(_) => PipelineError::TranscodeFailed(e.to_string()),
        VideoError::Detector(_) => PipelineError::Internal(e.to_string()),
    }
}

fn classify_join_error(e: JoinError) -> PipelineError {
    PipelineError::Internal(format!("worker task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.result_prefix, "results/");
        assert_eq!(config.upload_prefix, "uploads/");
        assert_eq!(config.put_url_expiry, Duration::from_secs(900));
        assert_eq!(config.get_url_expiry, Duration::from_secs(14_400));
        assert_eq!(config.detect_sport_max_frames, 120);
    }

    #[test]
    fn test_video_error_classification() {
        assert_eq!(
            classify_video_error(VideoError::NoVideoStream).kind(),
            athlete_common::ErrorKind::DecodeFailed
        );
        assert_eq!(
            classify_video_error(VideoError::Encode("x".into())).kind(),
            athlete_common::ErrorKind::DecodeFailed
        );
        assert_eq!(
            classify_video_error(VideoError::Transcode("x".into())).kind(),
            athlete_common::ErrorKind::TranscodeFailed
        );
        assert_eq!(
            classify_video_error(VideoError::Detector(
                athlete_pose::PoseError::Inference("x".into())
            ))
            .kind(),
            athlete_common::ErrorKind::Internal
        );
    }
}
