//! API Server Binary Entry Point

use athlete_api_server::{start_server, ApiState};
use athlete_orchestrator::{AnalysisPipeline, PipelineConfig};
use athlete_pose::{DetectorConfig, OnnxLandmarkDetector};
use athlete_storage::{S3Config, S3ObjectStorage};
use athlete_video::FfmpegCodec;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "athlete_api_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("ATHLETE_API_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let model_path = std::env::var("ATHLETE_POSE_MODEL")
        .unwrap_or_else(|_| "models/yolov8n-pose.onnx".to_string());

    let storage = S3ObjectStorage::new(S3Config::default()).await?;
    let detector = OnnxLandmarkDetector::new(&model_path, DetectorConfig::default())?;

    let pipeline = AnalysisPipeline::new(
        Arc::new(storage),
        Arc::new(detector),
        Arc::new(FfmpegCodec::new()),
        PipelineConfig::default(),
    );

    tracing::info!("Starting Athlete Video Analysis API Server");
    start_server(&addr, ApiState::new(Arc::new(pipeline))).await?;

    Ok(())
}
