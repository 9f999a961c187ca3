//! REST API for athlete video analysis
//!
//! Clients upload a clip through a signed URL, submit it as a job, and
//! poll the status route until the annotated video and recommendations
//! are ready. Standalone sport detection and focus-tip lookup are also
//! exposed.

mod handlers;
mod types;

use athlete_orchestrator::AnalysisPipeline;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::*;
pub use types::*;

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    /// Pipeline handling job execution and storage access
    pub pipeline: Arc<AnalysisPipeline>,
}

impl ApiState {
    #[must_use]
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self { pipeline }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Upload and job lifecycle
        .route("/signed-upload", get(signed_upload))
        .route("/jobs", post(create_job))
        .route("/status/{job_id}", get(job_status))
        // Standalone classification and recommendations
        .route("/detect-sport", post(detect_sport))
        .route("/recommendations", post(recommendations))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await
}
