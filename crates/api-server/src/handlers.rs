//! HTTP request handlers for API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::types::{
    CreateJobRequest, CreateJobResponse, DetectSportRequest, DetectSportResponse, HealthResponse,
    JobStatusResponse, RecommendationsRequest, RecommendationsResponse, SignedUploadParams,
    SignedUploadResponse,
};
use crate::ApiState;
use athlete_coaching::focus_tips;
use athlete_common::{ErrorKind, PipelineError};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Sign a URL the client can PUT its clip to
pub async fn signed_upload(
    State(state): State<ApiState>,
    Query(params): Query<SignedUploadParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (url, object_path) = state
        .pipeline
        .signed_upload(&params.name, &params.content_type)
        .await
        .map_err(internal_error)?;

    Ok(Json(SignedUploadResponse { url, object_path }))
}

/// Accept a new analysis job; processing continues in the background
pub async fn create_job(
    State(state): State<ApiState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if request.object_path.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "objectPath required".to_string()));
    }

    let id = state
        .pipeline
        .submit(request.object_path, request.sport, request.focus)
        .await;

    info!("Created job {}", id);
    Ok((StatusCode::ACCEPTED, Json(CreateJobResponse { id })))
}

/// Report a job's status with its result or classified error
pub async fn job_status(
    State(state): State<ApiState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let job = state
        .pipeline
        .job(job_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "not found".to_string()))?;

    Ok(Json(JobStatusResponse {
        status: job.status,
        result: job.result,
        error: job.error,
    }))
}

/// Classify a stored clip without running the full pipeline
pub async fn detect_sport(
    State(state): State<ApiState>,
    Json(request): Json<DetectSportRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sport = state
        .pipeline
        .detect_sport(&request.object_path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::FetchFailed => (StatusCode::NOT_FOUND, e.to_string()),
            _ => internal_error(e),
        })?;

    Ok(Json(DetectSportResponse {
        sport: sport.as_str().to_string(),
    }))
}

/// Look up focus tips for a sport and focus area
pub async fn recommendations(
    Json(request): Json<RecommendationsRequest>,
) -> impl IntoResponse {
    Json(RecommendationsResponse {
        recommendations: focus_tips(&request.sport, &request.focus, 3),
    })
}

fn internal_error(e: PipelineError) -> (StatusCode, String) {
    error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
