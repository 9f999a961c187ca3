//! Request and response types for the HTTP API

use athlete_coaching::FocusTip;
use athlete_orchestrator::{AnalysisResult, ErrorInfo, JobStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
}

/// Signed-upload query parameters
#[derive(Debug, Deserialize)]
pub struct SignedUploadParams {
    pub name: String,
    #[serde(rename = "contentType", default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "video/mp4".to_string()
}

/// Signed-upload response: where to PUT the clip and the object path
/// to submit afterwards
#[derive(Debug, Serialize, Deserialize)]
pub struct SignedUploadResponse {
    pub url: String,
    #[serde(rename = "objectPath")]
    pub object_path: String,
}

/// Job submission request
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "objectPath")]
    pub object_path: String,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub focus: Option<String>,
}

/// Job submission response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub id: Uuid,
}

/// Job status response
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Standalone sport detection request
#[derive(Debug, Deserialize)]
pub struct DetectSportRequest {
    #[serde(rename = "objectPath")]
    pub object_path: String,
}

/// Standalone sport detection response
#[derive(Debug, Serialize, Deserialize)]
pub struct DetectSportResponse {
    pub sport: String,
}

/// Focus recommendation request
#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub sport: String,
    pub focus: String,
}

/// Focus recommendation response
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<FocusTip>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_job_request_keys() {
        let req: CreateJobRequest = serde_json::from_str(
            r#"{"objectPath": "uploads/clip.mp4", "focus": "swing"}"#,
        )
        .unwrap();
        assert_eq!(req.object_path, "uploads/clip.mp4");
        assert_eq!(req.sport, None);
        assert_eq!(req.focus.as_deref(), Some("swing"));
    }

    #[test]
    fn test_signed_upload_defaults_content_type() {
        let params: SignedUploadParams =
            serde_json::from_str(r#"{"name": "clip.mp4"}"#).unwrap();
        assert_eq!(params.content_type, "video/mp4");
    }

    #[test]
    fn test_status_response_omits_empty_fields() {
        let response = JobStatusResponse {
            status: JobStatus::Processing,
            result: None,
            error: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"PROCESSING"}"#);
    }
}
