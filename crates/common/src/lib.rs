/// Common types and utilities shared across the athlete analysis pipeline
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod geometry;

/// Pipeline errors, classified per failed stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stable machine-readable error kind
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::FetchFailed(_) => ErrorKind::FetchFailed,
            PipelineError::DecodeFailed(_) => ErrorKind::DecodeFailed,
            PipelineError::TranscodeFailed(_) => ErrorKind::TranscodeFailed,
            PipelineError::UploadFailed(_) => ErrorKind::UploadFailed,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Error kinds surfaced to status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FetchFailed,
    DecodeFailed,
    TranscodeFailed,
    UploadFailed,
    Internal,
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Normalized 2D point in [0, 1] x [0, 1] (image coordinates, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Source video shape, derived once at pipeline start
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: u64,
}

impl VideoMeta {
    /// Width/height aspect ratio; guards against a zero height
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

/// Closed set of sport labels the classifier can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SportLabel {
    Tennis,
    Soccer,
    Running,
    Unknown,
}

impl SportLabel {
    /// Get human-readable label name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SportLabel::Tennis => "tennis",
            SportLabel::Soccer => "soccer",
            SportLabel::Running => "running",
            SportLabel::Unknown => "unknown",
        }
    }

    /// Parse a caller-provided label (case-insensitive); anything outside
    /// the closed set maps to `Unknown`
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "tennis" => SportLabel::Tennis,
            "soccer" => SportLabel::Soccer,
            "running" => SportLabel::Running,
            _ => SportLabel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            PipelineError::FetchFailed("missing".into()).kind(),
            ErrorKind::FetchFailed
        );
        assert_eq!(
            PipelineError::TranscodeFailed("ffmpeg exited 1".into()).kind(),
            ErrorKind::TranscodeFailed
        );
        assert_eq!(
            PipelineError::Internal("oops".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_aspect_ratio() {
        let meta = VideoMeta {
            width: 1600,
            height: 800,
            fps: 30.0,
            frame_count: 120,
        };
        assert!((meta.aspect_ratio() - 2.0).abs() < 1e-9);

        // Zero height must not divide by zero
        let degenerate = VideoMeta {
            width: 100,
            height: 0,
            fps: 30.0,
            frame_count: 0,
        };
        assert!((degenerate.aspect_ratio() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sport_label_parse() {
        assert_eq!(SportLabel::parse("Tennis"), SportLabel::Tennis);
        assert_eq!(SportLabel::parse(" soccer "), SportLabel::Soccer);
        assert_eq!(SportLabel::parse("curling"), SportLabel::Unknown);
    }
}
