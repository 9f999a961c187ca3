//! Job orchestration for athlete video analysis
//!
//! Owns the in-memory job store and the pipeline that turns an
//! uploaded clip into an annotated video plus sport classification,
//! aggregated form metrics, and coaching recommendations.

pub mod job;
pub mod pipeline;
pub mod store;

pub use job::{AnalysisResult, ErrorInfo, Job, JobStatus, VideoMetrics};
pub use pipeline::{AnalysisPipeline, PipelineConfig};
pub use store::JobStore;
