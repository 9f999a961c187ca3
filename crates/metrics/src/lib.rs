//! Frame-wise form metrics and their aggregation
//!
//! Each landmark frame yields an independent set of optional signals:
//! knee flexion angles, elbow drop, and stance-width ratio. A signal is
//! absent whenever any landmark it needs is unresolved, so one missing
//! joint never poisons the others. Aggregation takes the median of each
//! signal over the frames where it resolved.

use athlete_common::geometry::{angle_at_vertex, distance, median};
use athlete_pose::{LandmarkFrame, LandmarkName};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-frame metric signals; each field is independently optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Left hip-knee-ankle angle in degrees
    pub knee_angle_left: Option<f32>,
    /// Right hip-knee-ankle angle in degrees
    pub knee_angle_right: Option<f32>,
    /// How far the elbow sits below the shoulder (normalized y units,
    /// positive = dropped); max over the two arms
    pub elbow_drop: Option<f32>,
    /// Ankle-to-ankle distance over hip-to-hip distance
    pub stance_width_ratio: Option<f32>,
}

impl MetricSample {
    /// Extract all signals from a landmark frame
    #[must_use]
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        Self {
            knee_angle_left: knee_angle(
                frame,
                LandmarkName::LeftHip,
                LandmarkName::LeftKnee,
                LandmarkName::LeftAnkle,
            ),
            knee_angle_right: knee_angle(
                frame,
                LandmarkName::RightHip,
                LandmarkName::RightKnee,
                LandmarkName::RightAnkle,
            ),
            elbow_drop: elbow_drop(frame),
            stance_width_ratio: stance_width_ratio(frame),
        }
    }

    /// Sample for a frame where no person was detected
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }
}

fn knee_angle(
    frame: &LandmarkFrame,
    hip: LandmarkName,
    knee: LandmarkName,
    ankle: LandmarkName,
) -> Option<f32> {
    let hip = frame.get(hip)?;
    let knee = frame.get(knee)?;
    let ankle = frame.get(ankle)?;
    angle_at_vertex(hip, knee, ankle)
}

/// Elbow drop per arm is `elbow.y - shoulder.y`; with both arms
/// resolved the larger drop wins, with one arm it is used alone
fn elbow_drop(frame: &LandmarkFrame) -> Option<f32> {
    let left = arm_drop(frame, LandmarkName::LeftShoulder, LandmarkName::LeftElbow);
    let right = arm_drop(frame, LandmarkName::RightShoulder, LandmarkName::RightElbow);
    match (left, right) {
        (Some(l), Some(r)) => Some(l.max(r)),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

fn arm_drop(frame: &LandmarkFrame, shoulder: LandmarkName, elbow: LandmarkName) -> Option<f32> {
    let shoulder = frame.get(shoulder)?;
    let elbow = frame.get(elbow)?;
    Some(elbow.y - shoulder.y)
}

/// Ankle-to-ankle distance over hip-to-hip distance; undefined when
/// the hips coincide
fn stance_width_ratio(frame: &LandmarkFrame) -> Option<f32> {
    let left_hip = frame.get(LandmarkName::LeftHip)?;
    let right_hip = frame.get(LandmarkName::RightHip)?;
    let left_ankle = frame.get(LandmarkName::LeftAnkle)?;
    let right_ankle = frame.get(LandmarkName::RightAnkle)?;

    let hip_width = distance(left_hip, right_hip);
    if hip_width == 0.0 {
        return None;
    }
    Some(distance(left_ankle, right_ankle) / hip_width)
}

/// Medians of each signal over the frames where it resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub knee_angle_left: Option<f32>,
    pub knee_angle_right: Option<f32>,
    pub elbow_drop: Option<f32>,
    pub stance_width_ratio: Option<f32>,
}

/// Accumulates per-frame samples and aggregates them on demand
#[derive(Debug, Default)]
pub struct MetricExtractor {
    samples: Vec<MetricSample>,
}

impl MetricExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample for the next frame; an absent landmark frame
    /// still occupies a slot so frame indices stay aligned
    pub fn push(&mut self, frame: Option<&LandmarkFrame>) {
        let sample = match frame {
            Some(f) => MetricSample::from_frame(f),
            None => MetricSample::absent(),
        };
        self.samples.push(sample);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Median of each signal across the accumulated samples. Frames
    /// where a signal was absent do not contribute to its median.
    #[must_use]
    pub fn aggregate(&self) -> AggregatedMetrics {
        debug!("Aggregating metrics over {} samples", self.samples.len());

        AggregatedMetrics {
            knee_angle_left: field_median(&self.samples, |s| s.knee_angle_left),
            knee_angle_right: field_median(&self.samples, |s| s.knee_angle_right),
            elbow_drop: field_median(&self.samples, |s| s.elbow_drop),
            stance_width_ratio: field_median(&self.samples, |s| s.stance_width_ratio),
        }
    }
}

fn field_median<F>(samples: &[MetricSample], field: F) -> Option<f32>
where
    F: Fn(&MetricSample) -> Option<f32>,
{
    let values: Vec<f32> = samples.iter().filter_map(field).collect();
    median(&values)
}
