//! Body landmark detection using YOLOv8-Pose via ONNX Runtime
//!
//! Detects the 17 COCO keypoints (nose, eyes, ears, shoulders, elbows,
//! wrists, hips, knees, ankles) of the most prominent person in a frame.
//! Coordinates are normalized to [0, 1] so downstream metrics are
//! resolution-independent.

pub mod overlay;

use athlete_common::Point;
use image::RgbImage;
use ndarray::Array;
use ort::{
    session::{Session, SessionOutputs},
    value::TensorRef,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// Number of COCO keypoints per person
pub const LANDMARK_COUNT: usize = 17;

/// COCO keypoint names (17 keypoints)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandmarkName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl LandmarkName {
    /// Get landmark name from index (0-16)
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LandmarkName::Nose),
            1 => Some(LandmarkName::LeftEye),
            2 => Some(LandmarkName::RightEye),
            3 => Some(LandmarkName::LeftEar),
            4 => Some(LandmarkName::RightEar),
            5 => Some(LandmarkName::LeftShoulder),
            6 => Some(LandmarkName::RightShoulder),
            7 => Some(LandmarkName::LeftElbow),
            8 => Some(LandmarkName::RightElbow),
            9 => Some(LandmarkName::LeftWrist),
            10 => Some(LandmarkName::RightWrist),
            11 => Some(LandmarkName::LeftHip),
            12 => Some(LandmarkName::RightHip),
            13 => Some(LandmarkName::LeftKnee),
            14 => Some(LandmarkName::RightKnee),
            15 => Some(LandmarkName::LeftAnkle),
            16 => Some(LandmarkName::RightAnkle),
            _ => None,
        }
    }

    /// Fixed slot index (0-16)
    #[must_use]
    pub fn index(&self) -> usize {
        *self as usize
    }

}

/// Landmarks resolved for a single frame. Each of the 17 slots is
/// independently optional; a landmark below the visibility threshold is
/// simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    points: [Option<Point>; LANDMARK_COUNT],
}

impl LandmarkFrame {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            points: [None; LANDMARK_COUNT],
        }
    }

    #[must_use]
    pub fn get(&self, name: LandmarkName) -> Option<Point> {
        self.points[name.index()]
    }

    pub fn set(&mut self, name: LandmarkName, point: Point) {
        self.points[name.index()] = Some(point);
    }

    /// Number of resolved landmarks in this frame
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Iterate over resolved landmarks with their names
    pub fn iter_resolved(&self) -> impl Iterator<Item = (LandmarkName, Point)> + '_ {
        self.points.iter().enumerate().filter_map(|(i, p)| {
            let name = LandmarkName::from_index(i)?;
            Some((name, (*p)?))
        })
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::empty()
    }
}

/// Error types for landmark detection
#[derive(Debug, Error)]
pub enum PoseError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}

/// Detector seam: frame in, optional landmark set out.
///
/// Returns `Ok(None)` when no person clears the confidence threshold;
/// `Err` is reserved for inference failures.
pub trait LandmarkDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkFrame>, PoseError>;
}

/// Configuration for the ONNX landmark detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum confidence threshold for person detection (0.0-1.0)
    pub confidence_threshold: f32,
    /// Minimum confidence threshold for landmark visibility (0.0-1.0)
    pub landmark_threshold: f32,
    /// Input image size (YOLOv8-Pose default is 640x640)
    pub input_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            landmark_threshold: 0.5,
            input_size: 640,
        }
    }
}

/// Landmark detector backed by a YOLOv8-Pose ONNX model.
///
/// The analysis target is a single athlete, so instead of NMS over all
/// candidate boxes the anchor with the highest objectness wins.
pub struct OnnxLandmarkDetector {
    session: Mutex<Session>,
    config: DetectorConfig,
}

impl OnnxLandmarkDetector {
    /// Load the ONNX model at the given path
    pub fn new<P: AsRef<Path>>(model_path: P, config: DetectorConfig) -> Result<Self, PoseError> {
        info!("Loading YOLOv8-Pose model from {:?}", model_path.as_ref());

        let session = Session::builder()
            .map_err(|e| PoseError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| PoseError::ModelLoad(e.to_string()))?;

        info!("YOLOv8-Pose model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    /// Preprocess image to YOLOv8-Pose input format (1, 3, H, W) normalized to [0, 1]
    fn preprocess(
        image: &RgbImage,
        config: &DetectorConfig,
    ) -> Array<f32, ndarray::Dim<[usize; 4]>> {
        let input_size = config.input_size;

        let resized = image::imageops::resize(
            image,
            input_size,
            input_size,
            image::imageops::FilterType::Triangle,
        );

        let mut input_array = Array::zeros((1, 3, input_size as usize, input_size as usize));

        for y in 0..input_size as usize {
            for x in 0..input_size as usize {
                let pixel = resized.get_pixel(x as u32, y as u32);
                input_array[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
                input_array[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
                input_array[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
            }
        }

        input_array
    }

    /// Pick the best anchor and turn its keypoint block into a frame
    fn postprocess(
        outputs: SessionOutputs,
        config: &DetectorConfig,
    ) -> Result<Option<LandmarkFrame>, PoseError> {
        // YOLOv8-Pose output shape: (1, 56, 8400) = (batch, features, anchors)
        // Features: 4 box coords (xywh) + 1 objectness + 51 keypoint data
        // (17 keypoints * 3: x, y, visibility)
        let output = &outputs[0];

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PoseError::Inference(format!("Failed to extract tensor: {e}")))?;

        debug!("ONNX output shape: {:?}", shape);

        let dims = shape.as_ref();
        if dims.len() != 3 {
            return Err(PoseError::Inference(format!(
                "Expected 3D output tensor, got {}D",
                dims.len()
            )));
        }

        let num_features = dims[1] as usize;
        let num_anchors = dims[2] as usize;

        if num_features != 56 {
            return Err(PoseError::Inference(format!(
                "Expected 56 features, got {num_features}"
            )));
        }

        // Data layout: [batch, features, anchors]
        let get = |feature_idx: usize, anchor_idx: usize| data[feature_idx * num_anchors + anchor_idx];

        let mut best: Option<(usize, f32)> = None;
        for anchor_idx in 0..num_anchors {
            let confidence = get(4, anchor_idx);
            if confidence < config.confidence_threshold {
                continue;
            }
            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((anchor_idx, confidence));
            }
        }

        let Some((anchor_idx, confidence)) = best else {
            debug!("No person above confidence threshold");
            return Ok(None);
        };

        debug!("Best anchor {} with confidence {:.3}", anchor_idx, confidence);

        let mut frame = LandmarkFrame::empty();
        for kp_idx in 0..LANDMARK_COUNT {
            let base_feature = 5 + (kp_idx * 3);
            let kp_x = get(base_feature, anchor_idx);
            let kp_y = get(base_feature + 1, anchor_idx);
            let kp_conf = get(base_feature + 2, anchor_idx);

            if kp_conf >= config.landmark_threshold {
                if let Some(name) = LandmarkName::from_index(kp_idx) {
                    // Normalize and clamp; the model may output values
                    // slightly outside range due to floating point
                    let x_norm = (kp_x / config.input_size as f32).clamp(0.0, 1.0);
                    let y_norm = (kp_y / config.input_size as f32).clamp(0.0, 1.0);
                    frame.set(name, Point::new(x_norm, y_norm));
                }
            }
        }

        Ok(Some(frame))
    }
}

impl LandmarkDetector for OnnxLandmarkDetector {
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkFrame>, PoseError> {
        debug!(
            "Running landmark detection on {}x{} image",
            image.width(),
            image.height()
        );

        let input_array = Self::preprocess(image, &self.config);

        let mut session = self
            .session
            .lock()
            .map_err(|_| PoseError::Inference("detector session poisoned".to_string()))?;

        let input_tensor = TensorRef::from_array_view(input_array.view())
            .map_err(|e| PoseError::Inference(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PoseError::Inference(e.to_string()))?;

        let frame = Self::postprocess(outputs, &self.config)?;
        if let Some(frame) = &frame {
            debug!(
                "Resolved {} of {} landmarks",
                frame.resolved_count(),
                LANDMARK_COUNT
            );
        }
        Ok(frame)
    }
}
