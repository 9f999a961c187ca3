//! Landmark overlay drawing
//!
//! Draws keypoint markers and a skeleton onto an RGB frame in place.
//! Landmark coordinates are normalized, so drawing scales with the
//! frame resolution.

use crate::{LandmarkFrame, LandmarkName};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BONE_COLOR: Rgb<u8> = Rgb([255, 160, 0]);

/// COCO skeleton edges drawn between resolved landmarks
const SKELETON: [(LandmarkName, LandmarkName); 12] = [
    (LandmarkName::LeftShoulder, LandmarkName::RightShoulder),
    (LandmarkName::LeftShoulder, LandmarkName::LeftElbow),
    (LandmarkName::LeftElbow, LandmarkName::LeftWrist),
    (LandmarkName::RightShoulder, LandmarkName::RightElbow),
    (LandmarkName::RightElbow, LandmarkName::RightWrist),
    (LandmarkName::LeftShoulder, LandmarkName::LeftHip),
    (LandmarkName::RightShoulder, LandmarkName::RightHip),
    (LandmarkName::LeftHip, LandmarkName::RightHip),
    (LandmarkName::LeftHip, LandmarkName::LeftKnee),
    (LandmarkName::LeftKnee, LandmarkName::LeftAnkle),
    (LandmarkName::RightHip, LandmarkName::RightKnee),
    (LandmarkName::RightKnee, LandmarkName::RightAnkle),
];

/// Draw markers and skeleton bones for every resolved landmark.
/// Edges with an unresolved endpoint are skipped.
pub fn draw_landmarks(image: &mut RgbImage, frame: &LandmarkFrame) {
    let w = image.width() as f32;
    let h = image.height() as f32;
    // Marker radius tracks the short side so overlays look consistent
    // across resolutions
    let radius = ((w.min(h) / 160.0).round() as i32).max(2);

    for (a, b) in SKELETON {
        if let (Some(pa), Some(pb)) = (frame.get(a), frame.get(b)) {
            draw_line_segment_mut(
                image,
                (pa.x * w, pa.y * h),
                (pb.x * w, pb.y * h),
                BONE_COLOR,
            );
        }
    }

    for (_, point) in frame.iter_resolved() {
        let cx = (point.x * w).round() as i32;
        let cy = (point.y * h).round() as i32;
        draw_filled_circle_mut(image, (cx, cy), radius, MARKER_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athlete_common::Point;

    #[test]
    fn test_draw_marks_pixels() {
        let mut image = RgbImage::new(64, 64);
        let mut frame = LandmarkFrame::empty();
        frame.set(LandmarkName::Nose, Point::new(0.5, 0.5));

        draw_landmarks(&mut image, &frame);
        assert_eq!(*image.get_pixel(32, 32), MARKER_COLOR);
    }

    #[test]
    fn test_empty_frame_leaves_image_untouched() {
        let mut image = RgbImage::new(32, 32);
        let before = image.clone();
        draw_landmarks(&mut image, &LandmarkFrame::empty());
        assert_eq!(image, before);
    }

    #[test]
    fn test_bone_drawn_between_resolved_pair() {
        let mut image = RgbImage::new(100, 100);
        let mut frame = LandmarkFrame::empty();
        frame.set(LandmarkName::LeftHip, Point::new(0.2, 0.5));
        frame.set(LandmarkName::LeftKnee, Point::new(0.8, 0.5));

        draw_landmarks(&mut image, &frame);
        // Midpoint of the bone sits between the two markers
        assert_eq!(*image.get_pixel(50, 50), BONE_COLOR);
    }
}
