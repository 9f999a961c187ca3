//! Heuristic sport classification
//!
//! Two signals, used in strict precedence order: an explicit caller
//! hint always wins; a landmark series feeds the swing-motion
//! heuristic; only a clip with no detected person at all falls back to
//! the frame-shape heuristic.

use athlete_common::geometry::{angle_at_vertex, distance};
use athlete_common::SportLabel;
use athlete_pose::{LandmarkFrame, LandmarkName};
use tracing::debug;

/// Minimum normalized shoulder-elbow length for the arm to count as
/// tracked rather than noise
const MIN_ARM_LENGTH: f32 = 0.20;
/// Minimum horizontal shoulder-to-elbow offset for a swing posture
const MIN_ARM_SWEEP_X: f32 = 0.15;
/// Elbow angle window (exclusive) for a mid-swing arm
const SWING_ANGLE_MIN: f32 = 60.0;
const SWING_ANGLE_MAX: f32 = 120.0;
/// Swing-frame floor below which the verdict stays unknown
const MIN_SWING_HITS: usize = 6;

/// Portrait clips read as running footage, very wide ones as pitch-side
/// soccer footage, everything in between as tennis
#[must_use]
pub fn classify_by_shape(width: u32, height: u32) -> SportLabel {
    let aspect = f64::from(width) / f64::from(height.max(1));
    let label = if aspect < 0.8 {
        SportLabel::Running
    } else if aspect > 1.6 {
        SportLabel::Soccer
    } else {
        SportLabel::Tennis
    };
    debug!("Shape heuristic: aspect {:.2} -> {}", aspect, label.as_str());
    label
}

/// Counts frames whose left arm is held in a racket-swing posture.
/// A frame is evaluated when shoulder, elbow, and wrist all resolved;
/// it is a hit when the arm is long enough, swept sideways, and bent
/// into the swing-angle window. Enough hits relative to the evaluated
/// frames reads as tennis; otherwise the verdict is unknown.
#[must_use]
pub fn classify_by_motion(series: &[Option<LandmarkFrame>]) -> SportLabel {
    let mut evaluated = 0usize;
    let mut hits = 0usize;

    for frame in series.iter().flatten() {
        let (Some(shoulder), Some(elbow), Some(wrist)) = (
            frame.get(LandmarkName::LeftShoulder),
            frame.get(LandmarkName::LeftElbow),
            frame.get(LandmarkName::LeftWrist),
        ) else {
            continue;
        };
        evaluated += 1;

        if distance(shoulder, elbow) <= MIN_ARM_LENGTH {
            continue;
        }
        if (elbow.x - shoulder.x).abs() <= MIN_ARM_SWEEP_X {
            continue;
        }
        let Some(angle) = angle_at_vertex(shoulder, elbow, wrist) else {
            continue;
        };
        if angle > SWING_ANGLE_MIN && angle < SWING_ANGLE_MAX {
            hits += 1;
        }
    }

    let threshold = MIN_SWING_HITS.max(evaluated / 5);
    let label = if hits >= threshold {
        SportLabel::Tennis
    } else {
        SportLabel::Unknown
    };

    debug!(
        "Motion heuristic: {} hits / {} evaluated (threshold {}) -> {}",
        hits,
        evaluated,
        threshold,
        label.as_str()
    );
    label
}

/// Resolve the final label: explicit hint, then motion over the
/// landmark series, then frame shape when no person was ever detected
#[must_use]
pub fn resolve_sport(
    hint: Option<SportLabel>,
    series: &[Option<LandmarkFrame>],
    width: u32,
    height: u32,
) -> SportLabel {
    if let Some(hint) = hint {
        return hint;
    }
    if series.iter().any(Option::is_some) {
        return classify_by_motion(series);
    }
    classify_by_shape(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use athlete_common::Point;

    fn swing_frame() -> LandmarkFrame {
        let mut frame = LandmarkFrame::empty();
        // Arm length 0.25, horizontal sweep 0.25, elbow angle 90 degrees
        frame.set(LandmarkName::LeftShoulder, Point::new(0.30, 0.30));
        frame.set(LandmarkName::LeftElbow, Point::new(0.55, 0.30));
        frame.set(LandmarkName::LeftWrist, Point::new(0.55, 0.55));
        frame
    }

    fn idle_frame() -> LandmarkFrame {
        let mut frame = LandmarkFrame::empty();
        // Arm hanging straight down: no horizontal sweep
        frame.set(LandmarkName::LeftShoulder, Point::new(0.30, 0.30));
        frame.set(LandmarkName::LeftElbow, Point::new(0.30, 0.55));
        frame.set(LandmarkName::LeftWrist, Point::new(0.30, 0.75));
        frame
    }

    #[test]
    fn test_shape_thresholds() {
        assert_eq!(classify_by_shape(400, 800), SportLabel::Running);
        assert_eq!(classify_by_shape(1600, 800), SportLabel::Soccer);
        assert_eq!(classify_by_shape(800, 800), SportLabel::Tennis);
    }

    #[test]
    fn test_motion_enough_swings_is_tennis() {
        let series: Vec<_> = (0..10).map(|_| Some(swing_frame())).collect();
        assert_eq!(classify_by_motion(&series), SportLabel::Tennis);
    }

    #[test]
    fn test_motion_below_floor_is_unknown() {
        // 5 swing frames sit below the fixed floor of 6
        let series: Vec<_> = (0..5).map(|_| Some(swing_frame())).collect();
        assert_eq!(classify_by_motion(&series), SportLabel::Unknown);
    }

    #[test]
    fn test_motion_threshold_scales_with_evaluated() {
        // 100 evaluated frames raise the threshold to 20; 10 hits fail
        let mut series: Vec<_> = (0..90).map(|_| Some(idle_frame())).collect();
        series.extend((0..10).map(|_| Some(swing_frame())));
        assert_eq!(classify_by_motion(&series), SportLabel::Unknown);

        // 25 hits clear it
        let mut series: Vec<_> = (0..75).map(|_| Some(idle_frame())).collect();
        series.extend((0..25).map(|_| Some(swing_frame())));
        assert_eq!(classify_by_motion(&series), SportLabel::Tennis);
    }

    #[test]
    fn test_motion_ignores_absent_frames() {
        let mut series: Vec<Option<LandmarkFrame>> = vec![None; 50];
        series.extend((0..6).map(|_| Some(swing_frame())));
        // Absent frames are not evaluated, so the floor stays at 6
        assert_eq!(classify_by_motion(&series), SportLabel::Tennis);
    }

    #[test]
    fn test_resolve_hint_wins() {
        let series: Vec<_> = (0..10).map(|_| Some(swing_frame())).collect();
        assert_eq!(
            resolve_sport(Some(SportLabel::Soccer), &series, 800, 800),
            SportLabel::Soccer
        );
    }

    #[test]
    fn test_resolve_motion_verdict_stands() {
        // Landmarks exist but never swing: the unknown verdict is kept
        // rather than falling through to the shape heuristic
        let series: Vec<_> = (0..10).map(|_| Some(idle_frame())).collect();
        assert_eq!(resolve_sport(None, &series, 400, 800), SportLabel::Unknown);
    }

    #[test]
    fn test_resolve_shape_fallback() {
        let series: Vec<Option<LandmarkFrame>> = vec![None; 10];
        assert_eq!(resolve_sport(None, &series, 400, 800), SportLabel::Running);
        assert_eq!(resolve_sport(None, &[], 1600, 800), SportLabel::Soccer);
    }
}
