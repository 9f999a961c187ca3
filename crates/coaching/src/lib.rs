//! Rule-based coaching recommendations
//!
//! Three independent outputs: form tips driven by aggregated metrics,
//! focus tips looked up from a static per-sport catalog, and a generic
//! per-sport coaching plan (summary plus drills).

use athlete_common::SportLabel;
use athlete_metrics::AggregatedMetrics;
use serde::{Deserialize, Serialize};

/// Knee angles above this read as standing too straight
const STRAIGHT_KNEE_DEG: f32 = 170.0;
/// Elbow drop above this reads as a collapsed arm
const ELBOW_DROP_LIMIT: f32 = 0.10;
/// Stance ratios below this read as feet too close together
const NARROW_STANCE_RATIO: f32 = 0.70;
/// At most this many form tips per result
const MAX_FORM_TIPS: usize = 3;

/// Metric-driven form tips, evaluated in fixed order. A rule only
/// fires when every metric it reads resolved.
#[must_use]
pub fn form_tips(metrics: &AggregatedMetrics) -> Vec<String> {
    let mut tips = Vec::new();

    if let (Some(left), Some(right)) = (metrics.knee_angle_left, metrics.knee_angle_right) {
        if left > STRAIGHT_KNEE_DEG && right > STRAIGHT_KNEE_DEG {
            tips.push("Bend your knees more for better stability.".to_string());
        }
    }
    if let Some(drop) = metrics.elbow_drop {
        if drop > ELBOW_DROP_LIMIT {
            tips.push("Keep your elbow higher through the motion.".to_string());
        }
    }
    if let Some(ratio) = metrics.stance_width_ratio {
        if ratio < NARROW_STANCE_RATIO {
            tips.push("Widen your stance for a stronger base.".to_string());
        }
    }

    tips.truncate(MAX_FORM_TIPS);
    tips
}

/// A focus tip with its position in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTip {
    pub id: usize,
    pub text: String,
}

/// Catalog entries for tennis, keyed by focus area
fn tennis_focus_catalog(focus: &str) -> Option<&'static [&'static str]> {
    match focus {
        "swing" => Some(&[
            "Keep elbow high through contact to avoid power loss.",
            "Brush up on the ball for more topspin (wrist snap).",
            "Finish over the shoulder for consistent follow-through.",
        ]),
        "footwork" => Some(&[
            "Add a split step before opponent contact for quicker reactions.",
            "Shorten recovery steps and stay centered after the shot.",
            "Transfer weight to the front foot at contact for balance.",
        ]),
        "preparation" => Some(&[
            "Coil shoulders ~90° on takeback to load torque.",
            "Lower ready position to improve anticipation.",
            "Check grip (semi-western recommended for topspin).",
        ]),
        _ => None,
    }
}

/// Look up focus tips for a sport and focus area. Inputs are lowercased
/// and trimmed. A sport without a catalog yields one generic tip; an
/// unknown focus within a cataloged sport yields a placeholder naming
/// the focus. Both placeholders carry id 0.
#[must_use]
pub fn focus_tips(sport: &str, focus: &str, limit: usize) -> Vec<FocusTip> {
    let sport = sport.trim().to_lowercase();
    let focus = focus.trim().to_lowercase();

    let catalog = match sport.as_str() {
        "tennis" => tennis_focus_catalog(&focus),
        _ => {
            return vec![FocusTip {
                id: 0,
                text: "General tip: keep movements controlled and repeatable.".to_string(),
            }]
        }
    };

    match catalog {
        Some(tips) => tips
            .iter()
            .take(limit)
            .enumerate()
            .map(|(id, text)| FocusTip {
                id,
                text: (*text).to_string(),
            })
            .collect(),
        None => vec![FocusTip {
            id: 0,
            text: format!("No specific tips for '{focus}'. Try another focus."),
        }],
    }
}

/// Generic summary and drill list for a sport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingPlan {
    pub summary: String,
    pub drills: Vec<String>,
}

/// Per-sport coaching plan; running and unknown share the default
#[must_use]
pub fn coaching_plan(sport: SportLabel) -> CoachingPlan {
    match sport {
        SportLabel::Tennis => CoachingPlan {
            summary: "Focus on stance & shoulder rotation.".to_string(),
            drills: vec![
                "Shadow swings x20".to_string(),
                "Split-step timing 2x2min".to_string(),
                "Serve toss consistency 10x".to_string(),
            ],
        },
        SportLabel::Soccer => CoachingPlan {
            summary: "Improve stride rhythm and hip-knee alignment.".to_string(),
            drills: vec![
                "Cone dribbles 3x".to_string(),
                "Wall passes 50x".to_string(),
                "Sprint mechanics A-skips 2x20m".to_string(),
            ],
        },
        SportLabel::Running | SportLabel::Unknown => CoachingPlan {
            summary: "Keep a tall posture and steady cadence.".to_string(),
            drills: vec![
                "Cadence 170-180bpm for 5min".to_string(),
                "A/B skips 2x20m".to_string(),
                "Ankling 2x20m".to_string(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(
        knee_left: Option<f32>,
        knee_right: Option<f32>,
        elbow_drop: Option<f32>,
        stance: Option<f32>,
    ) -> AggregatedMetrics {
        AggregatedMetrics {
            knee_angle_left: knee_left,
            knee_angle_right: knee_right,
            elbow_drop,
            stance_width_ratio: stance,
        }
    }

    #[test]
    fn test_straight_knees_only() {
        let tips = form_tips(&metrics(Some(175.0), Some(178.0), Some(0.05), Some(0.9)));
        assert_eq!(tips, vec!["Bend your knees more for better stability."]);
    }

    #[test]
    fn test_elbow_and_stance_in_order() {
        let tips = form_tips(&metrics(Some(150.0), Some(150.0), Some(0.15), Some(0.5)));
        assert_eq!(
            tips,
            vec![
                "Keep your elbow higher through the motion.",
                "Widen your stance for a stronger base.",
            ]
        );
    }

    #[test]
    fn test_one_straight_knee_does_not_fire() {
        let tips = form_tips(&metrics(Some(175.0), Some(150.0), None, None));
        assert!(tips.is_empty());
    }

    #[test]
    fn test_unresolved_metrics_fire_nothing() {
        let tips = form_tips(&metrics(None, None, None, None));
        assert!(tips.is_empty());
    }

    #[test]
    fn test_all_rules_capped() {
        let tips = form_tips(&metrics(Some(175.0), Some(178.0), Some(0.2), Some(0.3)));
        assert_eq!(tips.len(), 3);
    }

    #[test]
    fn test_focus_tips_tennis_swing() {
        let tips = focus_tips("tennis", "swing", 3);
        assert_eq!(tips.len(), 3);
        assert_eq!(tips[0].id, 0);
        assert_eq!(
            tips[0].text,
            "Keep elbow high through contact to avoid power loss."
        );
        assert_eq!(tips[2].id, 2);
    }

    #[test]
    fn test_focus_tips_normalizes_input() {
        let tips = focus_tips(" Tennis ", " SWING ", 2);
        assert_eq!(tips.len(), 2);
    }

    #[test]
    fn test_focus_tips_unknown_sport() {
        let tips = focus_tips("curling", "swing", 3);
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].id, 0);
        assert_eq!(
            tips[0].text,
            "General tip: keep movements controlled and repeatable."
        );
    }

    #[test]
    fn test_focus_tips_unknown_focus() {
        let tips = focus_tips("tennis", "serve", 3);
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].text, "No specific tips for 'serve'. Try another focus.");
    }

    #[test]
    fn test_coaching_plan_tables() {
        assert_eq!(
            coaching_plan(SportLabel::Tennis).summary,
            "Focus on stance & shoulder rotation."
        );
        assert_eq!(
            coaching_plan(SportLabel::Soccer).drills[0],
            "Cone dribbles 3x"
        );
        assert_eq!(
            coaching_plan(SportLabel::Unknown).summary,
            coaching_plan(SportLabel::Running).summary
        );
    }
}
