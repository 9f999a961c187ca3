//! Geometry helpers shared by the metric and classification crates.
//!
//! Angles are computed with the law of cosines on normalized image
//! coordinates; degenerate inputs yield `None` rather than NaN.

use crate::Point;

/// Euclidean distance between two points
#[must_use]
pub fn distance(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Interior angle at `vertex` formed by the segments to `a` and `b`,
/// in degrees. Returns `None` when either adjacent segment has zero
/// length, where the angle is undefined.
#[must_use]
pub fn angle_at_vertex(a: Point, vertex: Point, b: Point) -> Option<f32> {
    let va = distance(vertex, a);
    let vb = distance(vertex, b);
    if va == 0.0 || vb == 0.0 {
        return None;
    }
    let ab = distance(a, b);
    // Law of cosines; clamp against floating-point drift before acos
    let cos = ((va * va + vb * vb - ab * ab) / (2.0 * va * vb)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Median of a slice. Empty input yields `None`; an even-length input
/// yields the mean of the two central sorted values.
#[must_use]
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
