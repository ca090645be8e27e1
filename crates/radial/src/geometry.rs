use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Tolerance used when classifying angles that should sit exactly on a boundary.
pub const ANGLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polar {
    pub distance: f64,
    /// Counter-clockwise from the positive x-axis, in `[0, 2π)`.
    pub angle: f64,
}

pub fn normalize_angle(radians: f64) -> f64 {
    let a = radians.rem_euclid(TAU);
    // rem_euclid can round a tiny negative input up to exactly 2π
    if a >= TAU { 0.0 } else { a }
}

/// Counter-clockwise sweep from `start` to `end`. Equal angles give zero, not 2π.
pub fn angle_span(start: f64, end: f64) -> f64 {
    normalize_angle(end - start)
}

/// Counter-clockwise sweep from `start` to `angle`, with angles that fall
/// within [`ANGLE_EPSILON`] below `start` snapped onto it.
pub fn relative_angle(angle: f64, start: f64) -> f64 {
    let relative = normalize_angle(angle - start);
    if TAU - relative <= ANGLE_EPSILON { 0.0 } else { relative }
}

/// Half-open containment `start <= angle < end`, wrapping through zero when
/// `end` is behind `start`. Boundaries are snapped the same way as
/// [`relative_angle`], so an angle just below `end` already belongs to the next
/// range. Equal `start` and `end` cover the whole circle.
pub fn angle_contains(angle: f64, start: f64, end: f64) -> bool {
    let span = match angle_span(start, end) {
        s if s == 0.0 => TAU,
        s => s,
    };
    relative_angle(angle, start) + ANGLE_EPSILON < span
}

pub fn polar_to_cartesian(center: Point, distance: f64, angle: f64) -> Point {
    Point::new(
        center.x + distance * angle.cos(),
        center.y + distance * angle.sin(),
    )
}

pub fn cartesian_to_polar(center: Point, point: Point) -> Polar {
    let (dx, dy) = (point.x - center.x, point.y - center.y);
    Polar {
        distance: dx.hypot(dy),
        angle: normalize_angle(dy.atan2(dx)),
    }
}

/// Points along an arc from `start` sweeping counter-clockwise to `end`.
///
/// With `segments == None` roughly one segment per 5 degrees is used, never
/// fewer than 8. A zero span is treated as a full circle.
pub fn arc_points(
    center: Point,
    radius: f64,
    start: f64,
    end: f64,
    segments: Option<usize>,
) -> Vec<Point> {
    let span = match angle_span(start, end) {
        s if s == 0.0 => TAU,
        s => s,
    };
    let segments = segments
        .unwrap_or_else(|| (span.to_degrees() / 5.0) as usize)
        .max(if segments.is_some() { 1 } else { 8 });

    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            polar_to_cartesian(center, radius, start + t * span)
        })
        .collect()
}

/// Closed outline of an annular sector: outer arc forward, then inner arc back.
pub fn sector_outline(
    center: Point,
    inner_radius: f64,
    outer_radius: f64,
    start: f64,
    end: f64,
    segments: Option<usize>,
) -> Vec<Point> {
    let mut points = arc_points(center, outer_radius, start, end, segments);
    points.extend(
        arc_points(center, inner_radius, start, end, segments)
            .into_iter()
            .rev(),
    );
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!(approx(normalize_angle(-FRAC_PI_2), 3.0 * FRAC_PI_2));
        assert!(approx(normalize_angle(TAU + 1.0), 1.0));
        assert!(approx(normalize_angle(-3.0 * TAU - PI), PI));
        assert_eq!(normalize_angle(TAU), 0.0);
        assert!(normalize_angle(-1e-20) < TAU);
    }

    #[test]
    fn test_angle_span_wraps() {
        let (a, b) = (345f64.to_radians(), 15f64.to_radians());
        assert!(approx(angle_span(a, b), 30f64.to_radians()));
        assert!(approx(angle_span(b, a), 330f64.to_radians()));
        assert_eq!(angle_span(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_angle_contains_is_half_open() {
        let (start, end) = (0.0, FRAC_PI_2);
        assert!(angle_contains(0.0, start, end));
        assert!(angle_contains(0.5, start, end));
        assert!(!angle_contains(FRAC_PI_2, start, end));
    }

    #[test]
    fn test_angle_contains_wraparound() {
        let (start, end) = (345f64.to_radians(), 15f64.to_radians());
        assert!(angle_contains(350f64.to_radians(), start, end));
        assert!(angle_contains(0.0, start, end));
        assert!(angle_contains(TAU, start, end));
        assert!(angle_contains(10f64.to_radians(), start, end));
        assert!(!angle_contains(344f64.to_radians(), start, end));
        assert!(!angle_contains(15f64.to_radians(), start, end));
    }

    #[test]
    fn test_angle_contains_snaps_to_start() {
        let (start, end) = (FRAC_PI_2, PI);
        assert!(angle_contains(start - 0.5 * ANGLE_EPSILON, start, end));
        assert!(angle_contains(start + 0.5 * ANGLE_EPSILON, start, end));
        assert!(!angle_contains(end - 0.5 * ANGLE_EPSILON, start, end));
        assert!(!angle_contains(start - 2.0 * ANGLE_EPSILON, start, end));
        assert!(angle_contains(1.0, 2.0, 2.0));
        assert_eq!(relative_angle(-0.5 * ANGLE_EPSILON, 0.0), 0.0);
    }

    #[test]
    fn test_polar_conversion() {
        let center = Point::new(100.0, 100.0);
        let p = polar_to_cartesian(center, 50.0, FRAC_PI_2);
        assert!(approx(p.x, 100.0) && approx(p.y, 150.0));

        let polar = cartesian_to_polar(center, Point::new(50.0, 100.0));
        assert!(approx(polar.distance, 50.0));
        assert!(approx(polar.angle, PI));

        let polar = cartesian_to_polar(center, Point::new(100.0, 50.0));
        assert!(approx(polar.angle, 3.0 * FRAC_PI_2));

        assert_eq!(cartesian_to_polar(center, center).distance, 0.0);
    }

    #[test]
    fn test_sector_outline_order() {
        let c = Point::new(100.0, 100.0);
        let pts = sector_outline(c, 30.0, 50.0, 0.0, FRAC_PI_2, Some(2));
        assert_eq!(pts.len(), 6);
        assert!(approx(pts[0].x, 150.0));
        assert!(approx(pts[2].y, 150.0));
        assert!(approx(pts[3].y, 130.0));
        assert!(approx(pts[5].x, 130.0));
    }

    #[test]
    fn test_arc_points_auto_segments() {
        let pts = arc_points(Point::default(), 10.0, 0.0, 92f64.to_radians(), None);
        assert_eq!(pts.len(), 19);
        let pts = arc_points(Point::default(), 10.0, 0.0, 0.1, None);
        assert_eq!(pts.len(), 9);
    }
}
