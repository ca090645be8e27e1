use crate::geometry::{
    ANGLE_EPSILON, Point, angle_contains, angle_span, cartesian_to_polar, normalize_angle,
    relative_angle, sector_outline,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Slice count must be at least 1")]
    NoSlices,
    #[error("Inner radius must be non-negative, got {0}")]
    NegativeInnerRadius(f64),
    #[error("Inner radius {inner} must be smaller than outer radius {outer}")]
    InvertedRing { inner: f64, outer: f64 },
    #[error("Layout value `{0}` is not a finite number")]
    NonFinite(&'static str),
    #[error("Start angle of slice {0} does not advance around the circle")]
    UnorderedSlices(usize),
}

/// The annulus slices live in. Both edges are part of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingSpec {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl RingSpec {
    pub fn new(inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
        }
    }

    pub fn width(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    pub fn contains(&self, distance: f64) -> bool {
        self.inner_radius <= distance && distance <= self.outer_radius
    }

    /// Maps a distance inside the ring onto `[0, 1]`, inner edge to outer edge.
    pub fn normalize(&self, distance: f64) -> f64 {
        ((distance - self.inner_radius) / self.width()).clamp(0.0, 1.0)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if !self.inner_radius.is_finite() {
            return Err(LayoutError::NonFinite("inner_radius"));
        }
        if !self.outer_radius.is_finite() {
            return Err(LayoutError::NonFinite("outer_radius"));
        }
        if self.inner_radius < 0.0 {
            return Err(LayoutError::NegativeInnerRadius(self.inner_radius));
        }
        if self.inner_radius >= self.outer_radius {
            return Err(LayoutError::InvertedRing {
                inner: self.inner_radius,
                outer: self.outer_radius,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Slice {
    /// Agrees with [`RadialLayout::slice_at_angle`], including at boundaries.
    pub fn contains(&self, angle: f64) -> bool {
        angle_contains(angle, self.start_angle, self.end_angle)
    }

    pub fn span(&self) -> f64 {
        match angle_span(self.start_angle, self.end_angle) {
            s if s == 0.0 => TAU,
            s => s,
        }
    }

    pub fn mid_angle(&self) -> f64 {
        normalize_angle(self.start_angle + self.span() / 2.0)
    }

    pub fn outline(&self, center: Point, ring: &RingSpec, segments: Option<usize>) -> Vec<Point> {
        sector_outline(
            center,
            ring.inner_radius,
            ring.outer_radius,
            self.start_angle,
            self.end_angle,
            segments,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceMatch {
    pub slice_index: usize,
    /// 0.0 at the inner edge, 1.0 at the outer edge.
    pub normalized_radius: f64,
}

/// Partition of an annulus into angular slices.
///
/// Slice `i` ends exactly where slice `i + 1` starts (the same stored value), the
/// last slice ending where slice 0 starts, so the slices cover the circle once.
#[derive(Debug, Clone)]
pub struct RadialLayout {
    center: Point,
    ring: RingSpec,
    slices: Vec<Slice>,
    /// Start angle of slice 0; every lookup is measured from here.
    origin: f64,
    /// Counter-clockwise distance from `origin` to each slice start, strictly
    /// increasing, first entry zero.
    offsets: Vec<f64>,
}

impl RadialLayout {
    pub fn new(
        center: Point,
        ring: RingSpec,
        slice_count: usize,
        angular_offset: f64,
    ) -> Result<Self, LayoutError> {
        Self::validate_base(center, &ring)?;
        if slice_count == 0 {
            return Err(LayoutError::NoSlices);
        }
        if !angular_offset.is_finite() {
            return Err(LayoutError::NonFinite("angular_offset"));
        }

        let step = TAU / slice_count as f64;
        let offsets = (0..slice_count).map(|i| i as f64 * step).collect();
        Ok(Self::build(
            center,
            ring,
            normalize_angle(angular_offset),
            offsets,
        ))
    }

    /// Explicit slices: `starts[i]` is where slice `i` begins, and the starts must
    /// advance counter-clockwise from `starts[0]` without completing a full turn.
    pub fn from_start_angles(
        center: Point,
        ring: RingSpec,
        starts: &[f64],
    ) -> Result<Self, LayoutError> {
        Self::validate_base(center, &ring)?;
        let (&first, _) = starts.split_first().ok_or(LayoutError::NoSlices)?;
        if starts.iter().any(|a| !a.is_finite()) {
            return Err(LayoutError::NonFinite("start_angle"));
        }

        let origin = normalize_angle(first);
        let offsets: Vec<f64> = starts
            .iter()
            .map(|&a| normalize_angle(a - origin))
            .collect();

        for (i, pair) in offsets.windows(2).enumerate() {
            if pair[1] - pair[0] <= ANGLE_EPSILON {
                return Err(LayoutError::UnorderedSlices(i + 1));
            }
        }
        if let Some(&last) = offsets.last()
            && offsets.len() > 1
            && TAU - last <= ANGLE_EPSILON
        {
            return Err(LayoutError::UnorderedSlices(offsets.len() - 1));
        }

        Ok(Self::build(center, ring, origin, offsets))
    }

    fn validate_base(center: Point, ring: &RingSpec) -> Result<(), LayoutError> {
        if !center.is_finite() {
            return Err(LayoutError::NonFinite("center"));
        }
        ring.validate()
    }

    fn build(center: Point, ring: RingSpec, origin: f64, offsets: Vec<f64>) -> Self {
        let starts: Vec<f64> = offsets
            .iter()
            .map(|&o| normalize_angle(origin + o))
            .collect();
        let slices = (0..starts.len())
            .map(|index| Slice {
                index,
                start_angle: starts[index],
                end_angle: starts[(index + 1) % starts.len()],
            })
            .collect();

        Self {
            center,
            ring,
            slices,
            origin,
            offsets,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn ring(&self) -> &RingSpec {
        &self.ring
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn slice(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// `None` strictly inside the inner radius or outside the outer one.
    pub fn locate(&self, point: Point) -> Option<SliceMatch> {
        let polar = cartesian_to_polar(self.center, point);
        if !self.ring.contains(polar.distance) {
            return None;
        }

        Some(SliceMatch {
            slice_index: self.slice_at_angle(polar.angle),
            normalized_radius: self.ring.normalize(polar.distance),
        })
    }

    /// Index of the slice owning `angle`. An angle within [`ANGLE_EPSILON`] below
    /// a slice start counts as that start, so boundaries go to the slice that
    /// begins there.
    pub fn slice_at_angle(&self, angle: f64) -> usize {
        let relative = relative_angle(angle, self.origin);
        self.offsets
            .partition_point(|&o| o <= relative + ANGLE_EPSILON)
            .saturating_sub(1)
    }
}
