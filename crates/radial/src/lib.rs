//! Radial hit-testing for circular touch surfaces.
//!
//! [`RadialLayout`] splits an annulus into angular slices and classifies points;
//! [`TouchTracker`] follows each touch across those slices and reports when it
//! enters or leaves one.

pub mod geometry;
pub mod layout;
pub mod tracker;

pub use geometry::Point;
pub use layout::{LayoutError, RadialLayout, RingSpec, Slice, SliceMatch};
pub use tracker::{
    SliceEvent, TouchId, TouchInput, TouchPhase, TouchState, TouchTracker, TrackerError,
    Transitions,
};
