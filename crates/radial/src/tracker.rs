use crate::geometry::Point;
use crate::layout::RadialLayout;
use derive_more::{Display, From, Into};
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
pub struct TouchId(u64);

impl TouchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw event from the input source. `point` is ignored for up and cancel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    pub id: TouchId,
    pub phase: TouchPhase,
    pub point: Point,
}

impl TouchInput {
    pub fn new(id: TouchId, phase: TouchPhase, point: Point) -> Self {
        Self { id, phase, point }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceEvent {
    Activate { touch: TouchId, slice: usize },
    Deactivate { touch: TouchId, slice: usize },
}

impl SliceEvent {
    pub fn touch(&self) -> TouchId {
        match *self {
            Self::Activate { touch, .. } | Self::Deactivate { touch, .. } => touch,
        }
    }

    pub fn slice(&self) -> usize {
        match *self {
            Self::Activate { slice, .. } | Self::Deactivate { slice, .. } => slice,
        }
    }

    pub fn is_activate(&self) -> bool {
        matches!(self, Self::Activate { .. })
    }
}

/// Events produced by a single tracker call, in emission order. Never more than two.
pub type Transitions = SmallVec<[SliceEvent; 2]>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Unknown touch {0}")]
    UnknownTouch(TouchId),
    #[error("Touch {0} is already down")]
    AlreadyActive(TouchId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchState {
    OnSlice(usize),
    OffRing,
}

impl TouchState {
    fn from_slice(slice: Option<usize>) -> Self {
        slice.map_or(Self::OffRing, Self::OnSlice)
    }

    pub fn slice(&self) -> Option<usize> {
        match *self {
            Self::OnSlice(i) => Some(i),
            Self::OffRing => None,
        }
    }
}

/// Turns per-touch position streams into paired slice activations.
///
/// Each touch id has its own record from down until up/cancel. Every `Activate`
/// a touch produces is followed by exactly one `Deactivate` for the same slice
/// before that touch activates anything else or disappears.
#[derive(Debug)]
pub struct TouchTracker {
    layout: RadialLayout,
    touches: HashMap<TouchId, TouchState>,
}

impl TouchTracker {
    pub fn new(layout: RadialLayout) -> Self {
        Self {
            layout,
            touches: HashMap::new(),
        }
    }

    pub fn layout(&self) -> &RadialLayout {
        &self.layout
    }

    pub fn state(&self, id: TouchId) -> Option<TouchState> {
        self.touches.get(&id).copied()
    }

    pub fn current_slice(&self, id: TouchId) -> Option<usize> {
        self.state(id).and_then(|s| s.slice())
    }

    pub fn active_touches(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn handle(&mut self, input: TouchInput) -> Result<Transitions, TrackerError> {
        match input.phase {
            TouchPhase::Down => self.touch_down(input.id, input.point),
            TouchPhase::Move => self.touch_move(input.id, input.point),
            TouchPhase::Up => self.touch_up(input.id),
            TouchPhase::Cancel => self.touch_cancel(input.id),
        }
    }

    pub fn touch_down(&mut self, id: TouchId, point: Point) -> Result<Transitions, TrackerError> {
        if self.touches.contains_key(&id) {
            return Err(TrackerError::AlreadyActive(id));
        }

        let slice = self.locate(point);
        self.touches.insert(id, TouchState::from_slice(slice));
        log::trace!("touch {id} down on {slice:?}");

        Ok(slice
            .map(|slice| smallvec![SliceEvent::Activate { touch: id, slice }])
            .unwrap_or_default())
    }

    pub fn touch_move(&mut self, id: TouchId, point: Point) -> Result<Transitions, TrackerError> {
        let next = self.locate(point);
        let state = self
            .touches
            .get_mut(&id)
            .ok_or(TrackerError::UnknownTouch(id))?;

        let previous = state.slice();
        if previous == next {
            return Ok(Transitions::new());
        }

        *state = TouchState::from_slice(next);
        log::trace!("touch {id} moved {previous:?} -> {next:?}");

        let mut events = Transitions::new();
        if let Some(slice) = previous {
            events.push(SliceEvent::Deactivate { touch: id, slice });
        }
        if let Some(slice) = next {
            events.push(SliceEvent::Activate { touch: id, slice });
        }
        Ok(events)
    }

    pub fn touch_up(&mut self, id: TouchId) -> Result<Transitions, TrackerError> {
        self.release(id)
    }

    pub fn touch_cancel(&mut self, id: TouchId) -> Result<Transitions, TrackerError> {
        log::debug!("touch {id} cancelled");
        self.release(id)
    }

    /// Cancels every touch, lowest id first.
    pub fn cancel_all(&mut self) -> Vec<SliceEvent> {
        let mut ids: Vec<TouchId> = self.touches.keys().copied().collect();
        ids.sort_unstable();

        ids.into_iter()
            .filter_map(|id| self.release(id).ok())
            .flatten()
            .collect()
    }

    fn release(&mut self, id: TouchId) -> Result<Transitions, TrackerError> {
        let state = self
            .touches
            .remove(&id)
            .ok_or(TrackerError::UnknownTouch(id))?;
        log::trace!("touch {id} released from {state:?}");

        Ok(state
            .slice()
            .map(|slice| smallvec![SliceEvent::Deactivate { touch: id, slice }])
            .unwrap_or_default())
    }

    fn locate(&self, point: Point) -> Option<usize> {
        self.layout.locate(point).map(|m| m.slice_index)
    }
}
