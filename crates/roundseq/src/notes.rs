use derive_more::{Deref, Display, Into};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

pub const MIN_OCTAVE: u8 = 0;
pub const MAX_OCTAVE: u8 = 8;
pub const DEFAULT_OCTAVE: u8 = 4;
pub const SEMITONES: usize = 12;
pub const MAX_MIDI_NOTE: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum NoteName {
    C,
    #[strum(to_string = "C#", serialize = "Db")]
    CSharp,
    D,
    #[strum(to_string = "D#", serialize = "Eb")]
    DSharp,
    E,
    F,
    #[strum(to_string = "F#", serialize = "Gb")]
    FSharp,
    G,
    #[strum(to_string = "G#", serialize = "Ab")]
    GSharp,
    A,
    #[strum(to_string = "A#", serialize = "Bb")]
    ASharp,
    B,
}

const CHROMATIC: [NoteName; SEMITONES] = [
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
];

impl NoteName {
    pub fn from_midi(note: u8) -> Self {
        CHROMATIC[note as usize % SEMITONES]
    }
}

/// Scientific pitch label, e.g. `60 -> "C4"`, `0 -> "C-1"`.
pub fn note_label(note: u8) -> String {
    let octave = i16::from(note) / SEMITONES as i16 - 1;
    format!("{}{}", NoteName::from_midi(note), octave)
}

/// Octave of the dial's root note, always within `MIN_OCTAVE..=MAX_OCTAVE`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Deref, Into, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct Octave(u8);

impl Octave {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(MIN_OCTAVE, MAX_OCTAVE))
    }

    pub fn shifted(self, delta: i8) -> Self {
        let value = (i16::from(self.0) + i16::from(delta)).clamp(0, i16::from(MAX_OCTAVE));
        Self::new(value as u8)
    }

    pub fn up(self) -> Self {
        self.shifted(1)
    }

    pub fn down(self) -> Self {
        self.shifted(-1)
    }
}

impl Default for Octave {
    fn default() -> Self {
        Self(DEFAULT_OCTAVE)
    }
}

impl From<u8> for Octave {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Direction in which pitch rises from slice to slice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, DeserializeFromStr, EnumString, StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum Winding {
    #[default]
    #[strum(to_string = "counterclockwise", serialize = "ccw")]
    CounterClockwise,
    #[strum(to_string = "clockwise", serialize = "cw")]
    Clockwise,
}

/// Maps slice indices onto semitones above the octave's C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMap {
    pub slice_count: usize,
    pub winding: Winding,
    /// Slice that plays the octave's root.
    pub root_slice: usize,
}

impl NoteMap {
    pub fn new(slice_count: usize, winding: Winding, root_slice: usize) -> Self {
        Self {
            slice_count: slice_count.max(1),
            winding,
            root_slice: root_slice % slice_count.max(1),
        }
    }

    pub fn semitone(&self, slice: usize) -> usize {
        let n = self.slice_count;
        let slice = slice % n;
        match self.winding {
            Winding::CounterClockwise => (slice + n - self.root_slice) % n,
            Winding::Clockwise => (self.root_slice + n - slice) % n,
        }
    }

    /// `None` when the note would fall above the MIDI range.
    pub fn midi_note(&self, slice: usize, octave: Octave) -> Option<u8> {
        let note = (usize::from(*octave) + 1) * SEMITONES + self.semitone(slice);
        u8::try_from(note).ok().filter(|&n| n <= MAX_MIDI_NOTE)
    }
}
