use crate::config::Config;
use crate::midi::MidiService;
use crate::notes::{NoteMap, Octave, note_label};
use radial::{SliceEvent, TouchId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeldNote {
    slice: usize,
    key: u8,
}

/// Turns slice events into MIDI notes.
///
/// A touch keeps the note it started with even if the octave changes while it
/// is held. Touches landing on the same note share one note-on; the note-off is
/// sent when the last of them lets go.
pub struct NoteDispatcher {
    service: Box<dyn MidiService>,
    channel: u8,
    velocity: u8,
    note_map: NoteMap,
    octave: Octave,
    held: HashMap<TouchId, HeldNote>,
    sounding: HashMap<u8, usize>,
}

impl NoteDispatcher {
    pub fn new(service: Box<dyn MidiService>, config: &Config, slice_count: usize) -> Self {
        Self {
            service,
            channel: config.midi.channel,
            velocity: config.notes.velocity,
            note_map: config.notes.note_map(slice_count),
            octave: config.notes.octave,
            held: HashMap::new(),
            sounding: HashMap::new(),
        }
    }

    /// Takes new channel, velocity and mapping. Held notes keep their keys, so
    /// call this with nothing held to avoid switching channel mid-note.
    pub fn reconfigure(&mut self, config: &Config, slice_count: usize) {
        if !self.held.is_empty() {
            log::warn!("Reconfiguring with {} notes still held", self.held.len());
        }
        self.channel = config.midi.channel;
        self.velocity = config.notes.velocity;
        self.note_map = config.notes.note_map(slice_count);
    }

    pub fn dispatch(&mut self, event: SliceEvent) {
        match event {
            SliceEvent::Activate { touch, slice } => self.activate(touch, slice),
            SliceEvent::Deactivate { touch, slice } => self.deactivate(touch, slice),
        }
    }

    fn activate(&mut self, touch: TouchId, slice: usize) {
        let Some(key) = self.note_map.midi_note(slice, self.octave) else {
            log::warn!(
                "Slice {} in octave {} is above the MIDI range, ignoring",
                slice,
                self.octave
            );
            return;
        };

        if let Some(previous) = self.held.insert(touch, HeldNote { slice, key }) {
            log::warn!("Touch {} activated slice {} while holding {:?}", touch, slice, previous);
            self.release_key(previous.key);
        }

        let holders = self.sounding.entry(key).or_insert(0);
        *holders += 1;
        if *holders == 1 {
            if let Err(e) = self.service.note_on(self.channel, key, self.velocity) {
                log::error!("Failed to send note on for {}: {}", note_label(key), e);
            }
        }
    }

    fn deactivate(&mut self, touch: TouchId, slice: usize) {
        match self.held.remove(&touch) {
            Some(held) => {
                if held.slice != slice {
                    log::warn!(
                        "Touch {} left slice {} but was holding slice {}",
                        touch,
                        slice,
                        held.slice
                    );
                }
                self.release_key(held.key);
            }
            // activation was dropped as out of range
            None => log::debug!("Touch {} left slice {} with no note held", touch, slice),
        }
    }

    fn release_key(&mut self, key: u8) {
        let Some(holders) = self.sounding.get_mut(&key) else {
            return;
        };
        *holders -= 1;
        if *holders == 0 {
            self.sounding.remove(&key);
            self.send_off(key);
        }
    }

    fn send_off(&mut self, key: u8) {
        if let Err(e) = self.service.note_off(self.channel, key) {
            log::error!("Failed to send note off for {}: {}", note_label(key), e);
        }
    }

    /// Silences everything still sounding.
    pub fn release_all(&mut self) {
        let mut keys: Vec<u8> = self.sounding.drain().map(|(key, _)| key).collect();
        keys.sort_unstable();
        for key in keys {
            self.send_off(key);
        }
        self.held.clear();
    }

    pub fn octave(&self) -> Octave {
        self.octave
    }

    pub fn set_octave(&mut self, octave: Octave) {
        if octave != self.octave {
            log::info!("Octave {} -> {}", self.octave, octave);
            self.octave = octave;
        }
    }

    pub fn sounding_notes(&self) -> Vec<u8> {
        let mut keys: Vec<u8> = self.sounding.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn service_mut(&mut self) -> &mut dyn MidiService {
        self.service.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{MidiMessage, MockMidi, SentLog};

    fn dispatcher() -> (NoteDispatcher, SentLog) {
        let mock = MockMidi::new();
        let log = mock.sent_log();
        let config = Config::default();
        (NoteDispatcher::new(Box::new(mock), &config, 12), log)
    }

    fn on(key: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            channel: 0,
            key,
            velocity: 100,
        }
    }

    fn off(key: u8) -> MidiMessage {
        MidiMessage::NoteOff { channel: 0, key }
    }

    fn activate(touch: u64, slice: usize) -> SliceEvent {
        SliceEvent::Activate {
            touch: TouchId::new(touch),
            slice,
        }
    }

    fn deactivate(touch: u64, slice: usize) -> SliceEvent {
        SliceEvent::Deactivate {
            touch: TouchId::new(touch),
            slice,
        }
    }

    #[test]
    fn test_slide_sends_off_then_on() {
        let (mut d, log) = dispatcher();
        for ev in [
            activate(1, 0),
            deactivate(1, 0),
            activate(1, 3),
            deactivate(1, 3),
        ] {
            d.dispatch(ev);
        }
        assert_eq!(*log.lock(), vec![on(60), off(60), on(63), off(63)]);
        assert!(d.sounding_notes().is_empty());
    }

    #[test]
    fn test_shared_note_is_coalesced() {
        let (mut d, log) = dispatcher();
        d.dispatch(activate(1, 4));
        d.dispatch(activate(2, 4));
        assert_eq!(d.sounding_notes(), vec![64]);
        d.dispatch(deactivate(1, 4));
        assert_eq!(*log.lock(), vec![on(64)]);
        d.dispatch(deactivate(2, 4));
        assert_eq!(*log.lock(), vec![on(64), off(64)]);
    }

    #[test]
    fn test_octave_change_keeps_held_note() {
        let (mut d, log) = dispatcher();
        d.dispatch(activate(1, 0));
        d.set_octave(d.octave().up());
        assert_eq!(*d.octave(), 5);
        d.dispatch(deactivate(1, 0));
        d.dispatch(activate(1, 0));
        d.dispatch(deactivate(1, 0));
        assert_eq!(*log.lock(), vec![on(60), off(60), on(72), off(72)]);
    }

    #[test]
    fn test_release_all_silences_everything() {
        let (mut d, log) = dispatcher();
        d.dispatch(activate(1, 2));
        d.dispatch(activate(2, 9));
        assert_eq!(d.sounding_notes(), vec![62, 69]);
        d.release_all();
        assert_eq!(*log.lock(), vec![on(62), on(69), off(62), off(69)]);
        assert!(d.sounding_notes().is_empty());

        // late deactivations after a release are harmless
        d.dispatch(deactivate(1, 2));
        assert_eq!(log.lock().len(), 4);
    }

    #[test]
    fn test_out_of_range_notes_are_skipped() {
        let mock = MockMidi::new();
        let log = mock.sent_log();
        let mut config = Config::default();
        config.notes.octave = Octave::new(8);
        let mut d = NoteDispatcher::new(Box::new(mock), &config, 24);

        d.dispatch(activate(1, 23));
        d.dispatch(deactivate(1, 23));
        d.dispatch(activate(1, 19));
        d.dispatch(deactivate(1, 19));
        assert_eq!(*log.lock(), vec![on(127), off(127)]);
    }

    #[test]
    fn test_reconfigure_changes_channel_and_velocity() {
        let (mut d, log) = dispatcher();
        let mut config = Config::default();
        config.midi.channel = 9;
        config.notes.velocity = 64;
        d.reconfigure(&config, 12);

        d.dispatch(activate(1, 0));
        d.dispatch(deactivate(1, 0));
        assert_eq!(
            *log.lock(),
            vec![
                MidiMessage::NoteOn {
                    channel: 9,
                    key: 60,
                    velocity: 64
                },
                MidiMessage::NoteOff { channel: 9, key: 60 },
            ]
        );
    }
}
