//! Note output backends.
//!
//! [`MidiService`] is the only thing the dispatcher talks to. Two backends exist:
//! [`MidirOutput`] for real ports and [`MockMidi`] which just logs.

mod hardware;
mod mock;

pub use hardware::MidirOutput;
pub use mock::{MockMidi, SentLog};

use crate::notes::note_label;
use serde_with::DeserializeFromStr;
use std::fmt;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

pub const CLIENT_NAME: &str = "roundseq";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
}

impl MidiMessage {
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            Self::NoteOn {
                channel,
                key,
                velocity,
            } => [0x90 | (channel & 0x0F), key & 0x7F, velocity & 0x7F],
            Self::NoteOff { channel, key } => [0x80 | (channel & 0x0F), key & 0x7F, 0],
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoteOn {
                channel,
                key,
                velocity,
            } => write!(
                f,
                "Note ON:  {} (note={key}, vel={velocity}, ch={channel})",
                note_label(key)
            ),
            Self::NoteOff { channel, key } => {
                write!(f, "Note OFF: {} (note={key}, ch={channel})", note_label(key))
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(#[from] midir::InitError),
    #[error("MIDI port info error: {0}")]
    PortInfo(#[from] midir::PortInfoError),
    #[error("MIDI send error: {0}")]
    Send(#[from] midir::SendError),
    #[error("Failed to connect to {0}")]
    Connect(String),
    #[error("No MIDI output ports available")]
    NoPorts,
    #[error("No MIDI output port matching '{0}'")]
    PortNotFound(String),
    #[error("Not connected to a MIDI port")]
    NotConnected,
}

pub trait MidiService {
    /// Opens `port` (matched by name), or the first available port when `None`.
    fn connect(&mut self, port: Option<&str>) -> Result<(), MidiError>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn port_name(&self) -> Option<&str>;

    fn send(&mut self, message: MidiMessage) -> Result<(), MidiError>;

    fn list_ports(&self) -> Result<Vec<String>, MidiError>;

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8) -> Result<(), MidiError> {
        self.send(MidiMessage::NoteOn {
            channel,
            key,
            velocity,
        })
    }

    fn note_off(&mut self, channel: u8, key: u8) -> Result<(), MidiError> {
        self.send(MidiMessage::NoteOff { channel, key })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, DeserializeFromStr, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Backend {
    #[default]
    Mock,
    #[strum(to_string = "midir", serialize = "hardware")]
    Midir,
}

pub fn create(backend: Backend) -> Box<dyn MidiService> {
    match backend {
        Backend::Mock => Box::new(MockMidi::new()),
        Backend::Midir => Box::new(MidirOutput::new()),
    }
}

/// Creates and connects the requested backend. A hardware backend that cannot
/// connect is replaced by the mock so the instrument stays usable.
pub fn open(backend: Backend, port: Option<&str>) -> Box<dyn MidiService> {
    let mut service = create(backend);
    match service.connect(port) {
        Ok(()) => service,
        Err(e) => {
            log::warn!("{} backend unavailable ({}), using mock output", backend, e);
            let mut mock = create(Backend::Mock);
            if let Err(e) = mock.connect(None) {
                log::error!("Mock MIDI connect failed: {}", e);
            }
            mock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bytes() {
        let on = MidiMessage::NoteOn {
            channel: 2,
            key: 60,
            velocity: 100,
        };
        assert_eq!(on.to_bytes(), [0x92, 60, 100]);
        let off = MidiMessage::NoteOff { channel: 15, key: 61 };
        assert_eq!(off.to_bytes(), [0x8F, 61, 0]);
    }

    #[test]
    fn test_message_display() {
        let on = MidiMessage::NoteOn {
            channel: 0,
            key: 60,
            velocity: 100,
        };
        assert_eq!(on.to_string(), "Note ON:  C4 (note=60, vel=100, ch=0)");
        let off = MidiMessage::NoteOff { channel: 0, key: 70 };
        assert_eq!(off.to_string(), "Note OFF: A#4 (note=70, ch=0)");
    }

    #[test]
    fn test_backend_deserialization() {
        let cases = vec![
            ("\"mock\"", Backend::Mock),
            ("\"Mock\"", Backend::Mock),
            ("\"midir\"", Backend::Midir),
            ("\"HARDWARE\"", Backend::Midir),
        ];
        for (json, expected) in cases {
            let backend: Backend = serde_json::from_str(json).unwrap();
            assert_eq!(backend, expected);
        }
        assert!(serde_json::from_str::<Backend>("\"jack\"").is_err());
    }

    #[test]
    fn test_open_mock_connects() {
        let service = open(Backend::Mock, None);
        assert!(service.is_connected());
        assert_eq!(service.port_name(), Some(mock::MOCK_PORT));
    }
}
