use super::{MidiError, MidiMessage, MidiService};
use parking_lot::Mutex;
use std::sync::Arc;

pub const MOCK_PORT: &str = "Mock MIDI Output";

/// Every message a [`MockMidi`] was asked to send, in order.
pub type SentLog = Arc<Mutex<Vec<MidiMessage>>>;

/// Logs notes instead of sending them. Used on machines without MIDI hardware.
#[derive(Default)]
pub struct MockMidi {
    port_name: Option<String>,
    sent: SentLog,
}

impl MockMidi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_log(&self) -> SentLog {
        Arc::clone(&self.sent)
    }
}

impl MidiService for MockMidi {
    fn connect(&mut self, port: Option<&str>) -> Result<(), MidiError> {
        let name = port.unwrap_or(MOCK_PORT).to_string();
        log::info!("[mock] Connected to {name}");
        self.port_name = Some(name);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(name) = self.port_name.take() {
            log::info!("[mock] Disconnected from {name}");
        }
    }

    fn is_connected(&self) -> bool {
        self.port_name.is_some()
    }

    fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn send(&mut self, message: MidiMessage) -> Result<(), MidiError> {
        log::info!("[mock] {message}");
        self.sent.lock().push(message);
        Ok(())
    }

    fn list_ports(&self) -> Result<Vec<String>, MidiError> {
        Ok(vec![MOCK_PORT.to_string(), format!("{MOCK_PORT} 2")])
    }
}
