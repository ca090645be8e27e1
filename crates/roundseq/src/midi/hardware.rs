use super::{CLIENT_NAME, MidiError, MidiMessage, MidiService};
use midir::{MidiOutput, MidiOutputConnection};

/// Real MIDI output through `midir`.
#[derive(Default)]
pub struct MidirOutput {
    conn: Option<MidiOutputConnection>,
    port_name: Option<String>,
}

impl MidirOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MidiService for MidirOutput {
    fn connect(&mut self, port: Option<&str>) -> Result<(), MidiError> {
        self.disconnect();

        let output = MidiOutput::new(CLIENT_NAME)?;
        let ports = output.ports();
        let named: Vec<_> = ports
            .iter()
            .filter_map(|p| output.port_name(p).ok().map(|name| (p, name)))
            .collect();

        let (port, name) = match port {
            Some(wanted) => {
                let wanted_lower = wanted.to_lowercase();
                named
                    .into_iter()
                    .find(|(_, name)| name.to_lowercase().contains(&wanted_lower))
                    .ok_or_else(|| MidiError::PortNotFound(wanted.to_string()))?
            }
            None => named.into_iter().next().ok_or(MidiError::NoPorts)?,
        };

        let conn = output
            .connect(port, CLIENT_NAME)
            .map_err(|e| MidiError::Connect(format!("{name}: {e}")))?;

        log::info!("Connected to MIDI port {name}");
        self.conn = Some(conn);
        self.port_name = Some(name);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close();
            log::info!(
                "Disconnected from MIDI port {}",
                self.port_name.take().unwrap_or_default()
            );
        }
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn send(&mut self, message: MidiMessage) -> Result<(), MidiError> {
        let conn = self.conn.as_mut().ok_or(MidiError::NotConnected)?;
        conn.send(&message.to_bytes())?;
        log::debug!("{message}");
        Ok(())
    }

    fn list_ports(&self) -> Result<Vec<String>, MidiError> {
        let output = MidiOutput::new(CLIENT_NAME)?;
        Ok(output
            .ports()
            .iter()
            .filter_map(|p| output.port_name(p).ok())
            .collect())
    }
}
