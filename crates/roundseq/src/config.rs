use crate::events::AppEvent;
use crate::midi::Backend;
use crate::notes::{NoteMap, Octave, Winding};
use async_channel::Sender;
use config::FileFormat;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use radial::{LayoutError, Point, RadialLayout, RingSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DISPLAY_SIZE: f64 = 1080.0;
pub const MAX_CHANNEL: u8 = 15;

/// Geometry of the note dial. Angles are in degrees, counter-clockwise from the
/// positive x-axis of the touch surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub center: Point,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub slice_count: usize,
    pub angular_offset: f64,
    /// Explicit slice start angles; overrides `slice_count` and `angular_offset`.
    pub slice_starts: Option<Vec<f64>>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let radius = DISPLAY_SIZE / 2.0;
        Self {
            center: Point::new(radius, radius),
            inner_radius: 297.0,
            outer_radius: 513.0,
            slice_count: 12,
            angular_offset: 0.0,
            slice_starts: None,
        }
    }
}

impl LayoutConfig {
    pub fn ring(&self) -> RingSpec {
        RingSpec::new(self.inner_radius, self.outer_radius)
    }

    pub fn build(&self) -> Result<RadialLayout, LayoutError> {
        match &self.slice_starts {
            Some(starts) => {
                let radians: Vec<f64> = starts.iter().map(|d| d.to_radians()).collect();
                RadialLayout::from_start_angles(self.center, self.ring(), &radians)
            }
            None => RadialLayout::new(
                self.center,
                self.ring(),
                self.slice_count,
                self.angular_offset.to_radians(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub octave: Octave,
    pub velocity: u8,
    pub winding: Winding,
    pub root_slice: usize,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            octave: Octave::default(),
            velocity: 100,
            winding: Winding::default(),
            root_slice: 0,
        }
    }
}

impl NotesConfig {
    pub fn note_map(&self, slice_count: usize) -> NoteMap {
        NoteMap::new(slice_count, self.winding, self.root_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub backend: Backend,
    pub channel: u8,
    /// Substring of the output port name; first port when unset.
    pub port: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub notes: NotesConfig,
    pub midi: MidiConfig,
}

impl Config {
    /// Checks the values serde cannot, returning the dial they describe.
    pub fn validate(&self) -> Result<RadialLayout, ConfigError> {
        if self.midi.channel > MAX_CHANNEL {
            return Err(ConfigError::InvalidChannel(self.midi.channel));
        }
        if !(1..=127).contains(&self.notes.velocity) {
            return Err(ConfigError::InvalidVelocity(self.notes.velocity));
        }
        Ok(self.layout.build()?)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("Config watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error("MIDI channel must be 0-15, got {0}")]
    InvalidChannel(u8),
    #[error("Velocity must be 1-127, got {0}")]
    InvalidVelocity(u8),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "roundseq", "roundseq").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_env(path, None)
}

/// Layers `ROUNDSEQ_`-prefixed variables over the TOML file, e.g.
/// `ROUNDSEQ_NOTES__OCTAVE=5`. `vars` replaces the process environment when set.
pub fn load_config_with_env(
    path: &Path,
    vars: Option<config::Map<String, String>>,
) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(
            config::File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("ROUNDSEQ")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn write_default_config_to(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(path, DEFAULT_CONFIG)?;
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Watches the directory holding `config_path`, forwarding raw notify results
/// into `bridge_tx`. The watcher stops when the returned handle is dropped.
pub fn watch_config_dir(
    config_path: &Path,
    bridge_tx: Sender<notify::Result<notify::Event>>,
) -> Result<RecommendedWatcher, ConfigError> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(config_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

pub async fn run_async_watcher(config_path: PathBuf, tx: Sender<AppEvent>) {
    if let Some(config_dir) = config_path.parent()
        && let Err(e) = fs_err::create_dir_all(config_dir)
    {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let _watcher = match watch_config_dir(&config_path, bridge_tx) {
        Ok(w) => w,
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == config_path.file_name())
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}
