use crate::config::{self, Config, ConfigError};
use crate::dispatch::NoteDispatcher;
use crate::events::{AppEvent, OctaveChange};
use crate::midi::MidiService;
use crate::notes::Octave;
use async_channel::Receiver;
use radial::{RadialLayout, SliceEvent, TouchTracker};
use std::ops::ControlFlow;
use std::path::PathBuf;

/// Owns the dial state. Every event goes through [`App::handle`] on a single
/// thread, so tracker and dispatcher never need locking.
pub struct App {
    config_path: PathBuf,
    tracker: TouchTracker,
    dispatcher: NoteDispatcher,
}

impl App {
    pub fn new(
        config: &Config,
        layout: RadialLayout,
        service: Box<dyn MidiService>,
        config_path: PathBuf,
    ) -> Self {
        let slice_count = layout.slice_count();
        Self {
            config_path,
            tracker: TouchTracker::new(layout),
            dispatcher: NoteDispatcher::new(service, config, slice_count),
        }
    }

    pub fn tracker(&self) -> &TouchTracker {
        &self.tracker
    }

    pub fn dispatcher(&self) -> &NoteDispatcher {
        &self.dispatcher
    }

    pub fn handle(&mut self, event: AppEvent) -> ControlFlow<()> {
        match event {
            AppEvent::Touch(input) => match self.tracker.handle(input) {
                Ok(transitions) => self.dispatch_all(transitions),
                Err(e) => log::warn!("Dropping {} event: {}", input.phase, e),
            },
            AppEvent::Octave(change) => match change {
                OctaveChange::Up => self.dispatcher.set_octave(self.dispatcher.octave().up()),
                OctaveChange::Down => {
                    self.dispatcher.set_octave(self.dispatcher.octave().down())
                }
                OctaveChange::Set(n) => self.dispatcher.set_octave(Octave::new(n)),
            },
            AppEvent::ConfigReload => {
                log::info!("Reloading {}", self.config_path.display());
                let result =
                    config::load_config_from(&self.config_path).and_then(|c| self.apply_config(&c));
                if let Err(e) = result {
                    log::error!("Keeping previous configuration: {}", e);
                }
            }
            AppEvent::Shutdown => {
                let released = self.tracker.cancel_all();
                self.dispatch_all(released);
                self.dispatcher.release_all();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Swaps in a new layout and note settings. Touches in progress are
    /// cancelled first so no note outlives the slice it was started on.
    pub fn apply_config(&mut self, config: &Config) -> Result<(), ConfigError> {
        let layout = config.validate()?;
        let released = self.tracker.cancel_all();
        self.dispatch_all(released);

        let slice_count = layout.slice_count();
        self.tracker = TouchTracker::new(layout);
        self.dispatcher.reconfigure(config, slice_count);
        self.dispatcher.set_octave(config.notes.octave);
        log::info!("Layout now has {} slices", slice_count);
        Ok(())
    }

    fn dispatch_all(&mut self, events: impl IntoIterator<Item = SliceEvent>) {
        for event in events {
            log::debug!(
                "Touch {} {} slice {}",
                event.touch(),
                if event.is_activate() { "entered" } else { "left" },
                event.slice()
            );
            self.dispatcher.dispatch(event);
        }
    }

    /// Processes events until shutdown or until every sender is gone.
    pub fn run(mut self, rx: Receiver<AppEvent>) {
        while let Ok(event) = rx.recv_blocking() {
            if self.handle(event).is_break() {
                break;
            }
        }
        if !self.tracker.is_empty() {
            let released = self.tracker.cancel_all();
            self.dispatch_all(released);
            self.dispatcher.release_all();
        }
        self.dispatcher.service_mut().disconnect();
    }
}
