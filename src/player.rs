// ABOUTME: Serialized event loop wrapping the navigation state machine
// ABOUTME: Provides the command queue, playback worker and surface trait

use crate::errors::Result;
use crate::media::MediaBackend;
use crate::navigation::{Command, Directive, LoadToken, MediaEvent, Navigator, State};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Everything the event loop consumes: user commands and worker completions,
/// serialized through one channel so at most one transition is in progress at
/// a time.
#[derive(Debug)]
pub enum Event {
    Command(Command),
    Media(MediaEvent),
}

/// Seam between the state machine and whatever actually shows video. The
/// surface applies directives and reports completions back into the event
/// channel; it never mutates navigation state.
pub trait PlaybackSurface {
    fn load(&mut self, token: LoadToken, clip: &Path);
    fn pause(&mut self);
    fn resume(&mut self);
}

struct SurfaceShared {
    latest_token: u64,
    paused: bool,
}

/// Headless surface that "plays" a clip by waiting out its probed duration on
/// a worker thread, then reports completion. A GUI front end would replace
/// this with a real video widget; the queue discipline is identical.
pub struct ClockSurface {
    events: Sender<Event>,
    backend: Arc<dyn MediaBackend + Send + Sync>,
    shared: Arc<Mutex<SurfaceShared>>,
}

impl ClockSurface {
    pub fn new(events: Sender<Event>, backend: Arc<dyn MediaBackend + Send + Sync>) -> Self {
        Self {
            events,
            backend,
            shared: Arc::new(Mutex::new(SurfaceShared {
                latest_token: 0,
                paused: false,
            })),
        }
    }
}

impl PlaybackSurface for ClockSurface {
    fn load(&mut self, token: LoadToken, clip: &Path) {
        self.shared.lock().latest_token = token.0;

        let events = self.events.clone();
        let backend = self.backend.clone();
        let shared = self.shared.clone();
        let clip: PathBuf = clip.to_path_buf();

        thread::spawn(move || {
            let duration = match backend.probe_duration(&clip) {
                Ok(seconds) => seconds,
                Err(e) => {
                    let _ = events.send(Event::Media(MediaEvent::Failed {
                        token,
                        message: e.to_string(),
                    }));
                    return;
                }
            };

            debug!("Playing {:?} for {:.2}s", clip, duration);

            // Wait in slices so a pause freezes the clock and a superseding
            // load abandons the wait early.
            let mut remaining = Duration::from_secs_f64(duration.max(0.0));
            let slice = Duration::from_millis(50);
            loop {
                {
                    let state = shared.lock();
                    if state.latest_token != token.0 {
                        debug!("Load #{} superseded, dropping completion", token.0);
                        return;
                    }
                    if !state.paused {
                        if remaining.is_zero() {
                            break;
                        }
                    } else {
                        drop(state);
                        thread::sleep(slice);
                        continue;
                    }
                }
                let step = remaining.min(slice);
                thread::sleep(step);
                remaining = remaining.saturating_sub(step);
            }

            if shared.lock().latest_token == token.0 {
                let _ = events.send(Event::Media(MediaEvent::Finished { token }));
            }
        });
    }

    fn pause(&mut self) {
        self.shared.lock().paused = true;
    }

    fn resume(&mut self) {
        self.shared.lock().paused = false;
    }
}

/// Run the presentation event loop until the machine terminates or every
/// sender hangs up.
pub fn run_player<S: PlaybackSurface>(
    mut navigator: Navigator,
    mut surface: S,
    events: Receiver<Event>,
) -> Result<()> {
    let directives = navigator.start();
    if apply_directives(&mut surface, &navigator, directives) {
        return Ok(());
    }

    while let Ok(event) = events.recv() {
        let directives = match event {
            Event::Command(command) => navigator.handle_command(command),
            Event::Media(media) => navigator.handle_media(media),
        };
        if apply_directives(&mut surface, &navigator, directives) {
            break;
        }
        if navigator.state() == State::Faulted {
            if let Some(error) = navigator.last_error() {
                warn!(
                    "Slide {} is faulted ({}); NEXT, PREVIOUS and QUIT remain available",
                    navigator.slide_index() + 1,
                    error
                );
            }
        }
    }

    Ok(())
}

/// Apply a batch of directives. Returns true when the presentation exited.
fn apply_directives<S: PlaybackSurface>(
    surface: &mut S,
    navigator: &Navigator,
    directives: Vec<Directive>,
) -> bool {
    for directive in directives {
        match directive {
            Directive::Load { token, clip } => {
                let slide = navigator.current_slide();
                info!(
                    "Slide {}/{} (scene {}, slide {}): playing {:?}",
                    navigator.slide_index() + 1,
                    navigator.slide_count(),
                    slide.scene_index + 1,
                    slide.slide_in_scene + 1,
                    clip
                );
                if !slide.config.notes.is_empty() {
                    info!("Notes: {}", slide.config.notes);
                }
                surface.load(token, &clip);
            }
            Directive::Pause => surface.pause(),
            Directive::Resume => surface.resume(),
            Directive::Exit => {
                info!("Presentation finished.");
                return true;
            }
        }
    }
    false
}
