// ABOUTME: Navigation state machine driving clip playback across slide boundaries
// ABOUTME: Consumes discrete commands and media events, emits player directives

use crate::config::{PresentationConfig, SlideConfig};
use crate::errors::{DeckError, Result};
use log::{info, warn};
use std::path::PathBuf;

/// How many rapid PREVIOUS presses are absorbed while a reverse playback is
/// still in flight. Anything beyond human double-press rates is dropped.
const BACKWARD_QUEUE_DEPTH: usize = 8;

/// Discrete symbolic commands, decoupled from any physical input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Replay,
    ReverseToggle,
    PausePlay,
    Quit,
}

/// Sequence number attached to every clip load. Completion events carrying a
/// stale token are discarded so superseded loads can never apply out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadToken(pub u64);

/// Completion events reported by the playback worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// The loaded clip reached its natural end.
    Finished { token: LoadToken },
    /// The clip could not be loaded or decoded.
    Failed { token: LoadToken, message: String },
}

/// Player actions emitted by the state machine. The playback surface applies
/// them verbatim and never mutates navigation state itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Load { token: LoadToken, clip: PathBuf },
    Pause,
    Resume,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Paused at an interior subsection marker.
    Interior,
    /// Paused at the end of a non-looping slide without auto-next.
    SlideEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    PlayingForward,
    PlayingBackward,
    PausedAtBoundary(Boundary),
    Looping,
    /// A clip failed to load. Navigation away from the slide still works.
    Faulted,
    Terminated,
}

/// One slide of the concatenated run, with its origin for display purposes.
#[derive(Debug, Clone)]
pub struct NavSlide {
    pub config: SlideConfig,
    pub scene_index: usize,
    pub slide_in_scene: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct NavigatorOptions {
    /// Whether NEXT at the very last slide terminates (present command) or is
    /// a no-op (embedded contexts).
    pub exit_on_last: bool,
    /// Global switch disabling reversed playback even when reversed clips
    /// exist.
    pub reversing_enabled: bool,
    /// Begin with the first clip loaded but paused.
    pub start_paused: bool,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            exit_on_last: true,
            reversing_enabled: true,
            start_paused: false,
        }
    }
}

/// The presenter navigation state machine.
///
/// Multiple presentation configs (one per rendered scene) are concatenated
/// into a single navigable run. All transitions are driven by
/// [`handle_command`](Navigator::handle_command) and
/// [`handle_media`](Navigator::handle_media); the machine itself never blocks
/// and never touches the filesystem.
pub struct Navigator {
    slides: Vec<NavSlide>,
    options: NavigatorOptions,
    state: State,
    slide_index: usize,
    subsection_index: isize,
    /// Clip cursor within the current slide: an index into
    /// `animation_files` while playing forward, into
    /// `reversed_animation_files` while playing backward.
    clip_cursor: usize,
    paused: bool,
    token: u64,
    pending_backward: usize,
    last_error: Option<String>,
}

impl Navigator {
    pub fn new(configs: Vec<PresentationConfig>, options: NavigatorOptions) -> Result<Self> {
        let mut slides = Vec::new();
        for (scene_index, config) in configs.iter().enumerate() {
            config.validate()?;
            for (slide_in_scene, slide) in config.slides.iter().enumerate() {
                slides.push(NavSlide {
                    config: slide.clone(),
                    scene_index,
                    slide_in_scene,
                });
            }
        }
        if slides.is_empty() {
            return Err(DeckError::ValidationError(
                "Cannot present an empty list of presentation configs".to_string(),
            ));
        }
        Ok(Self {
            slides,
            options,
            state: State::PlayingForward,
            slide_index: 0,
            subsection_index: -1,
            clip_cursor: 0,
            paused: false,
            token: 0,
            pending_backward: 0,
            last_error: None,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn slide_index(&self) -> usize {
        self.slide_index
    }

    pub fn subsection_index(&self) -> isize {
        self.subsection_index
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn current_slide(&self) -> &NavSlide {
        &self.slides[self.slide_index]
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Load the very first clip. Initial state is playing forward at
    /// `(slide 0, subsection -1)`.
    pub fn start(&mut self) -> Vec<Directive> {
        let mut directives = vec![self.load_forward_clip(0)];
        if self.options.start_paused {
            self.paused = true;
            directives.push(Directive::Pause);
        }
        directives
    }

    /// Apply one discrete command.
    pub fn handle_command(&mut self, command: Command) -> Vec<Directive> {
        if self.state == State::Terminated {
            return Vec::new();
        }
        match command {
            Command::Quit => {
                self.state = State::Terminated;
                vec![Directive::Exit]
            }
            Command::Next => self.command_next(),
            Command::Previous => self.command_previous(),
            Command::Replay => self.command_replay(),
            Command::ReverseToggle => self.command_reverse(),
            Command::PausePlay => self.command_pause_play(),
        }
    }

    /// Apply one completion event from the playback worker. Events carrying a
    /// stale token are discarded.
    pub fn handle_media(&mut self, event: MediaEvent) -> Vec<Directive> {
        let token = match &event {
            MediaEvent::Finished { token } => *token,
            MediaEvent::Failed { token, .. } => *token,
        };
        if token.0 != self.token {
            info!("Discarding stale media event for load #{}", token.0);
            return Vec::new();
        }
        match event {
            MediaEvent::Finished { .. } => self.clip_finished(),
            MediaEvent::Failed { message, .. } => {
                warn!(
                    "Clip failed on slide {}: {}; navigation stays available",
                    self.slide_index, message
                );
                self.last_error = Some(message);
                self.state = State::Faulted;
                Vec::new()
            }
        }
    }

    fn slide(&self) -> &SlideConfig {
        &self.slides[self.slide_index].config
    }

    fn next_token(&mut self) -> LoadToken {
        self.token += 1;
        LoadToken(self.token)
    }

    fn load_forward_clip(&mut self, clip_index: usize) -> Directive {
        self.clip_cursor = clip_index;
        self.paused = false;
        let clip = self.slide().animation_files[clip_index].clone();
        Directive::Load {
            token: self.next_token(),
            clip,
        }
    }

    fn load_reversed_clip(&mut self, rev_index: usize) -> Directive {
        self.clip_cursor = rev_index;
        self.paused = false;
        let clip = match self.slide().reversed_animation_files.as_ref() {
            Some(files) => files[rev_index].clone(),
            None => {
                warn!(
                    "Reversed clips missing on slide {}; replaying forward instead",
                    self.slide_index
                );
                self.slide().animation_files[0].clone()
            }
        };
        Directive::Load {
            token: self.next_token(),
            clip,
        }
    }

    fn command_next(&mut self) -> Vec<Directive> {
        match self.state {
            State::PausedAtBoundary(Boundary::Interior) => {
                // Resume from the marker we paused at.
                self.state = State::PlayingForward;
                let clip = self.clip_cursor;
                vec![self.load_forward_clip(clip)]
            }
            State::PlayingBackward => {
                // An advance cancels the reverse flight and replays the slide
                // forward from the boundary we logically sit at.
                self.pending_backward = 0;
                self.state = State::PlayingForward;
                let clip = self.slide().boundary_clip(self.subsection_index);
                vec![self.load_forward_clip(clip)]
            }
            _ => {
                if self.subsection_index < self.slide().last_subsection_index() {
                    self.subsection_index += 1;
                    self.state = State::PlayingForward;
                    let clip = self.slide().boundary_clip(self.subsection_index);
                    vec![self.load_forward_clip(clip)]
                } else {
                    self.goto_next_slide()
                }
            }
        }
    }

    fn goto_next_slide(&mut self) -> Vec<Directive> {
        if self.slide_index + 1 < self.slides.len() {
            self.slide_index += 1;
            self.subsection_index = -1;
            self.state = State::PlayingForward;
            self.last_error = None;
            vec![self.load_forward_clip(0)]
        } else if self.options.exit_on_last {
            info!("No more slide to play, terminating.");
            self.state = State::Terminated;
            vec![Directive::Exit]
        } else {
            info!("No more slide to play.");
            Vec::new()
        }
    }

    fn command_previous(&mut self) -> Vec<Directive> {
        if self.state == State::PlayingBackward {
            // Absorb rapid presses; each queued step is consumed as a reverse
            // clip finishes.
            if self.pending_backward < BACKWARD_QUEUE_DEPTH {
                self.pending_backward += 1;
            }
            return Vec::new();
        }
        self.backward_step()
    }

    fn backward_step(&mut self) -> Vec<Directive> {
        if self.subsection_index > -1 {
            // Within a slide: jump back one boundary and replay forward,
            // subsection stepping never reverses content.
            self.subsection_index -= 1;
            self.state = State::PlayingForward;
            let clip = self.slide().boundary_clip(self.subsection_index);
            vec![self.load_forward_clip(clip)]
        } else if self.slide_index > 0 {
            self.slide_index -= 1;
            self.last_error = None;
            let slide = self.slide();
            let reversible =
                self.options.reversing_enabled && slide.reversed_animation_files.is_some();
            if reversible {
                self.subsection_index = slide.last_subsection_index();
                self.state = State::PlayingBackward;
                vec![self.load_reversed_clip(0)]
            } else {
                // Skip-reversing: jump to the prior slide's start and play
                // forward again.
                self.subsection_index = -1;
                self.state = State::PlayingForward;
                vec![self.load_forward_clip(0)]
            }
        } else {
            info!("No previous slide.");
            Vec::new()
        }
    }

    fn command_replay(&mut self) -> Vec<Directive> {
        self.subsection_index = -1;
        self.pending_backward = 0;
        self.state = State::PlayingForward;
        vec![self.load_forward_clip(0)]
    }

    fn command_reverse(&mut self) -> Vec<Directive> {
        if !self.options.reversing_enabled || self.slide().reversed_animation_files.is_none() {
            return Vec::new();
        }
        self.state = State::PlayingBackward;
        vec![self.load_reversed_clip(0)]
    }

    fn command_pause_play(&mut self) -> Vec<Directive> {
        match self.state {
            State::PlayingForward | State::PlayingBackward | State::Looping => {
                self.paused = !self.paused;
                if self.paused {
                    vec![Directive::Pause]
                } else {
                    vec![Directive::Resume]
                }
            }
            // No effect while waiting at a boundary.
            _ => Vec::new(),
        }
    }

    fn clip_finished(&mut self) -> Vec<Directive> {
        match self.state {
            State::PlayingForward => self.forward_clip_finished(),
            State::PlayingBackward => self.backward_clip_finished(),
            State::Looping => {
                // Loop-restart of the terminal clip.
                let clip = self.clip_cursor;
                vec![self.load_forward_clip(clip)]
            }
            // A completion while paused, faulted or terminated has nothing to
            // drive.
            _ => Vec::new(),
        }
    }

    fn forward_clip_finished(&mut self) -> Vec<Directive> {
        let next_clip = self.clip_cursor + 1;
        let clip_count = self.slide().animation_files.len();

        if next_clip < clip_count {
            let marker = self
                .slide()
                .marker_at(next_clip)
                .map(|(index, m)| (index, m.auto_next));
            if let Some((marker_index, auto_next)) = marker {
                self.subsection_index = marker_index as isize;
                if auto_next {
                    return vec![self.load_forward_clip(next_clip)];
                }
                self.clip_cursor = next_clip;
                self.state = State::PausedAtBoundary(Boundary::Interior);
                return Vec::new();
            }
            return vec![self.load_forward_clip(next_clip)];
        }

        // The slide's forward content is done.
        let slide = self.slide();
        if slide.loop_ {
            if slide.auto_next {
                // Loop combined with auto-next advances after exactly one
                // pass, unless an external advance arrived first.
                return self.goto_next_slide();
            }
            self.state = State::Looping;
            let last = clip_count - 1;
            return vec![self.load_forward_clip(last)];
        }
        if slide.auto_next {
            // Synthesize an internal NEXT.
            return self.command_next();
        }
        self.state = State::PausedAtBoundary(Boundary::SlideEnd);
        Vec::new()
    }

    fn backward_clip_finished(&mut self) -> Vec<Directive> {
        if self.pending_backward > 0 {
            // A queued PREVIOUS supersedes the rest of this reverse sequence.
            self.pending_backward -= 1;
            return self.backward_step();
        }
        let rev_count = self
            .slide()
            .reversed_animation_files
            .as_ref()
            .map(Vec::len)
            .unwrap_or(0);
        let next_rev = self.clip_cursor + 1;
        if next_rev < rev_count {
            return vec![self.load_reversed_clip(next_rev)];
        }
        // The reverse replay finished; rest at the boundary the backward step
        // targeted.
        self.clip_cursor = self.slide().boundary_clip(self.subsection_index);
        self.state = State::PausedAtBoundary(Boundary::SlideEnd);
        Vec::new()
    }
}
