// ABOUTME: Library module for the clipdeck program.
// ABOUTME: Contains the slide data model, presenter state machine and converters.

// Reexport modules
pub mod builder;
pub mod config;
pub mod errors;
pub mod export;
pub mod html;
pub mod media;
pub mod navigation;
pub mod pdf;
pub mod player;
pub mod pptx;
pub mod resources;
pub mod utils;

// Reexport common types and functions
pub use builder::{DeckBuilder, SceneOptions, SlideBuilder};
pub use config::{list_presentation_configs, PresentationConfig, SlideConfig, SubsectionMarker};
pub use errors::{DeckError, Result};
pub use export::{frame_plan, ExportOptions, FramePolicy, SubsectionMode};
pub use html::{convert_html, generate_html, write_html_to_file, HtmlConfig};
pub use media::{create_backend, BackendChoice, FfmpegBackend, MediaBackend, NullBackend};
pub use navigation::{Command, Navigator, NavigatorOptions, State};
pub use pdf::{convert_pdf, PdfConfig};
pub use player::{run_player, ClockSurface, Event, PlaybackSurface};
pub use pptx::{convert_pptx, PptxConfig};
pub use resources::ResourceFile;

#[cfg(test)]
mod tests;
