// ABOUTME: Slide and presentation configuration model for clipdeck
// ABOUTME: Handles JSON persistence, validation and config discovery

use crate::errors::{DeckError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An interior pause point within a slide.
///
/// Markers are strictly increasing in `clip_index` and never point at the
/// slide's first or one-past-last clip: the slide's own start and end are not
/// markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionMarker {
    /// Index into `animation_files` where playback pauses.
    pub clip_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// When set, playback continues through this marker without waiting.
    #[serde(default)]
    pub auto_next: bool,
}

/// One navigable slide, backed by one or more animation clips.
///
/// Created once at render time and read-only ever after; the presenter and
/// every converter consume the same frozen description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideConfig {
    /// Ordered clips that constitute the slide's forward playback. Never empty.
    pub animation_files: Vec<PathBuf>,

    /// Whether the terminal clip repeats until an external advance.
    #[serde(rename = "loop", default)]
    pub loop_: bool,

    /// Whether the slide advances on its own once playback finishes.
    #[serde(default)]
    pub auto_next: bool,

    /// Reverse-playback counterparts, ordered for backward navigation.
    /// Absent when the scene was rendered with skip-reversing, in which case
    /// backward navigation jumps to the slide boundary and plays forward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversed_animation_files: Option<Vec<PathBuf>>,

    /// Speaker notes, display-only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    /// Interior pause points, strictly increasing. Empty for most slides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<SubsectionMarker>,
}

impl SlideConfig {
    /// Validate the structural invariants of this slide.
    pub fn validate(&self, slide_index: usize) -> Result<()> {
        let n = self.animation_files.len();
        if n == 0 {
            return Err(DeckError::ValidationError(format!(
                "Slide {} has no animation files; a slide is always at least one playable unit",
                slide_index
            )));
        }

        if let Some(rev) = &self.reversed_animation_files {
            if rev.len() != n {
                return Err(DeckError::ValidationError(format!(
                    "Slide {} has {} reversed clips for {} forward clips",
                    slide_index,
                    rev.len(),
                    n
                )));
            }
        }

        let mut previous = 0usize;
        for marker in &self.subsections {
            if marker.clip_index == 0 || marker.clip_index >= n {
                return Err(DeckError::ValidationError(format!(
                    "Slide {} marker at clip {} is not interior to the slide (1..{})",
                    slide_index, marker.clip_index, n
                )));
            }
            if marker.clip_index <= previous && previous != 0 {
                return Err(DeckError::ValidationError(format!(
                    "Slide {} markers are not strictly increasing ({} after {})",
                    slide_index, marker.clip_index, previous
                )));
            }
            previous = marker.clip_index;
        }

        Ok(())
    }

    /// Number of playback segments: markers split the slide into one more
    /// segment than there are markers.
    pub fn segment_count(&self) -> usize {
        self.subsections.len() + 1
    }

    /// Clip span `[start, end)` of the given segment. Segment 0 runs from the
    /// slide start up to the first marker; the last segment ends the slide.
    pub fn segment_span(&self, segment: usize) -> (usize, usize) {
        let start = if segment == 0 {
            0
        } else {
            self.subsections[segment - 1].clip_index
        };
        let end = if segment < self.subsections.len() {
            self.subsections[segment].clip_index
        } else {
            self.animation_files.len()
        };
        (start, end)
    }

    /// Clip index at which the given subsection boundary sits (`-1` maps to
    /// the slide start).
    pub fn boundary_clip(&self, subsection_index: isize) -> usize {
        if subsection_index < 0 {
            0
        } else {
            self.subsections[subsection_index as usize].clip_index
        }
    }

    /// Index of the last marker, or `-1` when the slide has none.
    pub fn last_subsection_index(&self) -> isize {
        self.subsections.len() as isize - 1
    }

    /// Marker sitting at the given clip index, if any.
    pub fn marker_at(&self, clip_index: usize) -> Option<(usize, &SubsectionMarker)> {
        self.subsections
            .iter()
            .enumerate()
            .find(|(_, m)| m.clip_index == clip_index)
    }
}

fn default_resolution() -> (u32, u32) {
    (1920, 1080)
}

fn default_background_color() -> String {
    "black".to_string()
}

/// Everything needed to present or convert one rendered scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// The non-empty list of slides, in presentation order.
    pub slides: Vec<SlideConfig>,

    /// Resolution of the animation files, informational.
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),

    /// Background color of the animation files, informational.
    #[serde(default = "default_background_color")]
    pub background_color: String,
}

impl PresentationConfig {
    /// Validate this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.slides.is_empty() {
            return Err(DeckError::ValidationError(
                "A presentation config must contain at least one slide".to_string(),
            ));
        }
        for (index, slide) in self.slides.iter().enumerate() {
            slide.validate(index)?;
        }
        Ok(())
    }

    /// Read a presentation configuration from a JSON file.
    ///
    /// Relative clip paths are resolved against the config file's directory,
    /// so a rendered scene folder can be moved around as a unit. Fields
    /// introduced after the first release (notes, subsections, reversed clips)
    /// default to absent when reading older files.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|_| DeckError::ConfigError {
            path: path.to_path_buf(),
            message: "file is missing or unreadable".to_string(),
        })?;

        let mut config: PresentationConfig =
            serde_json::from_str(&content).map_err(|e| DeckError::ConfigError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        for slide in &mut config.slides {
            for file in &mut slide.animation_files {
                if file.is_relative() {
                    *file = parent.join(&*file);
                }
            }
            if let Some(rev_files) = &mut slide.reversed_animation_files {
                for file in rev_files {
                    if file.is_relative() {
                        *file = parent.join(&*file);
                    }
                }
            }
        }

        config.validate().map_err(|e| DeckError::ConfigError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Dump this configuration to a JSON file.
    ///
    /// Clip paths under the config file's directory are written relative to
    /// it, keeping the rendered scene folder relocatable.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let relativize = |file: &mut PathBuf| {
            if let Ok(relative) = file.strip_prefix(parent) {
                *file = relative.to_path_buf();
            }
        };
        let mut config = self.clone();
        for slide in &mut config.slides {
            slide.animation_files.iter_mut().for_each(relativize);
            if let Some(rev_files) = &mut slide.reversed_animation_files {
                rev_files.iter_mut().for_each(relativize);
            }
        }

        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| DeckError::ValidationError(e.to_string()))?;
        fs::write(path, json).map_err(DeckError::FileReadError)?;
        Ok(())
    }
}

/// List all valid presentation configs in a folder.
///
/// Files that do not parse as presentation configs are skipped with a warning
/// rather than failing the whole listing.
pub fn list_presentation_configs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(DeckError::PathNotFoundError(folder.to_path_buf()));
    }

    let pattern = format!("{}/*.json", folder.to_string_lossy());
    let mut paths = Vec::new();

    for entry in (glob::glob(&pattern)
        .map_err(|e| DeckError::ValidationError(format!("Invalid glob pattern: {}", e)))?)
    .flatten()
    {
        match PresentationConfig::from_file(&entry) {
            Ok(_) => paths.push(entry),
            Err(e) => warn!("Skipping {:?}: {}", entry, e),
        }
    }

    paths.sort();
    debug!(
        "Found {} valid presentation configuration files in {:?}",
        paths.len(),
        folder
    );

    Ok(paths)
}
