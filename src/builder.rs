// ABOUTME: Authoring-time builders that freeze clip buffers into slide configs
// ABOUTME: Provides SceneOptions, SlideBuilder and DeckBuilder

use crate::config::{PresentationConfig, SlideConfig, SubsectionMarker};
use crate::errors::{DeckError, Result};
use std::path::PathBuf;

/// Immutable per-scene rendering options, decided once and passed into slide
/// finalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    /// When set, no reversed clips are recorded and backward navigation
    /// degrades to jumping to the slide boundary.
    pub skip_reversing: bool,
    /// Clips longer than this (seconds) are reversed in segments by the
    /// render pipeline; forwarded as-is, the builders do not act on it.
    pub max_duration_before_split_reverse: Option<f64>,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            skip_reversing: false,
            max_duration_before_split_reverse: Some(4.0),
        }
    }
}

/// Buffer of in-progress animation clips for the slide currently being
/// authored. Owned by the one active authoring context, finalized and
/// detached on end-of-slide.
#[derive(Debug, Default)]
pub struct SlideBuilder {
    clips: Vec<PathBuf>,
    reversed_clips: Vec<PathBuf>,
    pending_markers: Vec<SubsectionMarker>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rendered clip, with its reversed counterpart when the scene
    /// options keep reversing enabled.
    pub fn push_clip(&mut self, clip: PathBuf, reversed: Option<PathBuf>) {
        self.clips.push(clip);
        if let Some(rev) = reversed {
            self.reversed_clips.push(rev);
        }
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Buffer a subsection marker at the current clip position.
    ///
    /// Fails when nothing has been buffered yet or when a marker already sits
    /// at this position: markers are interior and strictly increasing.
    pub fn mark_subsection(&mut self, label: Option<String>, auto_next: bool) -> Result<()> {
        if self.clips.is_empty() {
            return Err(DeckError::ValidationError(
                "Cannot mark a subsection before any animation has been buffered".to_string(),
            ));
        }
        let clip_index = self.clips.len();
        if let Some(last) = self.pending_markers.last() {
            if last.clip_index >= clip_index {
                return Err(DeckError::ValidationError(format!(
                    "Subsection markers must be strictly increasing (already one at clip {})",
                    last.clip_index
                )));
            }
        }
        self.pending_markers.push(SubsectionMarker {
            clip_index,
            label,
            auto_next,
        });
        Ok(())
    }

    /// Freeze the buffer into a closed slide and clear it.
    ///
    /// Fails when the buffer is empty: a slide must render something. Markers
    /// that ended up at the slide's end (no clip was pushed after the last
    /// `mark_subsection`) are rejected, the slide's own end is not a marker.
    pub fn finalize(
        &mut self,
        options: &SceneOptions,
        loop_: bool,
        auto_next: bool,
        notes: String,
    ) -> Result<SlideConfig> {
        if self.clips.is_empty() {
            return Err(DeckError::ValidationError(
                "Cannot finalize a slide without any animation".to_string(),
            ));
        }

        let clips = std::mem::take(&mut self.clips);
        let reversed_clips = std::mem::take(&mut self.reversed_clips);
        let markers = std::mem::take(&mut self.pending_markers);

        if let Some(marker) = markers.iter().find(|m| m.clip_index >= clips.len()) {
            return Err(DeckError::ValidationError(format!(
                "Subsection marker at clip {} is not interior to a {}-clip slide",
                marker.clip_index,
                clips.len()
            )));
        }

        let reversed_animation_files = if options.skip_reversing || reversed_clips.is_empty() {
            None
        } else if reversed_clips.len() == clips.len() {
            // Reversed clips replay the slide back-to-front.
            let mut rev = reversed_clips;
            rev.reverse();
            Some(rev)
        } else {
            return Err(DeckError::ValidationError(format!(
                "Slide buffered {} reversed clips for {} forward clips",
                reversed_clips.len(),
                clips.len()
            )));
        };

        let slide = SlideConfig {
            animation_files: clips,
            loop_,
            auto_next,
            reversed_animation_files,
            notes,
            subsections: markers,
        };
        slide.validate(0)?;
        Ok(slide)
    }
}

/// Accumulates finalized slides for one scene.
#[derive(Debug, Default)]
pub struct DeckBuilder {
    slides: Vec<SlideConfig>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_slide(&mut self, slide: SlideConfig) {
        self.slides.push(slide);
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Close the deck. Fails when no slide was finalized.
    pub fn finalize(
        self,
        resolution: (u32, u32),
        background_color: String,
    ) -> Result<PresentationConfig> {
        if self.slides.is_empty() {
            return Err(DeckError::ValidationError(
                "Cannot finalize a presentation without any slide".to_string(),
            ));
        }
        let config = PresentationConfig {
            slides: self.slides,
            resolution,
            background_color,
        };
        config.validate()?;
        Ok(config)
    }
}
