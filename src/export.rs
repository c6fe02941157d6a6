// ABOUTME: Shared export options, deterministic frame planning and atomic writes
// ABOUTME: Used by the HTML, PDF and PPTX converters

use crate::config::PresentationConfig;
use crate::errors::{DeckError, Result};
use crate::media::FramePosition;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which frame represents a slide (or a subsection span) statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePolicy {
    First,
    #[default]
    Last,
}

impl FromStr for FramePolicy {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "first" => Ok(FramePolicy::First),
            "last" => Ok(FramePolicy::Last),
            other => Err(DeckError::ValidationError(format!(
                "Unknown frame policy '{}', expected 'first' or 'last'",
                other
            ))),
        }
    }
}

/// How subsection markers influence an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubsectionMode {
    /// Ignore markers: one unit per slide.
    #[default]
    None,
    /// One unit per slide, scoped to the terminal subsection's span.
    Final,
    /// One unit per subsection boundary plus the terminal segment.
    All,
}

impl FromStr for SubsectionMode {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(SubsectionMode::None),
            "final" => Ok(SubsectionMode::Final),
            "all" => Ok(SubsectionMode::All),
            other => Err(DeckError::ValidationError(format!(
                "Unknown subsection mode '{}', expected 'none', 'final' or 'all'",
                other
            ))),
        }
    }
}

/// Named options shared by every exporter invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub frame_policy: FramePolicy,
    pub subsections: SubsectionMode,
}

/// One selected representative frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFrame {
    pub slide_index: usize,
    /// Which segment of the slide this frame represents, when splitting by
    /// subsection; `None` for whole-slide frames.
    pub segment: Option<usize>,
    pub clip: PathBuf,
    pub position: FramePosition,
}

fn frame_for_span(
    slide_index: usize,
    segment: Option<usize>,
    clips: &[PathBuf],
    span: (usize, usize),
    policy: FramePolicy,
) -> PlannedFrame {
    let (start, end) = span;
    match policy {
        FramePolicy::First => PlannedFrame {
            slide_index,
            segment,
            clip: clips[start].clone(),
            position: FramePosition::First,
        },
        FramePolicy::Last => PlannedFrame {
            slide_index,
            segment,
            clip: clips[end - 1].clone(),
            position: FramePosition::Last,
        },
    }
}

/// Deterministic frame selection for a whole presentation: the same config
/// and options always produce an identical plan.
pub fn frame_plan(config: &PresentationConfig, options: &ExportOptions) -> Result<Vec<PlannedFrame>> {
    config.validate()?;
    let mut plan = Vec::new();

    for (slide_index, slide) in config.slides.iter().enumerate() {
        let clips = &slide.animation_files;
        match options.subsections {
            SubsectionMode::None => {
                plan.push(frame_for_span(
                    slide_index,
                    None,
                    clips,
                    (0, clips.len()),
                    options.frame_policy,
                ));
            }
            SubsectionMode::Final => {
                let span = slide.segment_span(slide.segment_count() - 1);
                plan.push(frame_for_span(
                    slide_index,
                    None,
                    clips,
                    span,
                    options.frame_policy,
                ));
            }
            SubsectionMode::All => {
                for segment in 0..slide.segment_count() {
                    let span = slide.segment_span(segment);
                    plan.push(frame_for_span(
                        slide_index,
                        Some(segment),
                        clips,
                        span,
                        options.frame_policy,
                    ));
                }
            }
        }
    }

    Ok(plan)
}

/// Temporary sibling path for an artifact, so a failed export never leaves a
/// partial file at the destination.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact".to_string());
    let temp_name = format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

/// Atomically move a finished artifact into place.
pub fn commit_file(temp: &Path, dest: &Path) -> Result<()> {
    std::fs::rename(temp, dest).map_err(DeckError::FileReadError)
}

/// Fail fast when a referenced clip is missing, with enough context to tell
/// which slide broke the export.
pub fn require_clip(slide_index: usize, clip: &Path) -> Result<()> {
    if !clip.is_file() {
        return Err(DeckError::MissingClip {
            slide_index,
            clip: clip.to_path_buf(),
        });
    }
    Ok(())
}
