// ABOUTME: Media backend abstraction over an external ffmpeg binary
// ABOUTME: Probes durations, extracts frames and remuxes clip sequences

use crate::errors::{DeckError, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Which frame of a clip stands in for it statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePosition {
    First,
    Last,
}

/// Capability interface over the media toolchain.
///
/// Implementations are selected once via explicit configuration
/// ([`BackendChoice`]), never by runtime introspection.
pub trait MediaBackend {
    /// Duration of a clip in seconds.
    fn probe_duration(&self, clip: &Path) -> Result<f64>;

    /// Write the first or last frame of a clip to `dest` (image format
    /// decided by the destination extension).
    fn extract_frame(&self, clip: &Path, position: FramePosition, dest: &Path) -> Result<()>;

    /// Concatenate a run of clips into one file. Lossless remux where the
    /// codec allows it, re-encode only as a fallback.
    fn concat_clips(&self, clips: &[PathBuf], dest: &Path) -> Result<()>;
}

/// Explicit, config-time backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    Ffmpeg,
    Null,
}

impl std::str::FromStr for BackendChoice {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ffmpeg" => Ok(BackendChoice::Ffmpeg),
            "null" => Ok(BackendChoice::Null),
            other => Err(DeckError::ValidationError(format!(
                "Unknown media backend '{}', expected 'ffmpeg' or 'null'",
                other
            ))),
        }
    }
}

pub fn create_backend(
    choice: BackendChoice,
    ffmpeg_path: Option<PathBuf>,
) -> std::sync::Arc<dyn MediaBackend + Send + Sync> {
    match choice {
        BackendChoice::Ffmpeg => std::sync::Arc::new(FfmpegBackend::new(ffmpeg_path)),
        BackendChoice::Null => std::sync::Arc::new(NullBackend::default()),
    }
}

/// Backend shelling out to `ffmpeg`/`ffprobe` binaries.
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    pub fn new(ffmpeg_path: Option<PathBuf>) -> Self {
        let ffmpeg = ffmpeg_path
            .or_else(|| std::env::var_os("FFMPEG_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        let ffprobe = match ffmpeg.file_stem() {
            // Keep ffprobe next to a custom ffmpeg binary.
            Some(stem) if stem == "ffmpeg" && ffmpeg.parent().is_some() => {
                let mut probe = ffmpeg.clone();
                probe.set_file_name(
                    ffmpeg
                        .file_name()
                        .map(|n| n.to_string_lossy().replace("ffmpeg", "ffprobe"))
                        .unwrap_or_else(|| "ffprobe".to_string()),
                );
                probe
            }
            _ => PathBuf::from("ffprobe"),
        };
        Self { ffmpeg, ffprobe }
    }

    fn run(&self, bin: &Path, args: &[&str], clip: &Path) -> Result<std::process::Output> {
        debug!("Running {:?} {:?}", bin, args);
        let output = Command::new(bin).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeckError::FfmpegNotFound(bin.to_path_buf())
            } else {
                DeckError::FileReadError(e)
            }
        })?;
        if !output.status.success() {
            return Err(DeckError::MediaError {
                clip: clip.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .last()
                    .unwrap_or("unknown ffmpeg failure")
                    .to_string(),
            });
        }
        Ok(output)
    }
}

impl MediaBackend for FfmpegBackend {
    fn probe_duration(&self, clip: &Path) -> Result<f64> {
        if !clip.exists() {
            return Err(DeckError::PathNotFoundError(clip.to_path_buf()));
        }
        let clip_str = clip.to_string_lossy().to_string();
        let output = self.run(
            &self.ffprobe,
            &[
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                &clip_str,
            ],
            clip,
        )?;
        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .map_err(|_| DeckError::MediaError {
                clip: clip.to_path_buf(),
                message: format!("could not parse duration from {:?}", text.trim()),
            })
    }

    fn extract_frame(&self, clip: &Path, position: FramePosition, dest: &Path) -> Result<()> {
        if !clip.exists() {
            return Err(DeckError::PathNotFoundError(clip.to_path_buf()));
        }
        let clip_str = clip.to_string_lossy().to_string();
        let dest_str = dest.to_string_lossy().to_string();
        match position {
            FramePosition::First => {
                self.run(
                    &self.ffmpeg,
                    &[
                        "-y", "-v", "error", "-i", &clip_str, "-frames:v", "1", &dest_str,
                    ],
                    clip,
                )?;
            }
            FramePosition::Last => {
                // Seek near the end and keep overwriting until the stream
                // runs out; the file left behind holds the final frame.
                self.run(
                    &self.ffmpeg,
                    &[
                        "-y", "-v", "error", "-sseof", "-1", "-i", &clip_str, "-update", "1",
                        "-frames:v", "120", &dest_str,
                    ],
                    clip,
                )?;
            }
        }
        Ok(())
    }

    fn concat_clips(&self, clips: &[PathBuf], dest: &Path) -> Result<()> {
        if clips.is_empty() {
            return Err(DeckError::ValidationError(
                "Cannot concatenate an empty list of clips".to_string(),
            ));
        }
        for clip in clips {
            if !clip.exists() {
                return Err(DeckError::PathNotFoundError(clip.clone()));
            }
        }
        if clips.len() == 1 {
            std::fs::copy(&clips[0], dest).map_err(DeckError::FileReadError)?;
            return Ok(());
        }

        let list_path = std::env::temp_dir().join(format!("clipdeck_{}.txt", uuid::Uuid::new_v4()));
        let mut list = String::new();
        for clip in clips {
            let absolute = std::fs::canonicalize(clip).map_err(DeckError::FileReadError)?;
            list.push_str(&format!("file '{}'\n", absolute.to_string_lossy()));
        }
        std::fs::write(&list_path, list).map_err(DeckError::FileReadError)?;

        let list_str = list_path.to_string_lossy().to_string();
        let dest_str = dest.to_string_lossy().to_string();

        // Remux first; fall back to a re-encode when the copy fails (mixed
        // codec parameters across clips).
        let remux = self.run(
            &self.ffmpeg,
            &[
                "-y", "-v", "error", "-f", "concat", "-safe", "0", "-i", &list_str, "-c", "copy",
                &dest_str,
            ],
            &clips[0],
        );
        let result = match remux {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Lossless remux failed ({}), re-encoding", e);
                self.run(
                    &self.ffmpeg,
                    &[
                        "-y", "-v", "error", "-f", "concat", "-safe", "0", "-i", &list_str,
                        &dest_str,
                    ],
                    &clips[0],
                )
                .map(|_| ())
            }
        };

        let _ = std::fs::remove_file(&list_path);
        result
    }
}

/// Metadata-only backend: useful for exports that need no pixel work and for
/// tests. Every clip reports a fixed nominal duration.
pub struct NullBackend {
    pub nominal_duration: f64,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self {
            nominal_duration: 1.0,
        }
    }
}

impl MediaBackend for NullBackend {
    fn probe_duration(&self, clip: &Path) -> Result<f64> {
        if !clip.exists() {
            return Err(DeckError::PathNotFoundError(clip.to_path_buf()));
        }
        Ok(self.nominal_duration)
    }

    fn extract_frame(&self, clip: &Path, _position: FramePosition, _dest: &Path) -> Result<()> {
        Err(DeckError::MediaError {
            clip: clip.to_path_buf(),
            message: "the null media backend cannot extract frames".to_string(),
        })
    }

    fn concat_clips(&self, clips: &[PathBuf], _dest: &Path) -> Result<()> {
        Err(DeckError::MediaError {
            clip: clips.first().cloned().unwrap_or_default(),
            message: "the null media backend cannot concatenate clips".to_string(),
        })
    }
}
