// ABOUTME: Error types for the clipdeck application
// ABOUTME: Provides structured error handling for config, media and export stages

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Invalid presentation config {path:?}: {message}")]
    ConfigError { path: PathBuf, message: String },

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Missing clip file {clip:?} (slide {slide_index})")]
    MissingClip { slide_index: usize, clip: PathBuf },

    #[error("Media operation failed on {clip:?}: {message}")]
    MediaError { clip: PathBuf, message: String },

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("HTML generation error: {0}")]
    HtmlError(String),

    #[error("PDF generation error: {0}")]
    PdfError(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("ffmpeg binary not found at {0:?}. Make sure ffmpeg is installed.")]
    FfmpegNotFound(PathBuf),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

// Implement conversion from anyhow::Error to our DeckError
impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

// Implement conversion from zip errors
impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

impl From<image::ImageError> for DeckError {
    fn from(err: image::ImageError) -> Self {
        DeckError::PdfError(format!("Image operation failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
