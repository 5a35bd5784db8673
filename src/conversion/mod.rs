//! FFmpeg invocation
//!
//! The transcoder is optional at runtime: availability is probed before any
//! merge/convert step so its absence degrades the operation instead of
//! crashing it. FFmpeg is always invoked with an argument array via
//! `tokio::process::Command`; no shell is involved anywhere, so titles and
//! paths cannot smuggle command fragments.

pub mod audio;
pub mod video;

use thiserror::Error;

use crate::core::config;

/// Errors that can occur during merge/conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConversionResult<T> = Result<T, ConversionError>;

impl From<ConversionError> for crate::core::AppError {
    fn from(err: ConversionError) -> Self {
        crate::core::AppError::Transcode(err.to_string())
    }
}

/// Check if ffmpeg is available
pub async fn check_ffmpeg() -> bool {
    tokio::process::Command::new(&*config::FFMPEG_BIN)
        .arg("-version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}
