//! Video/audio multiplexing
//!
//! Remux-only merge: the video stream is copied bit-for-bit, the audio
//! track is encoded to AAC so the result plays everywhere Telegram does.

use std::path::Path;

use tokio::process::Command;

use super::{ConversionError, ConversionResult};
use crate::core::config;

/// Merge a video-only file and an audio-only file into one mp4.
///
/// # Arguments
/// * `video_path` - Path to the video-only input
/// * `audio_path` - Path to the audio-only input
/// * `output_path` - Path for the merged mp4
pub async fn merge_video_audio<P: AsRef<Path>>(video_path: P, audio_path: P, output_path: P) -> ConversionResult<()> {
    let video = video_path.as_ref();
    let audio = audio_path.as_ref();

    if !video.exists() {
        return Err(ConversionError::InputNotFound(video.display().to_string()));
    }
    if !audio.exists() {
        return Err(ConversionError::InputNotFound(audio.display().to_string()));
    }

    let mut cmd = Command::new(&*config::FFMPEG_BIN);
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-i")
        .arg(video)
        .arg("-i")
        .arg(audio)
        .arg("-c:v")
        .arg("copy")
        .arg("-c:a")
        .arg("aac")
        .arg(output_path.as_ref());

    let output = cmd.output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("FFmpeg merge error: {}", stderr);
        return Err(ConversionError::Ffmpeg(stderr.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_merge_rejects_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        let out = dir.path().join("out.mp4");

        let result = merge_video_audio(missing.as_path(), missing.as_path(), out.as_path()).await;
        assert!(matches!(result, Err(ConversionError::InputNotFound(_))));
    }
}
