//! Audio conversion to MP3

use std::path::Path;

use tokio::process::Command;

use super::{ConversionError, ConversionResult};
use crate::core::config;

/// Convert a fetched audio container to MP3 at the best VBR quality.
///
/// `-map a` drops any cover-art video track some containers carry.
pub async fn convert_to_mp3<P: AsRef<Path>>(input_path: P, output_path: P) -> ConversionResult<()> {
    let input = input_path.as_ref();

    if !input.exists() {
        return Err(ConversionError::InputNotFound(input.display().to_string()));
    }

    let mut cmd = Command::new(&*config::FFMPEG_BIN);
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-codec:a")
        .arg("libmp3lame")
        .arg("-q:a")
        .arg("0")
        .arg("-map")
        .arg("a")
        .arg(output_path.as_ref());

    let output = cmd.output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("FFmpeg audio conversion error: {}", stderr);
        return Err(ConversionError::Ffmpeg(stderr.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_convert_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.m4a");
        let out = dir.path().join("out.mp3");

        let result = convert_to_mp3(missing.as_path(), out.as_path()).await;
        assert!(matches!(result, Err(ConversionError::InputNotFound(_))));
    }
}
