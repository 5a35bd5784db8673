//! Media metadata extraction via yt-dlp
//!
//! One `yt-dlp -J` invocation per submitted link. The JSON dump is parsed
//! into an immutable [`MediaInfo`] that the selection flow shares via `Arc`;
//! a new link always produces a new `MediaInfo`, never a mutation.

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use url::Url;

use crate::core::config;
use crate::core::{AppError, AppResult};

/// One extracted video: display metadata plus every selectable encoding.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub title: String,
    pub author: String,
    pub duration_secs: u64,
    pub view_count: u64,
    pub webpage_url: String,
    pub streams: Vec<StreamDescriptor>,
}

/// One selectable encoding of a media handle.
///
/// Immutable once obtained. `progressive` means video and audio share one
/// container and no merge step is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub format_id: String,
    pub container: String,
    pub height: Option<u32>,
    pub audio_only: bool,
    pub progressive: bool,
    pub filesize: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: String,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<f64>,
}

fn codec_present(codec: &Option<String>) -> bool {
    codec.as_deref().map(|c| !c.is_empty() && c != "none").unwrap_or(false)
}

impl RawFormat {
    /// Storyboards and other track-less entries return `None`.
    fn into_descriptor(self) -> Option<StreamDescriptor> {
        let has_video = codec_present(&self.vcodec);
        let has_audio = codec_present(&self.acodec);
        if !has_video && !has_audio {
            return None;
        }

        let filesize = self.filesize.or_else(|| self.filesize_approx.map(|s| s as u64));

        Some(StreamDescriptor {
            format_id: self.format_id,
            container: self.ext,
            height: if has_video { self.height } else { None },
            audio_only: has_audio && !has_video,
            progressive: has_video && has_audio,
            filesize,
        })
    }
}

/// Parses a `yt-dlp -J` dump into [`MediaInfo`].
pub(crate) fn parse_media_info(json: &str, fallback_url: &str) -> AppResult<MediaInfo> {
    let raw: RawInfo =
        serde_json::from_str(json).map_err(|e| AppError::Extraction(format!("unreadable metadata: {}", e)))?;

    let streams: Vec<StreamDescriptor> = raw.formats.into_iter().filter_map(RawFormat::into_descriptor).collect();

    Ok(MediaInfo {
        title: if raw.title.is_empty() {
            "Unknown Title".to_string()
        } else {
            raw.title
        },
        author: raw.uploader.or(raw.channel).unwrap_or_default(),
        duration_secs: raw.duration.map(|d| d as u64).unwrap_or(0),
        view_count: raw.view_count.unwrap_or(0),
        webpage_url: raw.webpage_url.unwrap_or_else(|| fallback_url.to_string()),
        streams,
    })
}

/// Extracts the first helpful line from yt-dlp stderr.
fn extraction_reason(stderr: &str) -> String {
    let line = stderr
        .lines()
        .find(|l| l.contains("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .unwrap_or("unknown extraction failure");
    line.trim().chars().take(200).collect()
}

/// Runs `yt-dlp -J` for the given URL and parses the result.
///
/// Fails with [`AppError::Extraction`] on spawn failure, timeout, non-zero
/// exit, or unreadable JSON. Nothing is written to disk.
pub async fn extract_media_info(url: &Url) -> AppResult<MediaInfo> {
    let ytdl_bin = &*config::YTDL_BIN;
    let args = ["-J", "--no-playlist", "--no-check-certificate", url.as_str()];
    log::debug!("yt-dlp command for metadata: {} {}", ytdl_bin, args.join(" "));

    let output = timeout(
        config::download::ytdlp_timeout(),
        Command::new(ytdl_bin).args(args).output(),
    )
    .await
    .map_err(|_| {
        log::error!(
            "yt-dlp metadata command timed out after {} seconds for {}",
            config::download::YTDLP_TIMEOUT_SECS,
            url
        );
        AppError::Extraction("metadata fetch timed out".to_string())
    })?
    .map_err(|e| {
        log::error!("Failed to execute {}: {}", ytdl_bin, e);
        AppError::Extraction(format!("failed to run {}: {}", ytdl_bin, e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("yt-dlp metadata fetch failed for {}: {}", url, stderr.trim());
        return Err(AppError::Extraction(extraction_reason(&stderr)));
    }

    let json = String::from_utf8_lossy(&output.stdout);
    parse_media_info(&json, url.as_str())
}
