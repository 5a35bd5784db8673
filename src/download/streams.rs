//! Stream selection logic
//!
//! The quality list shown to the user must be deterministic: the handlers
//! snapshot the format ids in rendered order, and selection resolves
//! against that snapshot, so the functions here only need a stable total
//! order, not identity across metadata refreshes.

use crate::core::utils::format_size;
use crate::download::metadata::{MediaInfo, StreamDescriptor};

/// Container accepted for video delivery (plays inline in Telegram).
pub const VIDEO_CONTAINER: &str = "mp4";

/// Preferred container for the separate audio track.
pub const AUDIO_CONTAINER: &str = "m4a";

/// All selectable video encodings, sorted by resolution descending.
///
/// Filters to the accepted container, orders by height desc / filesize desc
/// / format_id asc, and keeps one entry per height so the keyboard stays
/// short. The ordering is a pure function of the stream list: recomputing
/// it over the same `MediaInfo` always yields the same sequence.
pub fn video_options(media: &MediaInfo) -> Vec<StreamDescriptor> {
    let mut options: Vec<StreamDescriptor> = media
        .streams
        .iter()
        .filter(|s| !s.audio_only && s.container == VIDEO_CONTAINER && s.height.is_some())
        .cloned()
        .collect();

    options.sort_by(|a, b| {
        b.height
            .cmp(&a.height)
            .then(b.filesize.cmp(&a.filesize))
            .then(a.format_id.cmp(&b.format_id))
    });
    options.dedup_by_key(|s| s.height);

    options
}

/// Best audio-only encoding: first match for the accepted audio container,
/// falling back to any audio-only stream.
pub fn best_audio(media: &MediaInfo) -> Option<StreamDescriptor> {
    media
        .streams
        .iter()
        .find(|s| s.audio_only && s.container == AUDIO_CONTAINER)
        .or_else(|| media.streams.iter().find(|s| s.audio_only))
        .cloned()
}

/// Button label for one video option, e.g. `"1080p (45.2 MB)"`.
pub fn option_label(stream: &StreamDescriptor) -> String {
    let resolution = resolution_label(stream);
    match stream.filesize {
        Some(bytes) => format!("{} ({})", resolution, format_size(bytes)),
        None => resolution,
    }
}

/// `"720p"` for a video stream, `"audio"` otherwise.
pub fn resolution_label(stream: &StreamDescriptor) -> String {
    match stream.height {
        Some(h) => format!("{}p", h),
        None => "audio".to_string(),
    }
}
