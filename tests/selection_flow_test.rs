//! Integration tests for the selection flow invariants
//!
//! Exercises the library API the way the handlers do: extract -> render ->
//! snapshot -> resolve, without touching the network or a real bot.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use teloxide::types::ChatId;

use tubka::core::utils::escape_filename;
use tubka::download::pipeline::{plan_audio, plan_video, AudioPlan, VideoPlan};
use tubka::download::streams::{best_audio, option_label, video_options};
use tubka::session::SessionRegistry;
use tubka::telegram::keyboard;
use tubka::{MediaInfo, StreamDescriptor};

fn video(id: &str, height: u32, size: u64, progressive: bool) -> StreamDescriptor {
    StreamDescriptor {
        format_id: id.to_string(),
        container: "mp4".to_string(),
        height: Some(height),
        audio_only: false,
        progressive,
        filesize: Some(size),
    }
}

fn audio_stream(id: &str, container: &str) -> StreamDescriptor {
    StreamDescriptor {
        format_id: id.to_string(),
        container: container.to_string(),
        height: None,
        audio_only: true,
        progressive: false,
        filesize: Some(3_400_000),
    }
}

fn sample_media() -> MediaInfo {
    MediaInfo {
        title: "Never Gonna Give You Up".to_string(),
        author: "Rick Astley".to_string(),
        duration_secs: 213,
        view_count: 1234567,
        webpage_url: "https://youtube.example/watch?v=abc123".to_string(),
        streams: vec![
            // Deliberately unsorted, with a non-mp4 distractor
            video("135", 480, 11_010_048, false),
            audio_stream("140", "m4a"),
            video("137", 1080, 47_395_635, false),
            audio_stream("251", "webm"),
            video("22", 720, 23_170_000, true),
        ],
    }
}

#[test]
fn quality_listing_is_strictly_descending() {
    let media = sample_media();
    let options = video_options(&media);

    let heights: Vec<u32> = options.iter().filter_map(|s| s.height).collect();
    assert_eq!(heights, vec![1080, 720, 480]);
    for pair in heights.windows(2) {
        assert!(pair[0] > pair[1]);
    }
}

#[test]
fn rendered_labels_match_scenario() {
    let media = sample_media();
    let labels: Vec<String> = video_options(&media).iter().map(option_label).collect();
    assert_eq!(
        labels,
        vec![
            "1080p (45.2 MB)".to_string(),
            "720p (22.1 MB)".to_string(),
            "480p (10.5 MB)".to_string(),
        ]
    );
}

#[test]
fn index_selection_resolves_to_rendered_item_even_when_rederived() {
    let registry = SessionRegistry::new();
    let chat = ChatId(100);
    let media = Arc::new(sample_media());

    // Render: snapshot the ordered ids the way show_quality_list does.
    let rendered = video_options(&media);
    registry.set_quality_snapshot(chat, rendered.iter().map(|s| s.format_id.clone()).collect());

    // Selection: index 1 was shown as 720p.
    let format_id = registry.resolve_snapshot(chat, 1).unwrap();
    assert_eq!(format_id, "22");

    // Re-deriving the list yields the identical order, so index -> stream
    // agrees with the snapshot.
    let rederived = video_options(&media);
    assert_eq!(rederived[1].format_id, format_id);

    let selected = media.streams.iter().find(|s| s.format_id == format_id).unwrap();
    assert_eq!(selected.height, Some(720));
}

#[test]
fn out_of_range_selection_fails_fast() {
    let registry = SessionRegistry::new();
    let chat = ChatId(101);
    registry.set_quality_snapshot(chat, vec!["137".to_string()]);

    assert!(registry.resolve_snapshot(chat, 5).is_none());
    // A chat that never rendered a list has nothing to resolve.
    assert!(registry.resolve_snapshot(ChatId(999), 0).is_none());
}

#[test]
fn back_rerenders_from_stored_metadata() {
    let registry = SessionRegistry::new();
    let chat = ChatId(102);
    let media = Arc::new(sample_media());
    registry.replace_media(chat, Arc::clone(&media));

    // The "back" handler only needs the stored handle; the prompt is a pure
    // function of it, so no re-extraction can be involved.
    let stored = registry.media(chat).unwrap();
    let prompt = keyboard::options_prompt(&stored);
    assert!(prompt.contains("Never Gonna Give You Up"));
    assert!(prompt.contains("3:33"));
    assert!(prompt.contains("1,234,567"));
}

#[test]
fn progressive_selection_never_plans_transcode() {
    let media = sample_media();
    let progressive = media.streams.iter().find(|s| s.progressive).unwrap();

    for ffmpeg in [true, false] {
        let plan = plan_video(progressive, best_audio(&media).is_some(), ffmpeg).unwrap();
        assert_eq!(plan, VideoPlan::Direct);
    }
}

#[test]
fn non_progressive_selection_always_merges_when_transcoder_present() {
    let media = sample_media();
    let adaptive = media.streams.iter().find(|s| s.format_id == "137").unwrap();

    let plan = plan_video(adaptive, best_audio(&media).is_some(), true).unwrap();
    assert_eq!(plan, VideoPlan::Merge);
}

#[test]
fn transcoder_absence_degrades_instead_of_failing() {
    let media = sample_media();
    let adaptive = media.streams.iter().find(|s| s.format_id == "137").unwrap();

    let plan = plan_video(adaptive, best_audio(&media).is_some(), false).unwrap();
    assert_eq!(plan, VideoPlan::NoAudioFallback);

    assert_eq!(plan_audio(false), AudioPlan::SendOriginal);
}

#[test]
fn filename_sanitization_scenario() {
    let safe = escape_filename("Song: \"Best\" / Mix?");
    for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
        assert!(!safe.contains(c));
    }
    assert!(!safe.is_empty());
}
