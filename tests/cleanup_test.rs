//! Integration tests for the scratch-file cleanup discipline

use std::sync::Arc;

use teloxide::types::ChatId;

use tubka::session::SessionRegistry;
use tubka::TempFiles;

#[test]
fn cleanup_removes_registered_files_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("video_1_123.mp4");
    let audio = dir.path().join("audio_1_123.m4a");
    let merged = dir.path().join("final_1_123.mp4");
    std::fs::write(&video, b"v").unwrap();
    std::fs::write(&audio, b"a").unwrap();
    // `merged` is registered before ffmpeg would have produced it, so
    // cleanup must tolerate it never existing.

    let pending = TempFiles::new();
    pending.register(&video);
    pending.register(&audio);
    pending.register(&merged);

    pending.cleanup();
    assert!(!video.exists());
    assert!(!audio.exists());

    // Second invocation over the same set: all paths absent, no panic.
    pending.cleanup();
}

#[test]
fn failed_extraction_leaves_no_pending_files() {
    // The handler only registers paths after a pipeline starts; a link that
    // fails extraction never reaches that point.
    let registry = SessionRegistry::new();
    let chat = ChatId(7);

    registry.set_link(chat, "https://unreachable.example/watch?v=broken");

    assert!(registry.media(chat).is_none());
    assert!(registry.pending(chat).paths().is_empty());
    assert!(!registry.is_busy(chat));
}

#[test]
fn superseded_operation_keeps_its_own_scratch_set() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SessionRegistry::new();
    let chat = ChatId(8);

    let media = Arc::new(tubka::MediaInfo {
        title: "first".to_string(),
        author: String::new(),
        duration_secs: 1,
        view_count: 0,
        webpage_url: "https://example.com/1".to_string(),
        streams: vec![],
    });

    registry.replace_media(chat, media.clone());
    let old_pending = registry.pending(chat);
    let old_file = dir.path().join("old.mp4");
    std::fs::write(&old_file, b"x").unwrap();
    old_pending.register(&old_file);

    // User submits a new link mid-operation: the session swaps handles.
    registry.replace_media(chat, media);
    assert!(registry.pending(chat).paths().is_empty());

    // The superseded operation still cleans up what it created.
    old_pending.cleanup();
    assert!(!old_file.exists());
}
