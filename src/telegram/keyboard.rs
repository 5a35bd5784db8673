//! Prompt texts and inline keyboards for the selection flow
//!
//! Pure builders: everything here is a function of the extracted metadata,
//! so re-rendering (the "back" button) needs no network round trip.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::core::config;
use crate::core::utils::{format_duration, format_views, truncate_title};
use crate::download::metadata::{MediaInfo, StreamDescriptor};
use crate::download::streams::option_label;

/// Callback tokens for the selection flow.
pub mod callback {
    pub const VIDEO: &str = "dl:video";
    pub const AUDIO: &str = "dl:audio";
    pub const BACK: &str = "dl:back";
    pub const RES_PREFIX: &str = "dl:res:";
}

/// The video/audio choice prompt: title, duration, views.
pub fn options_prompt(media: &MediaInfo) -> String {
    format!(
        "📺 {}\n\n⏱ Duration: {}\n👁 Views: {}\n\nChoose download format:",
        truncate_title(&media.title, config::ui::TITLE_MAX_CHARS),
        format_duration(media.duration_secs),
        format_views(media.view_count),
    )
}

/// Two-button keyboard: video or audio.
pub fn options_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🎥 Download Video", callback::VIDEO)],
        vec![InlineKeyboardButton::callback("🎵 Download Audio (MP3)", callback::AUDIO)],
    ])
}

/// The quality list prompt.
pub const QUALITY_PROMPT: &str = "Select video quality:\n\nHigher quality = larger file size";

/// One row per quality option in rendered order, indices in the callback
/// data, plus a back row. The caller snapshots the same order into the
/// session so a tap maps back to exactly the row the user saw.
pub fn quality_keyboard(options: &[StreamDescriptor]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .enumerate()
        .map(|(i, stream)| {
            vec![InlineKeyboardButton::callback(
                format!("🎥 {}", option_label(stream)),
                format!("{}{}", callback::RES_PREFIX, i),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("↩️ Back", callback::BACK)]);
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use teloxide::types::InlineKeyboardButtonKind;

    fn media() -> MediaInfo {
        MediaInfo {
            title: "Never Gonna Give You Up".to_string(),
            author: "Rick Astley".to_string(),
            duration_secs: 213,
            view_count: 1234567,
            webpage_url: "https://youtube.example/watch?v=abc123".to_string(),
            streams: vec![],
        }
    }

    fn video(id: &str, height: u32, size: u64) -> StreamDescriptor {
        StreamDescriptor {
            format_id: id.to_string(),
            container: "mp4".to_string(),
            height: Some(height),
            audio_only: false,
            progressive: false,
            filesize: Some(size),
        }
    }

    fn callback_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("expected callback button, got {:?}", other),
        }
    }

    #[test]
    fn test_options_prompt_contents() {
        let prompt = options_prompt(&media());
        assert!(prompt.contains("Never Gonna Give You Up"));
        assert!(prompt.contains("3:33"));
        assert!(prompt.contains("1,234,567"));
        assert!(prompt.contains("Choose download format"));
    }

    #[test]
    fn test_options_prompt_truncates_long_titles() {
        let mut m = media();
        m.title = "y".repeat(80);
        let prompt = options_prompt(&m);
        assert!(prompt.contains(&format!("{}...", "y".repeat(50))));
        assert!(!prompt.contains(&"y".repeat(51)));
    }

    #[test]
    fn test_options_keyboard_tokens() {
        let kb = options_keyboard();
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert_eq!(callback_data(&kb.inline_keyboard[0][0]), "dl:video");
        assert_eq!(callback_data(&kb.inline_keyboard[1][0]), "dl:audio");
    }

    #[test]
    fn test_quality_keyboard_rows_follow_rendered_order() {
        let options = vec![
            video("137", 1080, 47_395_635),
            video("136", 720, 23_170_000),
            video("135", 480, 11_010_048),
        ];
        let kb = quality_keyboard(&options);

        // 3 qualities + back row
        assert_eq!(kb.inline_keyboard.len(), 4);
        assert_eq!(kb.inline_keyboard[0][0].text, "🎥 1080p (45.2 MB)");
        assert_eq!(callback_data(&kb.inline_keyboard[0][0]), "dl:res:0");
        assert_eq!(kb.inline_keyboard[1][0].text, "🎥 720p (22.1 MB)");
        assert_eq!(callback_data(&kb.inline_keyboard[1][0]), "dl:res:1");
        assert_eq!(callback_data(&kb.inline_keyboard[2][0]), "dl:res:2");
        assert_eq!(callback_data(&kb.inline_keyboard[3][0]), "dl:back");
    }
}
