//! Progress reporting for the download pipeline
//!
//! One status message per operation, edited in place as the pipeline moves
//! through its milestones. Percentage updates during the fetch are gated by
//! [`UpdateThrottle`] so a chatty downloader cannot flood the transport.

use std::time::Instant;

use teloxide::prelude::*;
use teloxide::types::MessageId;

use crate::core::config;
use crate::core::utils::escape_markdown_v2 as escape_markdown;
use crate::telegram::Bot;

/// Download state for displaying progress to the user.
#[derive(Debug, Clone)]
pub enum DownloadStatus {
    /// Extraction done, download about to start
    Starting { title: String },
    /// Download in progress with a progress bar
    Downloading { title: String, percent: u8 },
    /// FFmpeg is multiplexing the separate video and audio files
    Merging { title: String },
    /// FFmpeg is converting the fetched audio to mp3
    Converting { title: String },
    /// Graceful degradation notice (e.g. ffmpeg missing)
    Degraded { title: String, note: String },
    /// Sending the final artifact to the Telegram server
    Uploading { title: String },
    /// Operation finished
    Success { title: String },
    /// Operation failed
    Error { title: String, error: String },
}

impl DownloadStatus {
    /// Formatted MarkdownV2 text for the current state.
    pub fn to_message(&self) -> String {
        match self {
            DownloadStatus::Starting { title } => {
                format!("🎬 *{}*\n\n⏳ Starting download\\.\\.\\.", escape_markdown(title))
            }
            DownloadStatus::Downloading { title, percent } => {
                format!(
                    "🎬 *{}*\n\n📥 Downloading: {}%\n{}",
                    escape_markdown(title),
                    percent,
                    progress_bar(*percent)
                )
            }
            DownloadStatus::Merging { title } => {
                format!("🎬 *{}*\n\n⚙️ Merging video and audio\\.\\.\\.", escape_markdown(title))
            }
            DownloadStatus::Converting { title } => {
                format!("🎵 *{}*\n\n⚙️ Converting to MP3\\.\\.\\.", escape_markdown(title))
            }
            DownloadStatus::Degraded { title, note } => {
                format!("🎬 *{}*\n\n⚠️ {}", escape_markdown(title), escape_markdown(note))
            }
            DownloadStatus::Uploading { title } => {
                format!("🎬 *{}*\n\n📤 Uploading\\.\\.\\.", escape_markdown(title))
            }
            DownloadStatus::Success { title } => {
                format!("🎬 *{}*\n\n✅ Complete\\.", escape_markdown(title))
            }
            DownloadStatus::Error { title, error } => {
                format!("🎬 *{}*\n\n❌ Error: {}", escape_markdown(title), escape_markdown(error))
            }
        }
    }
}

/// Classic ten-segment progress bar: `[█████░░░░░]`.
fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = (percent / 10) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Manages the single status message of one operation.
///
/// The first `update` sends the message; later ones edit it in place. When
/// the flow already produced a message (the format prompt), `attach` reuses
/// it instead of posting a second bubble.
pub struct ProgressMessage {
    pub chat_id: ChatId,
    pub message_id: Option<MessageId>,
}

impl ProgressMessage {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            message_id: None,
        }
    }

    /// Reuses an existing message (e.g. the quality prompt) for status edits.
    pub fn attach(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id: Some(message_id),
        }
    }

    /// Sends or updates the status message.
    ///
    /// "Message is not modified" responses are normal (identical text after
    /// a throttled burst) and are swallowed. Any other edit failure falls
    /// back to sending a fresh message.
    pub async fn update(&mut self, bot: &Bot, status: DownloadStatus) -> ResponseResult<()> {
        let text = status.to_message();

        if let Some(msg_id) = self.message_id {
            match bot
                .edit_message_text(self.chat_id, msg_id, text.clone())
                .parse_mode(teloxide::types::ParseMode::MarkdownV2)
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) => {
                    if e.to_string().contains("message is not modified") {
                        return Ok(());
                    }
                    log::warn!("Failed to edit status message: {}. Sending a new one.", e);
                }
            }
        }

        let msg = bot
            .send_message(self.chat_id, text)
            .parse_mode(teloxide::types::ParseMode::MarkdownV2)
            .await?;
        self.message_id = Some(msg.id);
        Ok(())
    }
}

/// Gate for percentage edits: the first report always passes, later ones
/// only when the percent advanced by at least 5 points or at least 2
/// seconds elapsed since the last edit. Progress never moves backwards.
#[derive(Debug)]
pub struct UpdateThrottle {
    last_percent: u8,
    last_emit: Option<Instant>,
}

impl UpdateThrottle {
    pub fn new() -> Self {
        Self {
            last_percent: 0,
            last_emit: None,
        }
    }

    pub fn should_emit(&mut self, percent: u8) -> bool {
        self.should_emit_at(percent, Instant::now())
    }

    fn should_emit_at(&mut self, percent: u8, now: Instant) -> bool {
        let percent = percent.clamp(self.last_percent, 100);

        let due = match self.last_emit {
            None => true,
            Some(last) => {
                percent.saturating_sub(self.last_percent) >= config::progress::MIN_PERCENT_STEP
                    || now.duration_since(last) >= config::progress::min_interval()
            }
        };

        if due {
            self.last_percent = percent;
            self.last_emit = Some(now);
        }
        due
    }
}

impl Default for UpdateThrottle {
    fn default() -> Self {
        Self::new()
    }
}

/// Update handler passed into the fetch step.
///
/// The fetch loop awaits `report` directly on the event loop, so progress
/// edits ride the same cooperative scheduling as everything else.
pub struct DownloadReporter<'a> {
    bot: &'a Bot,
    message: &'a mut ProgressMessage,
    title: &'a str,
    throttle: UpdateThrottle,
}

impl<'a> DownloadReporter<'a> {
    pub fn new(bot: &'a Bot, message: &'a mut ProgressMessage, title: &'a str) -> Self {
        Self {
            bot,
            message,
            title,
            throttle: UpdateThrottle::new(),
        }
    }

    pub async fn report(&mut self, percent: u8) {
        if !self.throttle.should_emit(percent) {
            return;
        }
        let status = DownloadStatus::Downloading {
            title: self.title.to_string(),
            percent: percent.min(100),
        };
        if let Err(e) = self.message.update(self.bot, status).await {
            log::warn!("Progress update failed: {}", e);
        }
    }
}
