//! Final artifact delivery

use std::path::Path;

use teloxide::prelude::*;
use teloxide::types::InputFile;

use crate::core::AppResult;
use crate::telegram::Bot;

/// Uploads a video file with its caption.
pub async fn send_video_file(bot: &Bot, chat_id: ChatId, path: &Path, caption: &str) -> AppResult<()> {
    log::info!("Sending video {} to chat {}", path.display(), chat_id);
    bot.send_video(chat_id, InputFile::file(path.to_path_buf()))
        .caption(caption.to_string())
        .await?;
    Ok(())
}

/// Uploads an audio file with title/performer metadata and a caption.
pub async fn send_audio_file(
    bot: &Bot,
    chat_id: ChatId,
    path: &Path,
    title: &str,
    performer: &str,
    caption: &str,
) -> AppResult<()> {
    log::info!("Sending audio {} to chat {}", path.display(), chat_id);
    let mut request = bot
        .send_audio(chat_id, InputFile::file(path.to_path_buf()))
        .title(title.to_string())
        .caption(caption.to_string());
    if !performer.is_empty() {
        request = request.performer(performer.to_string());
    }
    request.await?;
    Ok(())
}
