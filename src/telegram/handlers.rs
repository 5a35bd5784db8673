//! Dispatcher schema and the selection flow handlers
//!
//! The per-user state machine lives here: link received -> video/audio
//! choice -> quality choice -> spawned pipeline. Every failure path answers
//! the user and leaves the session idle; the pipeline owns cleanup.

use std::sync::Arc;

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::MessageId;
use url::Url;

use crate::download::metadata::extract_media_info;
use crate::download::pipeline::{run_audio_operation, run_video_operation};
use crate::download::progress::ProgressMessage;
use crate::download::streams;
use crate::session::SessionRegistry;
use crate::telegram::bot::{Command, WELCOME_TEXT};
use crate::telegram::keyboard::{self, callback};
use crate::telegram::Bot;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies handed to every handler invocation.
#[derive(Clone)]
pub struct HandlerDeps {
    pub sessions: SessionRegistry,
}

impl HandlerDeps {
    pub fn new(sessions: SessionRegistry) -> Self {
        Self { sessions }
    }
}

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Returns a handler tree usable with teloxide's Dispatcher; the same
/// schema serves production and integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler())
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(|bot: Bot, msg: Message, cmd: Command| async move {
            match cmd {
                Command::Start => {
                    bot.send_message(msg.chat.id, WELCOME_TEXT).await?;
                }
            }
            Ok(())
        })
}

/// Plain text messages are treated as link submissions.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|t| !t.starts_with('/')).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_link(bot, msg, deps).await }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move { handle_callback(bot, q, deps).await }
    })
}

/// Link received: extract metadata and present the video/audio choice.
async fn handle_link(bot: Bot, msg: Message, deps: HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or_default().trim();

    let url = match Url::parse(text) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => u,
        _ => {
            bot.send_message(chat_id, "❌ That doesn't look like a link. Send me a video URL.")
                .await?;
            return Ok(());
        }
    };

    if deps.sessions.is_busy(chat_id) {
        bot.send_message(
            chat_id,
            "⏳ I'm still working on your previous request. Wait for it to finish.",
        )
        .await?;
        return Ok(());
    }

    deps.sessions.set_link(chat_id, url.as_str());
    let status = bot.send_message(chat_id, "⏳ Analyzing video...").await?;

    match extract_media_info(&url).await {
        Ok(info) => {
            log::info!("Extracted '{}' ({} streams) for chat {}", info.title, info.streams.len(), chat_id);
            let media = Arc::new(info);
            deps.sessions.replace_media(chat_id, Arc::clone(&media));
            bot.edit_message_text(chat_id, status.id, keyboard::options_prompt(&media))
                .reply_markup(keyboard::options_keyboard())
                .await?;
        }
        Err(e) => {
            log::error!("Extraction failed for {} (chat {}): {:?}", url, chat_id, e);
            bot.edit_message_text(chat_id, status.id, format!("❌ {}", e.user_message()))
                .await?;
        }
    }
    Ok(())
}

/// Routes `dl:*` callback tokens to the flow steps.
async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let Some((chat_id, message_id)) = q.message.as_ref().map(|m| (m.chat().id, m.id())) else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    bot.answer_callback_query(q.id).await?;

    match data.as_str() {
        callback::VIDEO => show_quality_list(&bot, chat_id, message_id, &deps).await,
        callback::AUDIO => begin_audio(&bot, chat_id, message_id, &deps).await,
        callback::BACK => show_options(&bot, chat_id, message_id, &deps).await,
        other => {
            if let Some(index) = other.strip_prefix(callback::RES_PREFIX) {
                begin_video(&bot, chat_id, message_id, &deps, index).await
            } else {
                log::warn!("Unknown callback data from chat {}: {}", chat_id, other);
                Ok(())
            }
        }
    }
}

/// Replaces the prompt with a fail-fast error; the session stays idle.
async fn fail_fast(bot: &Bot, chat_id: ChatId, message_id: MessageId, reason: &str) -> Result<(), HandlerError> {
    let text = format!("❌ {}", reason);
    if bot.edit_message_text(chat_id, message_id, text.clone()).await.is_err() {
        bot.send_message(chat_id, text).await?;
    }
    Ok(())
}

/// "video" chosen: render the quality list and snapshot its order.
async fn show_quality_list(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(media) = deps.sessions.media(chat_id) else {
        return fail_fast(bot, chat_id, message_id, "Session expired. Send the link again.").await;
    };

    let options = streams::video_options(&media);
    if options.is_empty() {
        return fail_fast(bot, chat_id, message_id, "No suitable video streams found.").await;
    }

    deps.sessions
        .set_quality_snapshot(chat_id, options.iter().map(|s| s.format_id.clone()).collect());

    bot.edit_message_text(chat_id, message_id, keyboard::QUALITY_PROMPT)
        .reply_markup(keyboard::quality_keyboard(&options))
        .await?;
    Ok(())
}

/// "back" tapped: re-render the option prompt from the stored metadata,
/// without contacting the extractor again.
async fn show_options(bot: &Bot, chat_id: ChatId, message_id: MessageId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(media) = deps.sessions.media(chat_id) else {
        return fail_fast(bot, chat_id, message_id, "Session expired. Send the link again.").await;
    };

    bot.edit_message_text(chat_id, message_id, keyboard::options_prompt(&media))
        .reply_markup(keyboard::options_keyboard())
        .await?;
    Ok(())
}

/// "audio" chosen: claim the operation slot and spawn the audio pipeline.
async fn begin_audio(bot: &Bot, chat_id: ChatId, message_id: MessageId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(media) = deps.sessions.media(chat_id) else {
        return fail_fast(bot, chat_id, message_id, "Session expired. Send the link again.").await;
    };

    let Some(guard) = deps.sessions.try_begin_operation(chat_id) else {
        bot.send_message(chat_id, "⏳ I'm still working on your previous request.")
            .await?;
        return Ok(());
    };

    let pending = deps.sessions.pending(chat_id);
    let progress = ProgressMessage::attach(chat_id, message_id);
    tokio::spawn(run_audio_operation(bot.clone(), chat_id, media, pending, progress, guard));
    Ok(())
}

/// Quality index tapped: resolve it against the rendered snapshot and
/// spawn the video pipeline. Anything that doesn't map cleanly onto the
/// rendered list fails fast without starting a download.
async fn begin_video(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    index: &str,
) -> Result<(), HandlerError> {
    let Some(media) = deps.sessions.media(chat_id) else {
        return fail_fast(bot, chat_id, message_id, "Session expired. Send the link again.").await;
    };

    let Ok(index) = index.parse::<usize>() else {
        return fail_fast(bot, chat_id, message_id, "That selection didn't make sense. Send the link again.").await;
    };

    let Some(format_id) = deps.sessions.resolve_snapshot(chat_id, index) else {
        return fail_fast(
            bot,
            chat_id,
            message_id,
            "That quality is no longer available. Send the link again.",
        )
        .await;
    };

    let Some(selected) = media.streams.iter().find(|s| s.format_id == format_id).cloned() else {
        return fail_fast(
            bot,
            chat_id,
            message_id,
            "That quality is no longer available. Send the link again.",
        )
        .await;
    };

    let Some(guard) = deps.sessions.try_begin_operation(chat_id) else {
        bot.send_message(chat_id, "⏳ I'm still working on your previous request.")
            .await?;
        return Ok(());
    };

    let pending = deps.sessions.pending(chat_id);
    let progress = ProgressMessage::attach(chat_id, message_id);
    tokio::spawn(run_video_operation(
        bot.clone(),
        chat_id,
        media,
        selected,
        pending,
        progress,
        guard,
    ));
    Ok(())
}
