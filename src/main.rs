use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use tubka::conversion;
use tubka::core::{config, init_logger};
use tubka::session::SessionRegistry;
use tubka::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (missing token, logging,
/// scratch directory, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env before any config is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    // Catch panics from spawned handlers so they are at least logged
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("No BOT_TOKEN found in environment variables. Set it in .env or the environment.");
    }

    // Scratch directory for in-flight downloads
    let scratch = config::scratch_dir();
    std::fs::create_dir_all(&scratch)
        .map_err(|e| anyhow::anyhow!("Failed to create download folder {}: {}", scratch, e))?;
    log::info!("Scratch directory: {}", scratch);

    if conversion::check_ffmpeg().await {
        log::info!("ffmpeg found ({})", &*config::FFMPEG_BIN);
    } else {
        log::warn!(
            "ffmpeg not found ({}). Downloads will degrade: video without audio merge, audio without mp3 conversion.",
            &*config::FFMPEG_BIN
        );
    }

    let bot = create_bot()?;

    let me = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let sessions = SessionRegistry::new();
    let handler = schema(HandlerDeps::new(sessions));

    log::info!("Starting bot in polling mode");
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shut down");
    Ok(())
}
