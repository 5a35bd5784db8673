//! Bot initialization and command definitions

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
}

/// Welcome text for /start, mirrored in the command description.
pub const WELCOME_TEXT: &str = "🎥 Video Downloader Bot 🎥\n\n\
Send me a video link, and I'll help you download:\n\
• Video in various qualities\n\
• Audio in MP3 format\n\n\
How to use:\n\
1. Paste a video link\n\
2. Choose video or audio\n\
3. Select quality (for video)\n\
4. Wait for download\n\n\
Let's start! Send me a link 🔗";

/// Creates a Bot instance with an explicit HTTP client timeout.
///
/// Large uploads through the Bot API can legitimately take minutes, so the
/// default reqwest timeout is far too short.
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the HTTP client
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(config::BOT_TOKEN.clone(), client))
}

/// Sets up bot commands in the Telegram UI
///
/// # Arguments
/// * `bot` - Bot instance to configure
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![BotCommand::new("start", "show the welcome message")])
        .await?;

    Ok(())
}
