use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable.
/// The process refuses to start when neither is set (checked in main).
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Cached ffmpeg binary path
/// Read once at startup from FFMPEG_BIN environment variable or defaults to "ffmpeg"
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// Scratch folder for in-flight downloads
/// Read from DOWNLOAD_FOLDER environment variable, defaults to "downloads".
/// Supports tilde (~) expansion for home directory; created at startup if absent.
pub static DOWNLOAD_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "downloads".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Tilde-expanded scratch directory path.
pub fn scratch_dir() -> String {
    shellexpand::tilde(&*DOWNLOAD_FOLDER).into_owned()
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for yt-dlp metadata and fetch commands (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240; // 4 minutes, to avoid timeouts on slow metadata fetches

    /// Global timeout for one whole download operation (in seconds)
    pub const GLOBAL_TIMEOUT_SECS: u64 = 600; // 10 minutes

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }

    /// Whole-operation timeout duration
    pub fn global_timeout() -> Duration {
        Duration::from_secs(GLOBAL_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// HTTP client timeout for Telegram API calls (in seconds).
    /// Large uploads can legitimately take minutes.
    pub const TIMEOUT_SECS: u64 = 600;

    /// Telegram client timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Progress reporting configuration
pub mod progress {
    use super::Duration;

    /// Minimum percent advance between two progress edits
    pub const MIN_PERCENT_STEP: u8 = 5;

    /// Minimum time between two progress edits (in seconds)
    pub const MIN_INTERVAL_SECS: u64 = 2;

    /// Minimum interval duration
    pub fn min_interval() -> Duration {
        Duration::from_secs(MIN_INTERVAL_SECS)
    }
}

/// User-facing formatting configuration
pub mod ui {
    /// Maximum title length shown in the format prompt
    pub const TITLE_MAX_CHARS: usize = 50;
}
