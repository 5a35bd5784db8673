use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Metadata extraction (yt-dlp -J) errors
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Stream download errors
    #[error("Download error: {0}")]
    Download(String),

    /// FFmpeg merge/conversion errors
    #[error("Transcode error: {0}")]
    Transcode(String),

    /// User picked something that no longer maps to a stream
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short human-readable reason shown to the user in the standard
    /// "operation failed" message. Detail goes to the log, not the chat.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Extraction(_) => "Failed to process the video link. Check the URL and try again.".to_string(),
            AppError::Download(reason) => format!("Download failed: {}", reason),
            AppError::Transcode(_) => "Processing the media file failed.".to_string(),
            AppError::InvalidSelection(reason) => reason.clone(),
            AppError::Telegram(_) => "Sending the file failed. Try again later.".to_string(),
            AppError::Io(_) => "The server ran out of space or could not write the file.".to_string(),
            AppError::Url(_) => "That doesn't look like a valid link.".to_string(),
        }
    }
}
