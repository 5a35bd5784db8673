//! Core utilities, configuration, and common features

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::init_logger;
pub use utils::{escape_filename, escape_markdown_v2};
