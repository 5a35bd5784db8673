//! Tubka - Telegram bot for downloading video and audio from link-sharing sites
//!
//! This library provides all the core functionality for the Tubka bot:
//! metadata extraction, the per-user selection flow, the download/transcode
//! pipeline, and Telegram bot integration.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, and common utilities
//! - `download`: Metadata extraction, stream selection, and the download pipeline
//! - `conversion`: FFmpeg invocation (merge, audio conversion)
//! - `session`: Per-user session registry and scratch-file tracking
//! - `telegram`: Bot integration and handlers

pub mod conversion;
pub mod core;
pub mod download;
pub mod session;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use download::metadata::{MediaInfo, StreamDescriptor};
pub use session::{SessionRegistry, TempFiles};
pub use telegram::{schema, HandlerDeps};
