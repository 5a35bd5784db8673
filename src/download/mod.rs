//! Metadata extraction, stream selection, and the download pipeline

pub mod fetch;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod streams;

// Re-exports for convenience
pub use metadata::{extract_media_info, MediaInfo, StreamDescriptor};
pub use pipeline::{run_audio_operation, run_video_operation};
pub use progress::{DownloadStatus, ProgressMessage};
