//! Download/transcode pipeline
//!
//! Turns one selected stream into one delivered file. The shape of an
//! operation is decided up front by a pure planner ([`plan_video`],
//! [`plan_audio`]) so the failure/fallback rules are testable without
//! touching the network or ffmpeg. Every scratch path is registered for
//! cleanup the moment it is chosen, before the step that could fail, and
//! cleanup runs unconditionally at the end of the operation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use teloxide::prelude::*;
use tokio::time::timeout;

use crate::conversion;
use crate::core::utils::escape_filename;
use crate::core::{config, AppError, AppResult};
use crate::download::fetch::download_stream;
use crate::download::metadata::{MediaInfo, StreamDescriptor};
use crate::download::progress::{DownloadReporter, DownloadStatus, ProgressMessage};
use crate::download::streams;
use crate::session::{OperationGuard, TempFiles};
use crate::telegram::send::{send_audio_file, send_video_file};
use crate::telegram::Bot;

/// Role of one file produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    VideoOnly,
    AudioOnly,
    MergedFinal,
}

/// A file produced by the pipeline. Referenced by the session's scratch
/// set from the moment the path exists; deleted after delivery or failure.
#[derive(Debug)]
pub struct DownloadArtifact {
    pub path: PathBuf,
    pub role: ArtifactRole,
}

/// How a selected video encoding becomes one deliverable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPlan {
    /// Progressive stream: one fetch, the transcoder is never involved.
    Direct,
    /// Fetch video and audio separately, multiplex with ffmpeg.
    Merge,
    /// Transcoder unavailable: deliver the video-only file and say so.
    NoAudioFallback,
}

/// Decides the video pipeline shape.
///
/// A non-progressive selection with no compatible audio-only encoding
/// fails the whole operation before anything is downloaded.
pub fn plan_video(selected: &StreamDescriptor, has_audio_stream: bool, ffmpeg_available: bool) -> AppResult<VideoPlan> {
    if selected.progressive {
        return Ok(VideoPlan::Direct);
    }
    if !has_audio_stream {
        return Err(AppError::Download(
            "no compatible audio track found for this video".to_string(),
        ));
    }
    if ffmpeg_available {
        Ok(VideoPlan::Merge)
    } else {
        Ok(VideoPlan::NoAudioFallback)
    }
}

/// How a pure audio request is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioPlan {
    /// Convert the fetched container to mp3.
    ConvertToMp3,
    /// Transcoder unavailable: deliver the fetched container as-is.
    SendOriginal,
}

pub fn plan_audio(ffmpeg_available: bool) -> AudioPlan {
    if ffmpeg_available {
        AudioPlan::ConvertToMp3
    } else {
        AudioPlan::SendOriginal
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Runs the full video operation: fetch, optional merge, upload.
///
/// Spawned by the callback handler. Owns its scratch-file set and the
/// per-user operation slot; both are released on every exit path, so a
/// user whose session has since moved on still gets their files removed.
pub async fn run_video_operation(
    bot: Bot,
    chat_id: ChatId,
    media: Arc<MediaInfo>,
    selected: StreamDescriptor,
    pending: Arc<TempFiles>,
    mut progress: ProgressMessage,
    guard: OperationGuard,
) {
    let result = match timeout(
        config::download::global_timeout(),
        video_inner(&bot, chat_id, &media, &selected, &pending, &mut progress),
    )
    .await
    {
        Ok(inner) => inner,
        Err(_) => {
            log::error!(
                "Video operation timed out after {} seconds for chat {}",
                config::download::GLOBAL_TIMEOUT_SECS,
                chat_id
            );
            Err(AppError::Download("the operation timed out".to_string()))
        }
    };

    if let Err(e) = result {
        log::error!(
            "Video operation failed for chat {} ({}): {:?}",
            chat_id,
            media.webpage_url,
            e
        );
        let _ = progress
            .update(
                &bot,
                DownloadStatus::Error {
                    title: media.title.clone(),
                    error: e.user_message(),
                },
            )
            .await;
    }

    pending.cleanup();
    drop(guard);
}

async fn video_inner(
    bot: &Bot,
    chat_id: ChatId,
    media: &MediaInfo,
    selected: &StreamDescriptor,
    pending: &TempFiles,
    progress: &mut ProgressMessage,
) -> AppResult<()> {
    let title = &media.title;
    progress
        .update(bot, DownloadStatus::Starting { title: title.clone() })
        .await?;

    let ffmpeg_available = conversion::check_ffmpeg().await;
    let audio = streams::best_audio(media);
    let plan = plan_video(selected, audio.is_some(), ffmpeg_available)?;
    log::info!(
        "Video plan for chat {}: {:?} (format {}, ffmpeg available: {})",
        chat_id,
        plan,
        selected.format_id,
        ffmpeg_available
    );

    let scratch = config::scratch_dir();
    let stamp = unix_millis();
    let safe_title = escape_filename(title);
    let url = &media.webpage_url;

    let artifact = match plan {
        VideoPlan::Direct => {
            let path = PathBuf::from(format!("{}/{}_{}.mp4", scratch, safe_title, stamp));
            pending.register(&path);
            let mut reporter = DownloadReporter::new(bot, progress, title);
            download_stream(url, &selected.format_id, &path, &mut reporter).await?;
            DownloadArtifact {
                path,
                role: ArtifactRole::MergedFinal,
            }
        }
        VideoPlan::Merge => {
            let audio = audio.ok_or_else(|| AppError::Download("audio track disappeared".to_string()))?;

            let video_path = PathBuf::from(format!("{}/video_{}_{}.mp4", scratch, chat_id.0, stamp));
            pending.register(&video_path);
            {
                let mut reporter = DownloadReporter::new(bot, progress, title);
                download_stream(url, &selected.format_id, &video_path, &mut reporter).await?;
            }

            let audio_path = PathBuf::from(format!(
                "{}/audio_{}_{}.{}",
                scratch, chat_id.0, stamp, audio.container
            ));
            pending.register(&audio_path);
            {
                let mut reporter = DownloadReporter::new(bot, progress, title);
                download_stream(url, &audio.format_id, &audio_path, &mut reporter).await?;
            }

            progress
                .update(bot, DownloadStatus::Merging { title: title.clone() })
                .await?;

            let merged = PathBuf::from(format!("{}/{}_{}.mp4", scratch, safe_title, stamp));
            pending.register(&merged);
            conversion::video::merge_video_audio(video_path.as_path(), audio_path.as_path(), merged.as_path()).await?;

            DownloadArtifact {
                path: merged,
                role: ArtifactRole::MergedFinal,
            }
        }
        VideoPlan::NoAudioFallback => {
            let path = PathBuf::from(format!("{}/video_{}_{}.mp4", scratch, chat_id.0, stamp));
            pending.register(&path);
            let mut reporter = DownloadReporter::new(bot, progress, title);
            download_stream(url, &selected.format_id, &path, &mut reporter).await?;

            progress
                .update(
                    bot,
                    DownloadStatus::Degraded {
                        title: title.clone(),
                        note: "FFmpeg not found. Sending video without audio.".to_string(),
                    },
                )
                .await?;

            DownloadArtifact {
                path,
                role: ArtifactRole::VideoOnly,
            }
        }
    };

    log::info!(
        "Final artifact for chat {} ({:?}): {}",
        chat_id,
        artifact.role,
        artifact.path.display()
    );

    progress
        .update(bot, DownloadStatus::Uploading { title: title.clone() })
        .await?;

    let caption = format!("🎬 {}\n{}", title, streams::resolution_label(selected));
    send_video_file(bot, chat_id, &artifact.path, &caption).await?;

    progress
        .update(bot, DownloadStatus::Success { title: title.clone() })
        .await?;
    Ok(())
}

/// Runs the full audio operation: fetch, optional mp3 conversion, upload.
pub async fn run_audio_operation(
    bot: Bot,
    chat_id: ChatId,
    media: Arc<MediaInfo>,
    pending: Arc<TempFiles>,
    mut progress: ProgressMessage,
    guard: OperationGuard,
) {
    let result = match timeout(
        config::download::global_timeout(),
        audio_inner(&bot, chat_id, &media, &pending, &mut progress),
    )
    .await
    {
        Ok(inner) => inner,
        Err(_) => {
            log::error!(
                "Audio operation timed out after {} seconds for chat {}",
                config::download::GLOBAL_TIMEOUT_SECS,
                chat_id
            );
            Err(AppError::Download("the operation timed out".to_string()))
        }
    };

    if let Err(e) = result {
        log::error!(
            "Audio operation failed for chat {} ({}): {:?}",
            chat_id,
            media.webpage_url,
            e
        );
        let _ = progress
            .update(
                &bot,
                DownloadStatus::Error {
                    title: media.title.clone(),
                    error: e.user_message(),
                },
            )
            .await;
    }

    pending.cleanup();
    drop(guard);
}

async fn audio_inner(
    bot: &Bot,
    chat_id: ChatId,
    media: &MediaInfo,
    pending: &TempFiles,
    progress: &mut ProgressMessage,
) -> AppResult<()> {
    let title = &media.title;
    progress
        .update(bot, DownloadStatus::Starting { title: title.clone() })
        .await?;

    let audio = streams::best_audio(media)
        .ok_or_else(|| AppError::Download("no audio-only track found for this video".to_string()))?;

    let ffmpeg_available = conversion::check_ffmpeg().await;
    let plan = plan_audio(ffmpeg_available);
    log::info!(
        "Audio plan for chat {}: {:?} (format {}, ffmpeg available: {})",
        chat_id,
        plan,
        audio.format_id,
        ffmpeg_available
    );

    let scratch = config::scratch_dir();
    let stamp = unix_millis();
    let safe_title = escape_filename(title);

    let fetched = PathBuf::from(format!(
        "{}/audio_{}_{}.{}",
        scratch, chat_id.0, stamp, audio.container
    ));
    pending.register(&fetched);
    {
        let mut reporter = DownloadReporter::new(bot, progress, title);
        download_stream(&media.webpage_url, &audio.format_id, &fetched, &mut reporter).await?;
    }

    let artifact = match plan {
        AudioPlan::ConvertToMp3 => {
            progress
                .update(bot, DownloadStatus::Converting { title: title.clone() })
                .await?;

            let mp3 = PathBuf::from(format!("{}/{}_{}.mp3", scratch, safe_title, stamp));
            pending.register(&mp3);
            conversion::audio::convert_to_mp3(fetched.as_path(), mp3.as_path()).await?;
            DownloadArtifact {
                path: mp3,
                role: ArtifactRole::AudioOnly,
            }
        }
        AudioPlan::SendOriginal => {
            progress
                .update(
                    bot,
                    DownloadStatus::Degraded {
                        title: title.clone(),
                        note: "FFmpeg not found. Sending original audio format.".to_string(),
                    },
                )
                .await?;
            DownloadArtifact {
                path: fetched.clone(),
                role: ArtifactRole::AudioOnly,
            }
        }
    };

    log::info!(
        "Final artifact for chat {} ({:?}): {}",
        chat_id,
        artifact.role,
        artifact.path.display()
    );

    progress
        .update(bot, DownloadStatus::Uploading { title: title.clone() })
        .await?;

    let caption = format!("🎵 {}", title);
    send_audio_file(bot, chat_id, &artifact.path, title, &media.author, &caption).await?;

    progress
        .update(bot, DownloadStatus::Success { title: title.clone() })
        .await?;
    Ok(())
}
