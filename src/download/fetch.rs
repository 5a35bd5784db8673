//! Single-stream fetch via yt-dlp
//!
//! Downloads one selected encoding to a scratch path, streaming `--newline`
//! progress output back through the caller's [`DownloadReporter`].

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::core::config;
use crate::core::{AppError, AppResult};
use crate::download::progress::DownloadReporter;

/// Parses a percent out of a yt-dlp progress line.
///
/// Lines look like `[download]  42.3% of 10.54MiB at 1.23MiB/s ETA 00:05`.
pub fn parse_progress_line(line: &str) -> Option<u8> {
    if !line.contains("[download]") {
        return None;
    }
    let percent_end = line.find('%')?;
    let before = &line[..percent_end];
    let start = before
        .rfind(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map(|i| i + 1)
        .unwrap_or(0);
    before[start..].parse::<f64>().ok().map(|p| p.min(100.0) as u8)
}

/// Keeps the last few stderr lines for error reporting.
fn push_tail(tail: &mut Vec<String>, line: String) {
    tail.push(line);
    if tail.len() > 50 {
        tail.remove(0);
    }
}

/// Picks a short failure reason out of captured yt-dlp output.
fn failure_reason(tail: &[String]) -> String {
    tail.iter()
        .find(|l| l.contains("ERROR:"))
        .or_else(|| tail.last())
        .map(|l| l.trim().chars().take(200).collect())
        .unwrap_or_else(|| "downloader exited with an error".to_string())
}

/// Downloads one stream (`-f <format_id>`) to `dest`.
///
/// Progress lines are parsed as they arrive and forwarded to `reporter`,
/// which throttles the actual message edits. The destination path must
/// already be registered for cleanup by the caller.
pub async fn download_stream(
    url: &str,
    format_id: &str,
    dest: &Path,
    reporter: &mut DownloadReporter<'_>,
) -> AppResult<()> {
    let ytdl_bin = &*config::YTDL_BIN;
    let dest_str = dest.to_string_lossy();
    let args = [
        "-f",
        format_id,
        "-o",
        dest_str.as_ref(),
        "--newline",
        "--no-playlist",
        "--no-check-certificate",
        url,
    ];
    log::debug!("yt-dlp command for fetch: {} {}", ytdl_bin, args.join(" "));

    let mut child = Command::new(ytdl_bin)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AppError::Download(format!("failed to spawn {}: {}", ytdl_bin, e)))?;

    let mut tail: Vec<String> = Vec::new();

    // Collect stderr concurrently; yt-dlp writes progress to stdout with
    // --newline but errors land on stderr.
    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                log::debug!("yt-dlp stderr: {}", line);
                push_tail(&mut collected, line);
            }
            collected
        })
    });

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AppError::Download(format!("failed to read downloader output: {}", e)))?
        {
            log::debug!("yt-dlp stdout: {}", line);
            if let Some(percent) = parse_progress_line(&line) {
                reporter.report(percent).await;
            }
        }
    }

    if let Some(task) = stderr_task {
        if let Ok(collected) = task.await {
            tail = collected;
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| AppError::Download(format!("downloader process failed: {}", e)))?;

    if !status.success() {
        let reason = failure_reason(&tail);
        log::error!("yt-dlp fetch failed for format {}: {}", format_id, reason);
        return Err(AppError::Download(reason));
    }

    reporter.report(100).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_progress_line_typical() {
        assert_eq!(
            parse_progress_line("[download]  42.3% of 10.54MiB at 1.23MiB/s ETA 00:05"),
            Some(42)
        );
        assert_eq!(parse_progress_line("[download] 100% of 10.54MiB in 00:08"), Some(100));
        assert_eq!(parse_progress_line("[download]   0.0% of ~22.10MiB"), Some(0));
    }

    #[test]
    fn test_parse_progress_line_ignores_other_output() {
        assert_eq!(parse_progress_line("[info] abc123: Downloading 1 format(s)"), None);
        assert_eq!(parse_progress_line("[download] Destination: clip.mp4"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn test_parse_progress_line_caps_at_hundred() {
        assert_eq!(parse_progress_line("[download] 104.2% of 5MiB"), Some(100));
    }

    #[test]
    fn test_failure_reason_prefers_error_line() {
        let tail = vec![
            "WARNING: slow".to_string(),
            "ERROR: HTTP Error 403: Forbidden".to_string(),
            "trailing".to_string(),
        ];
        assert_eq!(failure_reason(&tail), "ERROR: HTTP Error 403: Forbidden");
    }

    #[test]
    fn test_failure_reason_empty_tail() {
        assert_eq!(failure_reason(&[]), "downloader exited with an error");
    }

    #[test]
    fn test_push_tail_is_bounded() {
        let mut tail = Vec::new();
        for i in 0..120 {
            push_tail(&mut tail, format!("line {}", i));
        }
        assert_eq!(tail.len(), 50);
        assert_eq!(tail[0], "line 70");
    }
}
