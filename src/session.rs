//! Per-user session registry and scratch-file tracking
//!
//! The registry is owned by the application root and handed to every
//! handler invocation through `HandlerDeps`. Sessions are created on first
//! contact and live for the process lifetime (no eviction).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use teloxide::types::ChatId;

use crate::download::metadata::MediaInfo;

/// Ordered set of scratch paths created during one operation.
///
/// Paths are registered the instant they are chosen, before the step that
/// could fail, so cleanup covers partial failures. Cleanup is idempotent:
/// a path that no longer exists is a no-op.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Mutex<Vec<PathBuf>>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scratch path for cleanup. Duplicates are fine.
    pub fn register(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::debug!("Registering scratch file {}", path.display());
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path);
        }
    }

    /// Snapshot of the registered paths, in registration order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Deletes every registered path that still exists. Safe to call any
    /// number of times; an already-absent path is logged at debug level.
    pub fn cleanup(&self) {
        for path in self.paths() {
            match std::fs::remove_file(&path) {
                Ok(()) => log::info!("Removed scratch file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    log::debug!("Scratch file {} already gone, skipping", path.display());
                }
                Err(e) => log::warn!("Failed to remove scratch file {}: {}", path.display(), e),
            }
        }
    }
}

/// Transient per-user state for the selection flow.
///
/// A new link submission replaces `media`, clears the quality snapshot and
/// swaps in a fresh `TempFiles` handle. An operation that is already in
/// flight keeps the old handle and still cleans up after itself.
#[derive(Debug, Default)]
pub struct UserSession {
    pub source_url: Option<String>,
    pub media: Option<Arc<MediaInfo>>,
    /// Format ids in the exact order the quality list was rendered.
    /// Selection resolves indices against this snapshot, never against a
    /// recomputed list.
    pub quality_snapshot: Vec<String>,
    pub pending: Arc<TempFiles>,
    busy: bool,
}

/// Registry of per-user sessions, keyed by chat id.
///
/// Cheap to clone: clones share the same underlying map, so the registry
/// can be handed into handlers and operation guards freely.
#[derive(Debug, Default, Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<ChatId, UserSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the last submitted link without touching any other state.
    pub fn set_link(&self, chat_id: ChatId, url: &str) {
        let mut session = self.sessions.entry(chat_id).or_default();
        session.source_url = Some(url.to_string());
    }

    /// Installs freshly extracted metadata, invalidating the previous
    /// operation's selection state. The old `TempFiles` handle stays alive
    /// inside any in-flight operation that still holds it.
    pub fn replace_media(&self, chat_id: ChatId, media: Arc<MediaInfo>) {
        let mut session = self.sessions.entry(chat_id).or_default();
        session.media = Some(media);
        session.quality_snapshot.clear();
        session.pending = Arc::new(TempFiles::new());
    }

    pub fn media(&self, chat_id: ChatId) -> Option<Arc<MediaInfo>> {
        self.sessions.get(&chat_id).and_then(|s| s.media.clone())
    }

    pub fn pending(&self, chat_id: ChatId) -> Arc<TempFiles> {
        self.sessions
            .entry(chat_id)
            .or_default()
            .pending
            .clone()
    }

    /// Stores the ordered format ids shown to the user.
    pub fn set_quality_snapshot(&self, chat_id: ChatId, format_ids: Vec<String>) {
        let mut session = self.sessions.entry(chat_id).or_default();
        session.quality_snapshot = format_ids;
    }

    /// Maps a tapped index back to the format id rendered at that position.
    pub fn resolve_snapshot(&self, chat_id: ChatId, index: usize) -> Option<String> {
        self.sessions
            .get(&chat_id)
            .and_then(|s| s.quality_snapshot.get(index).cloned())
    }

    pub fn is_busy(&self, chat_id: ChatId) -> bool {
        self.sessions.get(&chat_id).map(|s| s.busy).unwrap_or(false)
    }

    /// Claims the per-user operation slot. Returns `None` when an operation
    /// is already running for this chat; the caller must reject the request
    /// rather than interleave scratch-file state.
    pub fn try_begin_operation(&self, chat_id: ChatId) -> Option<OperationGuard> {
        let mut session = self.sessions.entry(chat_id).or_default();
        if session.busy {
            return None;
        }
        session.busy = true;
        Some(OperationGuard {
            registry: self.clone(),
            chat_id,
        })
    }

    fn finish_operation(&self, chat_id: ChatId) {
        if let Some(mut session) = self.sessions.get_mut(&chat_id) {
            session.busy = false;
        }
    }
}

/// RAII guard for the per-user operation slot. Dropping it releases the
/// slot on every exit path, including panics inside the spawned task.
#[derive(Debug)]
pub struct OperationGuard {
    registry: SessionRegistry,
    chat_id: ChatId,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.registry.finish_operation(self.chat_id);
    }
}
