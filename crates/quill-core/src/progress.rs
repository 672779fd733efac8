use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use quill_agent::TokenUsage;

// ─── Status ───────────────────────────────────────────────────────────────

/// Lifecycle stage of one generation. Linear on the success path; any
/// non-terminal stage can jump to `Cancelled` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Initializing,
    Analyzing,
    Generating,
    Processing,
    Completed,
    Cancelled,
    Error,
}

impl GenerationStatus {
    /// No further events are expected after a terminal status, only cleanup.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

// ─── ProgressEvent ────────────────────────────────────────────────────────

/// A snapshot of one generation's current stage, broadcast to subscribers
/// and retained as the last-known value until cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub generation_id: String,
    pub status: GenerationStatus,
    /// 0–100, non-decreasing except on cancel/error (which reset to 0).
    pub progress: u8,
    /// Human-readable stage description; never parsed by consumers.
    pub message: String,
    /// Full generated text; present only on `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Failure reason; present only on `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub timestamp: String,
}

impl ProgressEvent {
    /// A non-terminal stage update.
    pub fn stage(id: &str, status: GenerationStatus, progress: u8, message: &str) -> Self {
        Self {
            generation_id: id.to_string(),
            status,
            progress,
            message: message.to_string(),
            result: None,
            error: None,
            usage: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn completed(id: &str, result: String, usage: Option<TokenUsage>) -> Self {
        Self {
            result: Some(result),
            usage,
            ..Self::stage(id, GenerationStatus::Completed, 100, "Generation complete")
        }
    }

    pub fn cancelled(id: &str) -> Self {
        Self::stage(id, GenerationStatus::Cancelled, 0, "Generation cancelled")
    }

    pub fn error(id: &str, message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::stage(id, GenerationStatus::Error, 0, "Generation failed")
        }
    }
}

// ─── ProgressBus ──────────────────────────────────────────────────────────

/// Per-receiver buffer. Generations emit a handful of events, so this only
/// matters for pathologically slow SSE consumers.
const CHANNEL_CAPACITY: usize = 64;

struct BusEntry {
    tx: broadcast::Sender<ProgressEvent>,
    latest: Option<ProgressEvent>,
}

impl BusEntry {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, latest: None }
    }
}

/// Publish/subscribe channel keyed by generation id, carrying lifecycle
/// status events plus a last-known-value store for late subscribers.
///
/// Dropping a [`broadcast::Receiver`] is the unsubscribe. `cleanup` drops
/// the sender, so live receivers observe channel closure on their next poll
/// — they are expected to have seen the terminal event first.
#[derive(Default)]
pub struct ProgressBus {
    entries: Mutex<HashMap<String, BusEntry>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event` as the latest for its id and broadcast it. Having no
    /// subscribers is not an error.
    pub fn emit(&self, event: ProgressEvent) {
        let mut entries = self.lock();
        let entry = entries
            .entry(event.generation_id.clone())
            .or_insert_with(BusEntry::new);
        entry.latest = Some(event.clone());
        let _ = entry.tx.send(event);
    }

    /// Receive every subsequent `emit` for `id`, in emission order. Creates
    /// the entry if absent so a subscriber racing the first emit loses
    /// nothing.
    pub fn subscribe(&self, id: &str) -> broadcast::Receiver<ProgressEvent> {
        let mut entries = self.lock();
        entries
            .entry(id.to_string())
            .or_insert_with(BusEntry::new)
            .tx
            .subscribe()
    }

    /// The most recent event stored for `id`, if any.
    pub fn latest(&self, id: &str) -> Option<ProgressEvent> {
        self.lock().get(id).and_then(|e| e.latest.clone())
    }

    /// Discard the stored state for `id`. No-op if unknown.
    pub fn cleanup(&self, id: &str) {
        self.lock().remove(id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, BusEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
