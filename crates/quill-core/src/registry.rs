use std::collections::HashMap;
use std::sync::Mutex;

/// Process-wide map from generation id to its cancellation flag.
///
/// Constructed once per process and shared via `Arc`. The orchestrator holds
/// only ids, never references into the map, so a cancellation from any caller
/// is visible at the next checkpoint.
#[derive(Debug, Default)]
pub struct GenerationRegistry {
    handles: Mutex<HashMap<String, bool>>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle with `cancelled = false`. Registering an id twice
    /// resets its flag; callers mint fresh ids so this does not happen in
    /// practice.
    pub fn register(&self, id: &str) {
        self.lock().insert(id.to_string(), false);
    }

    /// Set the cancellation flag. Returns `true` if the id was known;
    /// unknown ids are a silent no-op.
    pub fn cancel(&self, id: &str) -> bool {
        let mut handles = self.lock();
        match handles.get_mut(id) {
            Some(flag) => {
                *flag = true;
                tracing::info!(id = %id, "generation cancelled");
                true
            }
            None => false,
        }
    }

    /// Remove the handle entirely. No-op if unknown.
    pub fn cleanup(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Current flag value; `false` for unknown ids. Never errors.
    pub fn is_cancelled(&self, id: &str) -> bool {
        self.lock().get(id).copied().unwrap_or(false)
    }

    /// Number of live handles (in-flight generations).
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, bool>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still a plain HashMap, so recover it.
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}
