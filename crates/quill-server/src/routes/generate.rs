use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::{future, Stream, StreamExt as _};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info};

use quill_core::{Context, GenerationRegistry, ProgressEvent};

use crate::error::AppError;
use crate::state::{generate_generation_id, AppState};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Agent persona; unknown names fall back to the default persona.
    #[serde(default)]
    pub agent: String,
    /// What to generate (e.g. `generate_scene`).
    pub action: String,
    /// Free-form key/value data fed to the prompt builder.
    #[serde(default)]
    pub context: Context,
}

// ---------------------------------------------------------------------------
// POST /api/generate — start a generation, return its id immediately
// ---------------------------------------------------------------------------

pub async fn start_generation(
    State(app): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Json<serde_json::Value> {
    let id = generate_generation_id();
    info!(id = %id, agent = %body.agent, action = %body.action, "generation requested");

    let state = app.clone();
    let task_id = id.clone();
    tokio::spawn(async move {
        if let Err(e) = state
            .orchestrator
            .run(&body.agent, &body.action, &body.context, &task_id)
            .await
        {
            error!(id = %task_id, error = %e, "generation run failed");
        }

        // Grace window: late SSE subscribers can still read the terminal
        // event before the id's state is discarded.
        tokio::time::sleep(state.cleanup_grace).await;
        state.registry.cleanup(&task_id);
        state.bus.cleanup(&task_id);
        debug!(id = %task_id, "generation state cleaned up");
    });

    Json(serde_json::json!({
        "generation_id": id,
        "status": "started",
    }))
}

// ---------------------------------------------------------------------------
// GET /api/generate/{id} — latest progress snapshot
// ---------------------------------------------------------------------------

pub async fn get_generation(
    Path(id): Path<String>,
    State(app): State<AppState>,
) -> Result<Json<ProgressEvent>, AppError> {
    app.bus
        .latest(&id)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("generation '{id}' not found")))
}

// ---------------------------------------------------------------------------
// POST /api/generate/{id}/cancel — flip the cancellation flag
// ---------------------------------------------------------------------------

pub async fn cancel_generation(
    Path(id): Path<String>,
    State(app): State<AppState>,
) -> Json<serde_json::Value> {
    let known = app.registry.cancel(&id);
    Json(serde_json::json!({
        "status": if known { "cancelled" } else { "unknown" },
    }))
}

// ---------------------------------------------------------------------------
// GET /api/generate/{id}/events — SSE progress stream
// ---------------------------------------------------------------------------

/// Cancels the generation if the SSE client disconnects before a terminal
/// event was delivered.
struct CancelOnDisconnect {
    id: String,
    registry: Arc<GenerationRegistry>,
    terminal_seen: Arc<AtomicBool>,
}

impl Drop for CancelOnDisconnect {
    fn drop(&mut self) {
        if !self.terminal_seen.load(Ordering::Relaxed) {
            info!(id = %self.id, "client disconnected mid-generation, cancelling");
            self.registry.cancel(&self.id);
        }
    }
}

/// Replay the snapshot (if any), then relay live events, ending the stream
/// right after the first terminal event. The first live event is dropped
/// when it equals the snapshot: an emit landing between `subscribe` and
/// `latest` shows up on both sides.
fn progress_stream(
    snapshot: Option<ProgressEvent>,
    rx: broadcast::Receiver<ProgressEvent>,
) -> impl Stream<Item = ProgressEvent> {
    let mut replayed = snapshot.clone();
    let live = BroadcastStream::new(rx).filter_map(move |msg| {
        future::ready(
            msg.ok()
                .filter(|ev| replayed.take().map_or(true, |snap| *ev != snap)),
        )
    });

    futures::stream::iter(snapshot)
        .chain(live)
        // A trailing None after a terminal event marks the end for take_while.
        .flat_map(|ev: ProgressEvent| {
            let items = if ev.status.is_terminal() {
                vec![Some(ev), None]
            } else {
                vec![Some(ev)]
            };
            futures::stream::iter(items)
        })
        .take_while(|item| future::ready(item.is_some()))
        .filter_map(|item| future::ready(item))
}

/// Always accepts the subscription: POST returns the id before the spawned
/// run emits anything, so a caller may attach here before the first event
/// exists. Subscribing creates the bus entry, and no emit is lost.
pub async fn generation_events(
    Path(id): Path<String>,
    State(app): State<AppState>,
) -> impl IntoResponse {
    let rx = app.bus.subscribe(&id);
    let snapshot = app.bus.latest(&id);
    info!(id = %id, "SSE subscriber attached");

    let terminal_seen = Arc::new(AtomicBool::new(false));
    let guard = CancelOnDisconnect {
        id,
        registry: app.registry.clone(),
        terminal_seen: terminal_seen.clone(),
    };

    let events = progress_stream(snapshot, rx).filter_map(move |ev| {
        let _keep_alive = &guard;
        if ev.status.is_terminal() {
            terminal_seen.store(true, Ordering::Relaxed);
        }
        future::ready(
            serde_json::to_string(&ev)
                .ok()
                .map(|data| Ok::<Event, Infallible>(Event::default().event("progress").data(data))),
        )
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
