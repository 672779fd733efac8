use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/health — liveness plus generator diagnostics.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "active": app.registry.active_count(),
        "generator": if app.config.use_cli { "cli" } else { "simulated" },
        "cli_available": quill_agent::binary_available(&app.config.invoke_options()),
    }))
}
