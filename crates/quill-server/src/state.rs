use std::sync::Arc;
use std::time::Duration;

use quill_core::{
    GenerationOrchestrator, GenerationRegistry, ProgressBus, ServiceConfig,
};

/// Delay between a run's terminal event and the removal of its registry/bus
/// entries, so late SSE subscribers still observe the terminal state.
pub const DEFAULT_CLEANUP_GRACE: Duration = Duration::from_secs(5);

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<GenerationRegistry>,
    pub bus: Arc<ProgressBus>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub config: ServiceConfig,
    pub cleanup_grace: Duration,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_cleanup_grace(config, DEFAULT_CLEANUP_GRACE)
    }

    pub fn with_cleanup_grace(config: ServiceConfig, cleanup_grace: Duration) -> Self {
        let registry = Arc::new(GenerationRegistry::new());
        let bus = Arc::new(ProgressBus::new());
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            registry.clone(),
            bus.clone(),
            config.generator(),
        ));
        Self {
            registry,
            bus,
            orchestrator,
            config,
            cleanup_grace,
        }
    }
}

/// Mint a fresh generation id. Ids are never reused: every request gets a
/// new UUID.
pub fn generate_generation_id() -> String {
    format!("gen-{}", uuid::Uuid::new_v4())
}
