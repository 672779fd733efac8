use std::sync::Arc;

use thiserror::Error;

use quill_agent::{invoke, AgentError, InvokeOptions, TokenUsage};

use crate::progress::{GenerationStatus, ProgressBus, ProgressEvent};
use crate::prompts::{self, Context};
use crate::registry::GenerationRegistry;
use crate::simulate;

// ─── Types ────────────────────────────────────────────────────────────────

/// How the orchestrator produces text: the real external CLI, or the
/// built-in deterministic simulator.
#[derive(Debug, Clone)]
pub enum Generator {
    Cli(InvokeOptions),
    Simulated,
}

/// Terminal outcome of one generation run. `cancelled` runs carry no text.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub text: String,
    pub cancelled: bool,
    pub usage: Option<TokenUsage>,
}

impl GenerationOutcome {
    fn cancelled() -> Self {
        Self {
            text: String::new(),
            cancelled: true,
            usage: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Agent(#[from] AgentError),
}

// ─── Orchestrator ─────────────────────────────────────────────────────────

/// Runs one generation end to end: registers the id, walks the progress
/// ladder, delegates to the CLI or the simulator, honors cancellation at
/// two checkpoints, and emits the terminal event.
///
/// The orchestrator never cleans up its own registry/bus entries — the
/// transport layer does that after a grace window, so late SSE subscribers
/// can still observe the terminal event.
pub struct GenerationOrchestrator {
    registry: Arc<GenerationRegistry>,
    bus: Arc<ProgressBus>,
    generator: Generator,
}

impl GenerationOrchestrator {
    pub fn new(
        registry: Arc<GenerationRegistry>,
        bus: Arc<ProgressBus>,
        generator: Generator,
    ) -> Self {
        Self {
            registry,
            bus,
            generator,
        }
    }

    pub fn registry(&self) -> &Arc<GenerationRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<ProgressBus> {
        &self.bus
    }

    pub async fn run(
        &self,
        agent: &str,
        action: &str,
        context: &Context,
        generation_id: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        tracing::info!(id = %generation_id, agent, action, "generation started");
        self.registry.register(generation_id);

        self.stage(generation_id, GenerationStatus::Initializing, 5, "Preparing generation");

        // Checkpoint A: a cancel racing in from another task bails before
        // any generator work.
        if self.registry.is_cancelled(generation_id) {
            self.bus.emit(ProgressEvent::cancelled(generation_id));
            tracing::info!(id = %generation_id, "cancelled before generation");
            return Ok(GenerationOutcome::cancelled());
        }

        self.stage(generation_id, GenerationStatus::Analyzing, 20, "Analyzing story context");
        self.stage(generation_id, GenerationStatus::Generating, 50, "Generating prose");

        let (text, usage) = match prompts::build_prompt(action, context) {
            None => {
                // Deliberate fallback: no prompt builder for this action, so
                // the CLI is never invoked and the run completes with a
                // placeholder.
                tracing::warn!(id = %generation_id, action, "no prompt builder for action");
                (prompts::not_implemented_text(action), None)
            }
            Some(user_prompt) => match &self.generator {
                Generator::Cli(opts) => {
                    let mut opts = opts.clone();
                    opts.system_prompt = Some(prompts::system_prompt_for(agent).to_string());
                    match invoke(&user_prompt, &opts).await {
                        Ok(inv) => (inv.result, inv.usage),
                        Err(e) => {
                            self.bus
                                .emit(ProgressEvent::error(generation_id, &e.to_string()));
                            tracing::error!(id = %generation_id, error = %e, "generation failed");
                            return Err(e.into());
                        }
                    }
                }
                Generator::Simulated => {
                    match simulate::generate(agent, action, context, generation_id, &self.registry)
                        .await
                    {
                        Some(text) => (text, None),
                        None => {
                            self.bus.emit(ProgressEvent::cancelled(generation_id));
                            tracing::info!(id = %generation_id, "cancelled during simulation");
                            return Ok(GenerationOutcome::cancelled());
                        }
                    }
                }
            },
        };

        // Checkpoint B: the subprocess cannot be killed mid-flight, so a
        // cancel that landed while it ran discards the produced text here.
        if self.registry.is_cancelled(generation_id) {
            self.bus.emit(ProgressEvent::cancelled(generation_id));
            tracing::info!(id = %generation_id, "cancelled after generation, result discarded");
            return Ok(GenerationOutcome::cancelled());
        }

        self.stage(generation_id, GenerationStatus::Processing, 80, "Polishing output");

        self.bus
            .emit(ProgressEvent::completed(generation_id, text.clone(), usage));
        tracing::info!(id = %generation_id, chars = text.len(), "generation completed");

        Ok(GenerationOutcome {
            text,
            cancelled: false,
            usage,
        })
    }

    // The only suspension points in a run are inside the generator itself;
    // stage updates are emitted synchronously.
    fn stage(&self, id: &str, status: GenerationStatus, progress: u8, message: &str) {
        self.bus
            .emit(ProgressEvent::stage(id, status, progress, message));
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
