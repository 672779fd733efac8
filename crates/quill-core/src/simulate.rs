use std::time::Duration;

use rand::Rng;

use crate::prompts::{ctx_display, Context};
use crate::registry::GenerationRegistry;

/// How often the simulated wait re-checks the cancellation flag. A cancel
/// mid-wait is observed within one tick.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const MIN_DELAY_MS: u64 = 600;
const MAX_DELAY_MS: u64 = 1800;

/// Deterministic placeholder generator, used when the external AI CLI is
/// disabled. Waits a bounded random interval, polling the registry every
/// [`POLL_INTERVAL`]; returns `None` if the generation was cancelled during
/// the wait.
pub async fn generate(
    agent: &str,
    action: &str,
    context: &Context,
    generation_id: &str,
    registry: &GenerationRegistry,
) -> Option<String> {
    let total_ms = rand::thread_rng().gen_range(MIN_DELAY_MS..=MAX_DELAY_MS);
    let mut elapsed = Duration::ZERO;
    let total = Duration::from_millis(total_ms);

    while elapsed < total {
        tokio::time::sleep(POLL_INTERVAL).await;
        elapsed += POLL_INTERVAL;
        if registry.is_cancelled(generation_id) {
            return None;
        }
    }

    Some(placeholder_text(agent, action, context))
}

/// The simulated output is a function of the request alone, so repeated runs
/// with the same inputs produce the same text.
fn placeholder_text(agent: &str, action: &str, context: &Context) -> String {
    let persona = if agent.is_empty() { "assistant" } else { agent };
    format!(
        "[simulated {persona}] {action}: {summary}\n\n\
         The harbor lights blurred behind the rain as Mara counted the \
         reasons she should turn back, and kept walking anyway. This is \
         placeholder prose produced by the built-in simulator; enable the \
         external AI CLI for real generation.",
        summary = ctx_display(context),
    )
}
