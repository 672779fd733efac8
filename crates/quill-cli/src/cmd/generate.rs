use std::sync::Arc;

use quill_core::{
    Context, GenerationOrchestrator, GenerationRegistry, ProgressBus, ServiceConfig,
};
use quill_server::state::generate_generation_id;

/// Drive one generation end to end: progress goes to stderr, the finished
/// text to stdout (so it can be piped).
pub fn run(
    action: &str,
    agent: &str,
    context: &[String],
    simulate: bool,
    model: Option<String>,
) -> anyhow::Result<()> {
    let mut config = ServiceConfig::from_env();
    if simulate {
        config.use_cli = false;
    }
    if model.is_some() {
        config.model = model;
    }

    if config.use_cli && !quill_agent::binary_available(&config.invoke_options()) {
        anyhow::bail!(
            "'{}' not found on PATH; install the AI CLI or run with --simulate",
            config.binary
        );
    }

    let ctx = parse_context(context)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let registry = Arc::new(GenerationRegistry::new());
        let bus = Arc::new(ProgressBus::new());
        let orchestrator =
            GenerationOrchestrator::new(registry.clone(), bus.clone(), config.generator());

        let id = generate_generation_id();
        let mut rx = bus.subscribe(&id);
        let printer = tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                eprintln!("[{:>3}%] {:<12} {}", ev.progress, ev.status.as_str(), ev.message);
                if ev.status.is_terminal() {
                    break;
                }
            }
        });

        let outcome = orchestrator.run(agent, action, &ctx, &id).await?;
        let _ = printer.await;
        registry.cleanup(&id);
        bus.cleanup(&id);

        if outcome.cancelled {
            anyhow::bail!("generation was cancelled");
        }
        println!("{}", outcome.text);
        if let Some(usage) = outcome.usage {
            eprintln!(
                "tokens: {} in / {} out",
                usage.input_tokens, usage.output_tokens
            );
        }
        Ok(())
    })
}

fn parse_context(entries: &[String]) -> anyhow::Result<Context> {
    let mut ctx = Context::new();
    for entry in entries {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("invalid context entry '{entry}' (expected KEY=VALUE)")
        })?;
        ctx.insert(
            key.to_string(),
            serde_json::Value::String(value.to_string()),
        );
    }
    Ok(ctx)
}
