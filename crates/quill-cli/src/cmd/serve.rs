use quill_core::ServiceConfig;

pub fn run(port: Option<u16>, simulate: bool) -> anyhow::Result<()> {
    let mut config = ServiceConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    if simulate {
        config.use_cli = false;
    }

    if config.use_cli && !quill_agent::binary_available(&config.invoke_options()) {
        anyhow::bail!(
            "'{}' not found on PATH; install the AI CLI or run with --simulate",
            config.binary
        );
    }

    tracing::info!(
        generator = if config.use_cli { "cli" } else { "simulated" },
        "starting generation API"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(quill_server::serve(config))
}
