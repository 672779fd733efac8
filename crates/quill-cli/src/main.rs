mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Writing-assistant generation service — serve the API or drive a single generation",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP generation API
    Serve {
        /// Port to listen on (overrides QUILL_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Force the simulated generator even if QUILL_USE_CLI is set
        #[arg(long)]
        simulate: bool,
    },

    /// Run one generation in the foreground and print the result
    Generate {
        /// What to generate (generate_scene, develop_character, outline_plot, review_chapter)
        action: String,

        /// Agent persona to write as
        #[arg(long, default_value = "prose_stylist")]
        agent: String,

        /// Context entry as KEY=VALUE (repeatable)
        #[arg(long = "context", short = 'c', value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Force the simulated generator even if QUILL_USE_CLI is set
        #[arg(long)]
        simulate: bool,

        /// Model override for the external CLI
        #[arg(long)]
        model: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve { port, simulate } => cmd::serve::run(port, simulate),
        Commands::Generate {
            action,
            agent,
            context,
            simulate,
            model,
        } => cmd::generate::run(&action, &agent, &context, simulate, model),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
