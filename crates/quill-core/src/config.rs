use quill_agent::InvokeOptions;

use crate::orchestrator::Generator;

/// Service configuration, sourced from the environment. Malformed values
/// fall back to defaults.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port (`QUILL_PORT`).
    pub port: u16,
    /// Use the real external AI CLI instead of the simulator (`QUILL_USE_CLI`).
    pub use_cli: bool,
    /// Executable name or path of the external tool (`QUILL_CLI_BIN`).
    pub binary: String,
    /// Model override passed to the tool (`QUILL_MODEL`).
    pub model: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            use_cli: false,
            binary: "claude".into(),
            model: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("QUILL_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            use_cli: std::env::var("QUILL_USE_CLI")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.use_cli),
            binary: std::env::var("QUILL_CLI_BIN").unwrap_or(defaults.binary),
            model: std::env::var("QUILL_MODEL").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn invoke_options(&self) -> InvokeOptions {
        InvokeOptions {
            binary: self.binary.clone(),
            model: self.model.clone(),
            ..Default::default()
        }
    }

    pub fn generator(&self) -> Generator {
        if self.use_cli {
            Generator::Cli(self.invoke_options())
        } else {
            Generator::Simulated
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}
