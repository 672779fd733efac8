use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ─── Invocation options ───────────────────────────────────────────────────

/// Options for one invocation of the external AI CLI.
///
/// `binary` defaults to `claude`; everything else is optional. The prompt is
/// not part of the argv — it is written to the subprocess stdin.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    /// Executable name or path of the external tool.
    pub binary: String,
    /// Model override (`--model`).
    pub model: Option<String>,
    /// System prompt override (`--system-prompt`).
    pub system_prompt: Option<String>,
    /// Extra argv entries appended verbatim.
    pub extra_args: Vec<String>,
    /// Additional environment variables for the subprocess.
    pub env: HashMap<String, String>,
    /// Working directory for the subprocess.
    pub cwd: Option<PathBuf>,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            binary: "claude".into(),
            model: None,
            system_prompt: None,
            extra_args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }
}

// ─── Wire response ────────────────────────────────────────────────────────

/// The single JSON document the CLI writes to stdout on exit 0.
#[derive(Debug, Clone, Deserialize)]
pub struct CliResponse {
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Token counters from the CLI's `usage` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

// ─── Public result ────────────────────────────────────────────────────────

/// A successful invocation: the generated text plus usage counters, if the
/// CLI reported any.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub result: String,
    pub usage: Option<TokenUsage>,
}
