use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(
        "failed to start '{binary}': {source} — check that the AI CLI is installed and on PATH"
    )]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("AI CLI exited with code {code}\nstderr: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("failed to parse AI CLI response: {source}\n  output: {raw}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("AI CLI reported an error: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
