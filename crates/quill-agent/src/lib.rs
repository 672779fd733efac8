//! `quill-agent` — subprocess driver for the external AI CLI.
//!
//! One generation = one subprocess: the prompt is written to the tool's
//! stdin, stdout and stderr are buffered fully in memory, and on exit the
//! stdout is parsed as a single JSON response document
//! (`{ is_error, result, usage? }`).
//!
//! ```rust,ignore
//! use quill_agent::{invoke, InvokeOptions};
//!
//! let opts = InvokeOptions {
//!     model: Some("claude-sonnet-4-6".into()),
//!     system_prompt: Some("You are a prose stylist.".into()),
//!     ..Default::default()
//! };
//! let inv = invoke("Write the opening paragraph of chapter 3.", &opts).await?;
//! println!("{}", inv.result);
//! ```

pub mod error;
pub mod invoker;
pub mod types;

pub use error::AgentError;
pub use invoker::{binary_available, invoke};
pub use types::{CliResponse, InvokeOptions, Invocation, TokenUsage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;
