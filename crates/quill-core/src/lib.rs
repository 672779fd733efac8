//! `quill-core` — generation lifecycle core for the Quill writing assistant.
//!
//! One generation = one request/response cycle of producing AI text for an
//! action (scene, character, outline, review) and its context. The pieces:
//!
//! ```text
//! GenerationRegistry   id → cancellation flag
//! ProgressBus          id → last-known ProgressEvent + broadcast channel
//! GenerationOrchestrator
//!     register id → emit progress ladder → CLI or simulator →
//!     cancellation checkpoints → terminal event
//! ```
//!
//! Registry and bus are explicit service objects shared via `Arc`; the
//! transport layer owns cleanup so terminal events stay observable for a
//! grace window after a run ends.

pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod registry;
pub mod simulate;

pub use config::ServiceConfig;
pub use orchestrator::{GenerationError, GenerationOrchestrator, GenerationOutcome, Generator};
pub use progress::{GenerationStatus, ProgressBus, ProgressEvent};
pub use prompts::Context;
pub use registry::GenerationRegistry;
