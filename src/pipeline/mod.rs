//! Pipeline orchestration.
//!
//! [`MemePipeline`] runs the end-to-end commands (`create`, `script-tts`,
//! `from-audio`, `video`, `preview`, ...) over the trait-object backends,
//! tracking progress as a [`PipelineStage`] and laying files out with
//! [`ProjectLayout`].  [`RunSummary`] renders the TXT/JSON summaries.

pub mod layout;
pub mod runner;
pub mod stage;
pub mod summary;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use layout::ProjectLayout;
pub use runner::{FromAudioOutcome, MemeOutcome, MemePipeline, PipelineError, SpeechOutcome};
pub use stage::PipelineStage;
pub use summary::{RunSummary, SummaryKind};
