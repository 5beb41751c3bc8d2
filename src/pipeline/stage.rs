//! Pipeline stage tracking.
//!
//! [`PipelineStage`] records which step a [`MemePipeline`](super::MemePipeline)
//! is on.  Transitions are logged as they happen.

/// Steps of a meme-creation run.
///
/// ```text
/// Idle ──▶ GeneratingScript ──▶ SynthesizingSpeech ──▶ MergingAudio
///      ──▶ RenderingVideo ──▶ WritingSummary ──▶ Done
/// any stage ──error──▶ Failed
/// ```
///
/// Partial runs (`from-audio`, `preview`, ...) enter the chain part way
/// through and skip steps that do not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    /// Nothing has run yet.
    #[default]
    Idle,

    /// Waiting on the LLM for a dialogue.
    GeneratingScript,

    /// Calling the TTS server line by line.
    SynthesizingSpeech,

    /// Concatenating per-line audio with ffmpeg.
    MergingAudio,

    /// ffmpeg is compositing the video.
    RenderingVideo,

    /// Writing the TXT and JSON summaries.
    WritingSummary,

    /// The run finished successfully.
    Done,

    /// The run stopped on an error.
    Failed,
}

impl PipelineStage {
    /// Returns `true` while a stage is doing work.
    ///
    /// ```
    /// use memeforge::pipeline::PipelineStage;
    ///
    /// assert!(!PipelineStage::Idle.is_busy());
    /// assert!(PipelineStage::GeneratingScript.is_busy());
    /// assert!(PipelineStage::RenderingVideo.is_busy());
    /// assert!(!PipelineStage::Done.is_busy());
    /// assert!(!PipelineStage::Failed.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            PipelineStage::Idle | PipelineStage::Done | PipelineStage::Failed
        )
    }

    /// A short human-readable label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::GeneratingScript => "Generating script",
            PipelineStage::SynthesizingSpeech => "Synthesizing speech",
            PipelineStage::MergingAudio => "Merging audio",
            PipelineStage::RenderingVideo => "Rendering video",
            PipelineStage::WritingSummary => "Writing summary",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
