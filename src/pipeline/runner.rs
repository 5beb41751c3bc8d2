//! Pipeline runner: script → speech → merge → video → summary.
//!
//! [`MemePipeline`] holds the backends behind traits and runs each
//! command's sequence of stages against a [`ProjectConfig`].  Every stage
//! writes its artifacts to disk under the [`ProjectLayout`] so later
//! commands can pick up where an earlier one stopped.
//!
//! ```text
//! run_full            GeneratingScript → SynthesizingSpeech → [MergingAudio]
//!                     → RenderingVideo → WritingSummary
//! run_script_and_tts  GeneratingScript → SynthesizingSpeech → [MergingAudio]
//!                     → WritingSummary
//! run_from_audio      [MergingAudio] → RenderingVideo
//! video_*, preview    RenderingVideo
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::layout::ProjectLayout;
use super::stage::PipelineStage;
use super::summary::{RunSummary, SummaryKind};
use crate::audio::{AudioError, AudioFile, AudioMerger, AudioScript, DurationProbe};
use crate::config::{ConfigError, ProjectConfig};
use crate::llm::LlmClient;
use crate::metadata::{
    load_from_directory, load_with_fallback, read_metadata_document, MetadataError,
};
use crate::script::{load_auto, Script, ScriptEntry, ScriptError, ScriptGenerator};
use crate::tts::{SpeechGenerator, TtsError, TtsService};
use crate::video::{
    build_project, scenes_from_audio_script, scenes_from_metadata, VideoError, VideoFile,
    VideoService,
};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Any failure of a pipeline command.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Tts(#[from] TtsError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Video(#[from] VideoError),

    /// The pipeline was built without the backend a command needs.
    #[error("{0} service is not configured")]
    ServiceUnavailable(&'static str),

    #[error("No audio files found in {}", .0.display())]
    NoAudio(PathBuf),

    #[error("failed to write summary: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Everything [`MemePipeline::run_full`] produced.
#[derive(Debug, Clone)]
pub struct MemeOutcome {
    pub entries: Vec<ScriptEntry>,
    pub audio_script: AudioScript,
    pub merged: Option<AudioFile>,
    pub video: VideoFile,
}

/// Result of [`MemePipeline::run_script_and_tts`].
#[derive(Debug, Clone)]
pub struct SpeechOutcome {
    pub entries: Vec<ScriptEntry>,
    pub audio_script: AudioScript,
    pub merged: Option<AudioFile>,
}

/// Result of [`MemePipeline::run_from_audio`].
#[derive(Debug, Clone)]
pub struct FromAudioOutcome {
    pub audio_script: AudioScript,
    pub merged: Option<AudioFile>,
    pub video: VideoFile,
}

// ---------------------------------------------------------------------------
// MemePipeline
// ---------------------------------------------------------------------------

/// Runs pipeline commands against injected backends.
///
/// The LLM and TTS backends are optional so commands that only touch
/// existing audio can run without API keys or a TTS server.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use memeforge::audio::Ffmpeg;
/// use memeforge::config::ProjectConfig;
/// use memeforge::pipeline::MemePipeline;
/// use memeforge::video::FfmpegCompositor;
///
/// #[tokio::main]
/// async fn main() {
///     let config = ProjectConfig::load_from("config.json".as_ref()).unwrap();
///     let pipeline = MemePipeline::new(
///         Arc::new(FfmpegCompositor::default()),
///         Arc::new(Ffmpeg::default()),
///     );
///     let video = pipeline
///         .video_with_subtitles("out/demo/tts".as_ref(), &config, None)
///         .await
///         .unwrap();
///     println!("{}", video.path.display());
/// }
/// ```
pub struct MemePipeline {
    llm: Option<Arc<dyn LlmClient>>,
    tts: Option<Arc<dyn TtsService>>,
    video: Arc<dyn VideoService>,
    probe: Arc<dyn DurationProbe>,
    merger: AudioMerger,
    stage: Mutex<PipelineStage>,
}

impl MemePipeline {
    pub fn new(video: Arc<dyn VideoService>, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            llm: None,
            tts: None,
            video,
            probe,
            merger: AudioMerger::default(),
            stage: Mutex::new(PipelineStage::Idle),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_tts(mut self, tts: Arc<dyn TtsService>) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn with_merger(mut self, merger: AudioMerger) -> Self {
        self.merger = merger;
        self
    }

    /// The stage the last (or current) command reached.
    pub fn stage(&self) -> PipelineStage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_stage(&self, stage: PipelineStage) {
        let mut current = self.stage.lock().unwrap_or_else(|e| e.into_inner());
        if *current != stage {
            log::info!("[pipeline] {} -> {}", current.label(), stage.label());
            *current = stage;
        }
    }

    /// Await `run`, ending in `Done` or `Failed`.
    async fn tracked<T>(
        &self,
        run: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        match run.await {
            Ok(value) => {
                self.set_stage(PipelineStage::Done);
                Ok(value)
            }
            Err(e) => {
                log::error!("[pipeline] {} failed: {e}", self.stage().label());
                self.set_stage(PipelineStage::Failed);
                Err(e)
            }
        }
    }

    fn llm(&self) -> Result<Arc<dyn LlmClient>, PipelineError> {
        self.llm
            .clone()
            .ok_or(PipelineError::ServiceUnavailable("LLM"))
    }

    fn speech(&self) -> Result<SpeechGenerator, PipelineError> {
        let tts = self
            .tts
            .clone()
            .ok_or(PipelineError::ServiceUnavailable("TTS"))?;
        Ok(SpeechGenerator::new(tts, Arc::clone(&self.probe)))
    }

    // -----------------------------------------------------------------------
    // Stage helpers
    // -----------------------------------------------------------------------

    async fn generate_script(
        &self,
        config: &ProjectConfig,
        layout: &ProjectLayout,
    ) -> Result<Script, PipelineError> {
        let script_cfg = config.require_script()?;
        self.set_stage(PipelineStage::GeneratingScript);
        let script = ScriptGenerator::new(self.llm()?)
            .generate_and_save(script_cfg, &layout.scripts_dir())
            .await?;
        Ok(script)
    }

    async fn synthesize(
        &self,
        entries: &[ScriptEntry],
        layout: &ProjectLayout,
    ) -> Result<AudioScript, PipelineError> {
        self.set_stage(PipelineStage::SynthesizingSpeech);
        let audio = self
            .speech()?
            .synthesize_entries(entries, &layout.tts_dir())
            .await?;
        Ok(audio)
    }

    async fn maybe_merge(
        &self,
        audio: &AudioScript,
        merge: bool,
        delay: f64,
        output: &Path,
    ) -> Result<Option<AudioFile>, PipelineError> {
        if !merge || audio.is_empty() {
            return Ok(None);
        }
        self.set_stage(PipelineStage::MergingAudio);
        let merged = self.merger.merge(&audio.audio_files, output, delay).await?;
        Ok(Some(merged))
    }

    /// Metadata JSON or SRT in `dir`, else a directory scan.  Characters
    /// are matched against the config cast so images and voices carry over.
    async fn load_audio(
        &self,
        dir: &Path,
        config: &ProjectConfig,
    ) -> Result<AudioScript, PipelineError> {
        let mut script = match load_with_fallback(dir) {
            Some(script) => script,
            None => load_from_directory(dir, &config.characters, self.probe.as_ref()).await?,
        };
        if script.is_empty() {
            return Err(PipelineError::NoAudio(dir.to_path_buf()));
        }

        let cast = config.character_map();
        for file in &mut script.audio_files {
            if let Some(c) = cast.get(&file.character.name) {
                file.character = c.clone();
            }
        }
        Ok(script)
    }

    async fn render_audio(
        &self,
        audio: &AudioScript,
        config: &ProjectConfig,
        output: &Path,
    ) -> Result<VideoFile, PipelineError> {
        let video_cfg = config.require_video()?;
        self.set_stage(PipelineStage::RenderingVideo);
        let project = build_project(video_cfg, scenes_from_audio_script(audio))?;
        let video = self
            .video
            .create_video(&project, output, &video_cfg.render)
            .await?;
        Ok(video)
    }

    fn write_summary(
        &self,
        summary: &RunSummary,
        txt: &Path,
        json: &Path,
    ) -> Result<(), PipelineError> {
        self.set_stage(PipelineStage::WritingSummary);
        summary.write_text(txt)?;
        summary.write_json(json)?;
        log::info!("Summary written to {}", txt.display());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Generate a script into `scripts/` and return it.
    pub async fn run_script(&self, config: &ProjectConfig) -> Result<Script, PipelineError> {
        let layout = ProjectLayout::new(config);
        self.tracked(self.generate_script(config, &layout)).await
    }

    /// Synthesize an existing script file into `tts/`.
    pub async fn run_tts(
        &self,
        script_file: &Path,
        config: &ProjectConfig,
    ) -> Result<AudioScript, PipelineError> {
        self.tracked(async {
            config.require_tts()?;
            let script = load_auto(script_file, &config.characters)?;
            let layout = ProjectLayout::new(config);
            self.synthesize(&script.entries, &layout).await
        })
        .await
    }

    /// Script, speech, optional merge, video and summaries.
    pub async fn run_full(
        &self,
        config: &ProjectConfig,
        merge: bool,
        delay: f64,
    ) -> Result<MemeOutcome, PipelineError> {
        self.tracked(async {
            config.require_script()?;
            config.require_tts()?;
            config.require_video()?;
            let layout = ProjectLayout::new(config);

            let script = self.generate_script(config, &layout).await?;
            let audio = self.synthesize(&script.entries, &layout).await?;
            let merged = self
                .maybe_merge(&audio, merge, delay, &layout.merged_audio())
                .await?;
            let video = self.render_audio(&audio, config, &layout.meme_video()).await?;

            let summary = RunSummary::new(
                SummaryKind::Complete,
                &config.project_name,
                &script.entries,
                &audio,
                merged.as_ref(),
                Some(&video),
            );
            self.write_summary(&summary, &layout.meme_summary(), &layout.summary_json())?;

            Ok(MemeOutcome {
                entries: script.entries,
                audio_script: audio,
                merged,
                video,
            })
        })
        .await
    }

    /// Script, speech, optional merge and summaries; no video.
    pub async fn run_script_and_tts(
        &self,
        config: &ProjectConfig,
        merge: bool,
        delay: f64,
    ) -> Result<SpeechOutcome, PipelineError> {
        self.tracked(async {
            config.require_script()?;
            config.require_tts()?;
            let layout = ProjectLayout::new(config);

            let script = self.generate_script(config, &layout).await?;
            let audio = self.synthesize(&script.entries, &layout).await?;
            let merged = self
                .maybe_merge(&audio, merge, delay, &layout.merged_audio())
                .await?;

            let summary = RunSummary::new(
                SummaryKind::ScriptAndTts,
                &config.project_name,
                &script.entries,
                &audio,
                merged.as_ref(),
                None,
            );
            self.write_summary(&summary, &layout.summary_txt(), &layout.summary_json())?;

            Ok(SpeechOutcome {
                entries: script.entries,
                audio_script: audio,
                merged,
            })
        })
        .await
    }

    /// Optional merge and video from audio that already exists.
    pub async fn run_from_audio(
        &self,
        audio_dir: &Path,
        config: &ProjectConfig,
        merge: bool,
        delay: f64,
    ) -> Result<FromAudioOutcome, PipelineError> {
        self.tracked(async {
            config.require_video()?;
            let layout = ProjectLayout::new(config);

            let audio = self.load_audio(audio_dir, config).await?;
            let merged = self
                .maybe_merge(&audio, merge, delay, &layout.from_audio_merged())
                .await?;
            let video = self
                .render_audio(&audio, config, &layout.from_audio_video())
                .await?;

            Ok(FromAudioOutcome {
                audio_script: audio,
                merged,
                video,
            })
        })
        .await
    }

    /// Video with subtitles from a directory of synthesized audio.
    pub async fn video_with_subtitles(
        &self,
        audio_dir: &Path,
        config: &ProjectConfig,
        output: Option<&Path>,
    ) -> Result<VideoFile, PipelineError> {
        self.tracked(async {
            config.require_video()?;
            let layout = ProjectLayout::new(config);
            let output = output.map_or_else(|| layout.with_subtitles_video(), Path::to_path_buf);

            let audio = self.load_audio(audio_dir, config).await?;
            self.render_audio(&audio, config, &output).await
        })
        .await
    }

    /// Video placed at the start times recorded in a metadata JSON file.
    pub async fn video_from_metadata(
        &self,
        metadata_json: &Path,
        config: &ProjectConfig,
        output: Option<&Path>,
    ) -> Result<VideoFile, PipelineError> {
        self.tracked(async {
            let video_cfg = config.require_video()?;
            let layout = ProjectLayout::new(config);
            let output = output.map_or_else(|| layout.from_metadata_video(), Path::to_path_buf);

            let doc = read_metadata_document(metadata_json)?;
            self.set_stage(PipelineStage::RenderingVideo);
            let project = build_project(video_cfg, scenes_from_metadata(&doc))?;
            let video = self
                .video
                .create_video(&project, &output, &video_cfg.render)
                .await?;
            Ok(video)
        })
        .await
    }

    /// Low-quality render of the first `seconds` of the audio in `audio_dir`.
    pub async fn preview(
        &self,
        audio_dir: &Path,
        config: &ProjectConfig,
        seconds: f64,
    ) -> Result<VideoFile, PipelineError> {
        self.tracked(async {
            let video_cfg = config.require_video()?;
            let layout = ProjectLayout::new(config);

            let audio = self.load_audio(audio_dir, config).await?;
            self.set_stage(PipelineStage::RenderingVideo);
            let project = build_project(video_cfg, scenes_from_audio_script(&audio))?;
            let video = self
                .video
                .preview_video(&project, &layout.preview_video(), &video_cfg.render, seconds)
                .await?;
            Ok(video)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
