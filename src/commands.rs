//! Handlers for each CLI subcommand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use memeforge::audio::{AudioFile, AudioMerger, AudioScript, Ffmpeg};
use memeforge::config::{AppSettings, ProjectConfig};
use memeforge::llm::GeminiClient;
use memeforge::metadata::build_complete_audio_script;
use memeforge::pipeline::{MemePipeline, ProjectLayout};
use memeforge::script::{load_auto, ScriptEntry};
use memeforge::tts::{ChatterboxClient, TtsService};
use memeforge::video::{FfmpegCompositor, VideoFile};

use crate::cli::MergeArgs;

/// Entries shown by previews before "... and N more".
const PREVIEW_ENTRIES: usize = 3;

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Which remote backends a command needs.
#[derive(Clone, Copy)]
enum Backends {
    Local,
    Speech,
    ScriptAndSpeech,
}

fn build_pipeline(
    config: &ProjectConfig,
    settings: &AppSettings,
    backends: Backends,
) -> Result<MemePipeline> {
    let ffmpeg = Ffmpeg::from_settings(&settings.tools);
    let mut pipeline = MemePipeline::new(
        Arc::new(FfmpegCompositor::new(ffmpeg.clone())),
        Arc::new(ffmpeg.clone()),
    )
    .with_merger(AudioMerger::new(ffmpeg));

    if matches!(backends, Backends::ScriptAndSpeech) {
        let script = config.require_script()?;
        pipeline = pipeline.with_llm(Arc::new(GeminiClient::from_config(
            &script.llm,
            &settings.services,
        )?));
    }
    if matches!(backends, Backends::Speech | Backends::ScriptAndSpeech) {
        pipeline = pipeline.with_tts(tts_client(config)?);
    }
    Ok(pipeline)
}

fn tts_client(config: &ProjectConfig) -> Result<Arc<dyn TtsService>> {
    let chatterbox = config.require_tts()?.chatterbox()?;
    Ok(Arc::new(ChatterboxClient::from_config(chatterbox)))
}

fn merge_options(args: MergeArgs, settings: &AppSettings) -> (bool, f64) {
    (
        settings.defaults.merge_audio && !args.no_merge,
        args.delay.unwrap_or(settings.defaults.delay_between_files),
    )
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_entries(entries: &[ScriptEntry]) {
    for (i, entry) in entries.iter().take(PREVIEW_ENTRIES).enumerate() {
        println!("{}. {}: {}", i + 1, entry.character.name, entry.content);
    }
    if entries.len() > PREVIEW_ENTRIES {
        println!("... and {} more entries", entries.len() - PREVIEW_ENTRIES);
    }
}

fn print_audio(audio: &AudioScript) {
    println!("✓ Generated {} audio files", audio.len());
    println!("✓ Total duration: {:.2} seconds", audio.total_duration_seconds);
    println!("✓ Characters: {}", audio.characters().join(", "));
}

fn print_merged(merged: Option<&AudioFile>) {
    if let Some(m) = merged {
        println!("\nMerged audio:");
        println!("  - {}", m.path.display());
        println!("  - Duration: {:.2} seconds", m.duration_seconds.unwrap_or(0.0));
        println!(
            "  - Size: {:.2} MB",
            m.file_size_bytes.unwrap_or(0) as f64 / 1024.0 / 1024.0
        );
    }
}

fn print_video(video: &VideoFile) {
    println!("\nVideo:");
    println!("  - {}", video.path.display());
    println!("  - Size: {:.2} MB", video.size_mb());
    println!("  - Render time: {:.2} seconds", video.render_time_seconds);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub async fn cmd_create(config: &Path, merge: MergeArgs, settings: &AppSettings) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let (merge, delay) = merge_options(merge, settings);
    let pipeline = build_pipeline(&config, settings, Backends::ScriptAndSpeech)?;
    let outcome = pipeline.run_full(&config, merge, delay).await?;

    println!("Complete Meme Creation Results for: {}", config.project_name);
    println!("✓ Generated {} script entries", outcome.entries.len());
    print_audio(&outcome.audio_script);
    print_merged(outcome.merged.as_ref());
    print_video(&outcome.video);
    println!("\nScript preview:");
    print_entries(&outcome.entries);
    Ok(())
}

pub async fn cmd_script(config: &Path, settings: &AppSettings) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let pipeline = build_pipeline(&config, settings, Backends::ScriptAndSpeech)?;
    let script = pipeline.run_script(&config).await?;
    println!("{}", script.to_dialogue());
    println!(
        "\nSaved {} entries to {}",
        script.len(),
        ProjectLayout::new(&config).script_entries().display()
    );
    Ok(())
}

pub async fn cmd_script_tts(config: &Path, merge: MergeArgs, settings: &AppSettings) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let (merge, delay) = merge_options(merge, settings);
    let pipeline = build_pipeline(&config, settings, Backends::ScriptAndSpeech)?;
    let outcome = pipeline.run_script_and_tts(&config, merge, delay).await?;

    println!("Script and TTS Results for: {}", config.project_name);
    println!("✓ Generated {} script entries", outcome.entries.len());
    print_audio(&outcome.audio_script);
    print_merged(outcome.merged.as_ref());
    println!("\nProject directory: {}", config.project_dir().display());
    Ok(())
}

pub fn cmd_load_script(file: &Path, config: Option<&Path>) -> Result<()> {
    let characters = match config {
        Some(path) => ProjectConfig::load_from(path)?.characters,
        None => Vec::new(),
    };
    let script = load_auto(file, &characters)?;
    println!("Loaded {} script entries from {}", script.len(), file.display());
    println!("Characters: {}", script.characters().join(", "));
    print_entries(&script.entries);
    Ok(())
}

pub async fn cmd_tts(script_file: &Path, config: &Path, settings: &AppSettings) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let pipeline = build_pipeline(&config, settings, Backends::Speech)?;
    let audio = pipeline.run_tts(script_file, &config).await?;
    print_audio(&audio);
    for f in &audio.audio_files {
        println!("  - {}", f.filename());
    }
    Ok(())
}

pub async fn cmd_merge(
    audio_dir: &Path,
    output: &Path,
    delay: Option<f64>,
    settings: &AppSettings,
) -> Result<()> {
    let ffmpeg = Ffmpeg::from_settings(&settings.tools);
    let delay = delay.unwrap_or(settings.defaults.delay_between_files);
    let merged = AudioMerger::new(ffmpeg.clone())
        .merge_directory(audio_dir, output, delay, &ffmpeg)
        .await?;
    print_merged(Some(&merged));
    Ok(())
}

pub async fn cmd_audio_script(project_dir: &Path, settings: &AppSettings) -> Result<()> {
    let ffmpeg = Ffmpeg::from_settings(&settings.tools);
    let audio = build_complete_audio_script(project_dir, &ffmpeg).await?;
    print_audio(&audio);
    Ok(())
}

pub async fn cmd_video(
    audio_dir: &Path,
    config: &Path,
    output: Option<PathBuf>,
    settings: &AppSettings,
) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let pipeline = build_pipeline(&config, settings, Backends::Local)?;
    let video = pipeline
        .video_with_subtitles(audio_dir, &config, output.as_deref())
        .await?;
    print_video(&video);
    Ok(())
}

pub async fn cmd_video_from_metadata(
    metadata: &Path,
    config: &Path,
    output: Option<PathBuf>,
    settings: &AppSettings,
) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let pipeline = build_pipeline(&config, settings, Backends::Local)?;
    let video = pipeline
        .video_from_metadata(metadata, &config, output.as_deref())
        .await?;
    print_video(&video);
    Ok(())
}

pub async fn cmd_from_audio(
    audio_dir: &Path,
    config: &Path,
    merge: MergeArgs,
    settings: &AppSettings,
) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let (merge, delay) = merge_options(merge, settings);
    let pipeline = build_pipeline(&config, settings, Backends::Local)?;
    let outcome = pipeline.run_from_audio(audio_dir, &config, merge, delay).await?;
    print_audio(&outcome.audio_script);
    print_merged(outcome.merged.as_ref());
    print_video(&outcome.video);
    Ok(())
}

pub async fn cmd_preview(
    audio_dir: &Path,
    config: &Path,
    seconds: Option<f64>,
    settings: &AppSettings,
) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let seconds = seconds.unwrap_or(settings.defaults.preview_seconds);
    let pipeline = build_pipeline(&config, settings, Backends::Local)?;
    let video = pipeline.preview(audio_dir, &config, seconds).await?;
    print_video(&video);
    Ok(())
}

pub async fn cmd_voices(config: &Path) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let catalog = tts_client(&config)?.list_available_voices().await;

    println!("Predefined voices ({}):", catalog.predefined.len());
    for v in &catalog.predefined {
        println!("  - {v}");
    }
    println!("Reference files ({}):", catalog.reference.len());
    for r in &catalog.reference {
        println!("  - {r}");
    }
    for e in &catalog.errors {
        log::warn!("{e}");
    }
    Ok(())
}

pub async fn cmd_upload_voice(
    config: &Path,
    files: &[PathBuf],
    predefined: bool,
    force: bool,
) -> Result<()> {
    let config = ProjectConfig::load_from(config)?;
    let tts = tts_client(&config)?;
    let mut failures = 0;
    for file in files {
        let result = if predefined {
            tts.upload_predefined(file, force).await
        } else {
            tts.upload_reference(file, force).await
        };
        match result {
            Ok(outcome) => println!("{outcome}"),
            Err(e) => {
                failures += 1;
                log::error!("Upload of {} failed: {e}", file.display());
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} uploads failed", files.len());
    }
    Ok(())
}
