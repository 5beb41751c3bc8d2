//! Application entry point: memeforge CLI.
//!
//! # Startup sequence
//!
//! 1. Load `.env` (missing is fine).
//! 2. Parse arguments and initialise logging (`--verbose` → debug).
//! 3. Load [`AppSettings`] (defaults on first run).
//! 4. Dispatch the subcommand; failures print `Error: ...` and exit 1.

mod cli;
mod commands;

use clap::Parser;
use env_logger::Env;

use memeforge::config::AppSettings;

use cli::{Cli, Commands};
use commands::*;

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = AppSettings::load()?;
    log::debug!("ffmpeg: {}", settings.tools.ffmpeg_path);

    match cli.command {
        Commands::Create { config, merge } => cmd_create(&config, merge, &settings).await,
        Commands::Script { config } => cmd_script(&config, &settings).await,
        Commands::ScriptTts { config, merge } => cmd_script_tts(&config, merge, &settings).await,
        Commands::LoadScript { file, config } => cmd_load_script(&file, config.as_deref()),
        Commands::Tts { script_file, config } => cmd_tts(&script_file, &config, &settings).await,
        Commands::Merge { audio_dir, output, delay } => {
            cmd_merge(&audio_dir, &output, delay, &settings).await
        }
        Commands::AudioScript { project_dir } => cmd_audio_script(&project_dir, &settings).await,
        Commands::Video { audio_dir, config, output } => {
            cmd_video(&audio_dir, &config, output, &settings).await
        }
        Commands::VideoFromMetadata { metadata, config, output } => {
            cmd_video_from_metadata(&metadata, &config, output, &settings).await
        }
        Commands::FromAudio { audio_dir, config, merge } => {
            cmd_from_audio(&audio_dir, &config, merge, &settings).await
        }
        Commands::Preview { audio_dir, config, seconds } => {
            cmd_preview(&audio_dir, &config, seconds, &settings).await
        }
        Commands::Voices { config } => cmd_voices(&config).await,
        Commands::UploadVoice { config, files, predefined, force } => {
            cmd_upload_voice(&config, &files, predefined, force).await
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Environment
    let _ = dotenvy::dotenv();

    // 2. Arguments + logging
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    // 3-4. Settings + dispatch
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
