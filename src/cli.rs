//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memeforge")]
#[command(about = "Generate dialogue, voice it and render a subtitled meme video")]
#[command(version)]
pub struct Cli {
    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by commands that can merge audio.
#[derive(Args, Debug, Clone, Copy)]
pub struct MergeArgs {
    /// Keep per-line audio only
    #[arg(long)]
    pub no_merge: bool,

    /// Seconds of silence between merged lines
    #[arg(long)]
    pub delay: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full pipeline: script, speech, merge, video and summary
    Create {
        config: PathBuf,
        #[command(flatten)]
        merge: MergeArgs,
    },

    /// Generate a script only and print it
    Script { config: PathBuf },

    /// Script and speech, optionally merged, with a summary
    ScriptTts {
        config: PathBuf,
        #[command(flatten)]
        merge: MergeArgs,
    },

    /// Load a dialogue, numbered or JSON script file and preview it
    LoadScript {
        file: PathBuf,

        /// Project config supplying the cast
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Synthesize an existing script file
    Tts { script_file: PathBuf, config: PathBuf },

    /// Merge a directory of audio into one file
    Merge {
        audio_dir: PathBuf,
        output: PathBuf,

        /// Seconds of silence between files
        #[arg(long)]
        delay: Option<f64>,
    },

    /// Rebuild audio_script.json from a project's scripts/ and tts/
    AudioScript { project_dir: PathBuf },

    /// Subtitled video from a directory of audio
    Video {
        audio_dir: PathBuf,
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Subtitled video from an audio metadata JSON file
    VideoFromMetadata {
        metadata: PathBuf,
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge and render a video from existing audio
    FromAudio {
        audio_dir: PathBuf,
        config: PathBuf,
        #[command(flatten)]
        merge: MergeArgs,
    },

    /// Quick low-quality render of the first few seconds
    Preview {
        audio_dir: PathBuf,
        config: PathBuf,

        /// Preview length in seconds
        #[arg(short, long)]
        seconds: Option<f64>,
    },

    /// List the TTS server's voices and reference files
    Voices { config: PathBuf },

    /// Upload voice files to the TTS server
    UploadVoice {
        config: PathBuf,

        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Upload as predefined voices instead of clone references
        #[arg(long)]
        predefined: bool,

        /// Upload even if a file with the same name exists
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_merge_flags_and_global_verbose() {
        let cli = Cli::parse_from(["memeforge", "create", "cfg.json", "--no-merge", "--delay", "0.5", "-v"]);
        assert!(cli.verbose);
        let Commands::Create { config, merge } = cli.command else {
            panic!("expected create");
        };
        assert_eq!(config, PathBuf::from("cfg.json"));
        assert!(merge.no_merge);
        assert_eq!(merge.delay, Some(0.5));
    }

    #[test]
    fn upload_requires_files() {
        assert!(Cli::try_parse_from(["memeforge", "upload-voice", "cfg.json"]).is_err());
        let cli = Cli::parse_from(["memeforge", "upload-voice", "cfg.json", "a.wav", "b.wav", "--predefined"]);
        let Commands::UploadVoice { files, predefined, force, .. } = cli.command else {
            panic!("expected upload-voice");
        };
        assert_eq!(files.len(), 2);
        assert!(predefined && !force);
    }
}
