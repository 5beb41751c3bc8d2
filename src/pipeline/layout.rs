//! Output file naming under `base_output_dir/project_name`.

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::script::SCRIPT_ENTRIES_FILE;

/// Every path a run reads or writes, derived from the project name.
///
/// ```text
/// {base}/{name}/
///   scripts/script_entries.json
///   tts/000_alice.wav ...
///   videos/{name}_meme.mp4
///   {name}_merged.wav
///   {name}_meme_summary.txt
///   {name}_summary.txt / {name}_summary.json
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLayout {
    name: String,
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            name: config.project_name.clone(),
            root: config.project_dir(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn tts_dir(&self) -> PathBuf {
        self.root.join("tts")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    pub fn script_entries(&self) -> PathBuf {
        self.scripts_dir().join(SCRIPT_ENTRIES_FILE)
    }

    fn named(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.name)
    }

    pub fn merged_audio(&self) -> PathBuf {
        self.root.join(self.named("_merged.wav"))
    }

    pub fn meme_video(&self) -> PathBuf {
        self.videos_dir().join(self.named("_meme.mp4"))
    }

    pub fn meme_summary(&self) -> PathBuf {
        self.root.join(self.named("_meme_summary.txt"))
    }

    pub fn summary_txt(&self) -> PathBuf {
        self.root.join(self.named("_summary.txt"))
    }

    pub fn summary_json(&self) -> PathBuf {
        self.root.join(self.named("_summary.json"))
    }

    pub fn from_audio_merged(&self) -> PathBuf {
        self.videos_dir().join(self.named("_from_audio_merged.wav"))
    }

    pub fn from_audio_video(&self) -> PathBuf {
        self.videos_dir().join(self.named("_from_audio.mp4"))
    }

    pub fn with_subtitles_video(&self) -> PathBuf {
        self.videos_dir().join(self.named("_with_subtitles.mp4"))
    }

    pub fn from_metadata_video(&self) -> PathBuf {
        self.videos_dir().join(self.named("_from_metadata.mp4"))
    }

    pub fn preview_video(&self) -> PathBuf {
        self.videos_dir().join(self.named("_preview.mp4"))
    }
}
