//! Audio records produced by speech synthesis and consumed by merging and
//! video composition.

use std::path::PathBuf;

use crate::config::Character;

/// One synthesized line.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    pub path: PathBuf,
    pub character: Character,
    pub dialogue: String,
    pub duration_seconds: Option<f64>,
    pub file_size_bytes: Option<u64>,
}

impl AudioFile {
    pub fn new(path: impl Into<PathBuf>, character: Character, dialogue: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            character,
            dialogue: dialogue.into(),
            duration_seconds: None,
            file_size_bytes: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_size(mut self, bytes: u64) -> Self {
        self.file_size_bytes = Some(bytes);
        self
    }

    /// File name component, or the empty string.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// The ordered set of audio files for one dialogue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioScript {
    pub audio_files: Vec<AudioFile>,
    pub total_duration_seconds: f64,
}

impl AudioScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: Vec<AudioFile>) -> Self {
        let mut script = Self::new();
        for f in files {
            script.add(f);
        }
        script
    }

    /// Append a file and add its duration (if known) to the total.
    pub fn add(&mut self, file: AudioFile) {
        self.total_duration_seconds += file.duration_seconds.unwrap_or(0.0);
        self.audio_files.push(file);
    }

    pub fn len(&self) -> usize {
        self.audio_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio_files.is_empty()
    }

    /// Unique character names in order of first appearance.
    pub fn characters(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for f in &self.audio_files {
            if !seen.contains(&f.character.name) {
                seen.push(f.character.name.clone());
            }
        }
        seen
    }

    /// Back-to-back `(start, end)` for each file; unknown durations count
    /// as zero.
    pub fn timeline(&self) -> Vec<(f64, f64)> {
        let mut t = 0.0;
        self.audio_files
            .iter()
            .map(|f| {
                let start = t;
                t += f.duration_seconds.unwrap_or(0.0);
                (start, t)
            })
            .collect()
    }
}
