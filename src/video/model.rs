//! Video composition records and the video error type.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::{AudioError, AudioFile};
use crate::config::Character;
use crate::metadata::MetadataError;

// ---------------------------------------------------------------------------
// VideoError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Invalid video file: {0}")]
    InvalidFile(String),

    #[error("No scenes to render")]
    NoScenes,

    #[error("could not probe {}: {message}", .path.display())]
    Probe { path: PathBuf, message: String },

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("video I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Video creation failed after {elapsed:.2}s: {source}")]
    Failed {
        elapsed: f64,
        #[source]
        source: Box<VideoError>,
    },
}

// ---------------------------------------------------------------------------
// Format and quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Avi,
    Mov,
}

impl VideoFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Avi => "avi",
            VideoFormat::Mov => "mov",
        }
    }

    /// Video codec the container calls for.
    pub fn codec(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 | VideoFormat::Mov => "libx264",
            VideoFormat::Avi => "libxvid",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl VideoQuality {
    /// x264 constant rate factor.
    pub fn crf(&self) -> u8 {
        match self {
            VideoQuality::Low => 28,
            VideoQuality::Medium => 23,
            VideoQuality::High => 18,
            VideoQuality::Ultra => 15,
        }
    }

    /// x264 speed preset.
    pub fn preset(&self) -> &'static str {
        match self {
            VideoQuality::Low => "faster",
            VideoQuality::Medium => "medium",
            VideoQuality::High => "slow",
            VideoQuality::Ultra => "slower",
        }
    }
}

// ---------------------------------------------------------------------------
// Clips and scenes
// ---------------------------------------------------------------------------

/// The background video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoClip {
    pub path: PathBuf,
    pub start_time: f64,
    pub duration: Option<f64>,
}

impl VideoClip {
    pub fn new(path: impl Into<PathBuf>, start_time: f64, duration: Option<f64>) -> Result<Self, VideoError> {
        let path = path.into();
        if !path.exists() {
            return Err(VideoError::InvalidClip(format!(
                "Video file not found: {}",
                path.display()
            )));
        }
        if start_time < 0.0 {
            return Err(VideoError::InvalidClip("Start time cannot be negative".into()));
        }
        if duration.is_some_and(|d| d <= 0.0) {
            return Err(VideoError::InvalidClip("Duration must be positive".into()));
        }
        Ok(Self {
            path,
            start_time,
            duration,
        })
    }
}

/// One line of dialogue placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterScene {
    pub character: Character,
    pub audio_file: AudioFile,
    pub start_time: f64,
    pub duration: f64,
    pub character_image: Option<PathBuf>,
}

impl CharacterScene {
    pub fn new(
        character: Character,
        audio_file: AudioFile,
        start_time: f64,
        duration: f64,
        character_image: Option<PathBuf>,
    ) -> Result<Self, VideoError> {
        if start_time < 0.0 {
            return Err(VideoError::InvalidScene("Start time cannot be negative".into()));
        }
        if duration <= 0.0 {
            return Err(VideoError::InvalidScene("Duration must be positive".into()));
        }
        if let Some(img) = &character_image {
            if !img.exists() {
                return Err(VideoError::InvalidScene(format!(
                    "Character image not found: {}",
                    img.display()
                )));
            }
        }
        Ok(Self {
            character,
            audio_file,
            start_time,
            duration,
            character_image,
        })
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn dialogue(&self) -> &str {
        &self.audio_file.dialogue
    }
}

/// Everything needed to render one video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProject {
    pub background: VideoClip,
    pub scenes: Vec<CharacterScene>,
    pub output_format: VideoFormat,
    pub quality: VideoQuality,
    pub enable_subtitles: bool,
}

impl VideoProject {
    pub fn total_duration(&self) -> f64 {
        self.scenes
            .iter()
            .map(CharacterScene::end_time)
            .fold(0.0, f64::max)
    }

    /// Unique character names in order of first appearance.
    pub fn characters(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for s in &self.scenes {
            if !seen.contains(&s.character.name) {
                seen.push(s.character.name.clone());
            }
        }
        seen
    }

    pub fn scenes_for(&self, name: &str) -> Vec<&CharacterScene> {
        self.scenes
            .iter()
            .filter(|s| s.character.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// The first `seconds` of the project at low quality: later scenes are
    /// dropped and the last one is shortened to fit.
    pub fn preview(&self, seconds: f64) -> Self {
        let scenes = self
            .scenes
            .iter()
            .filter(|s| s.start_time < seconds)
            .map(|s| {
                let mut s = s.clone();
                s.duration = s.duration.min(seconds - s.start_time);
                s
            })
            .collect();

        Self {
            background: self.background.clone(),
            scenes,
            output_format: self.output_format,
            quality: VideoQuality::Low,
            enable_subtitles: self.enable_subtitles,
        }
    }
}

/// A rendered video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub file_size_bytes: u64,
    pub render_time_seconds: f64,
}

impl VideoFile {
    pub fn new(path: &Path, render_time_seconds: f64) -> Result<Self, VideoError> {
        if !path.exists() {
            return Err(VideoError::InvalidFile(format!(
                "Video file not found: {}",
                path.display()
            )));
        }
        if render_time_seconds < 0.0 {
            return Err(VideoError::InvalidFile("Render time cannot be negative".into()));
        }
        let file_size_bytes = std::fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file_size_bytes,
            render_time_seconds,
        })
    }

    pub fn size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scene(name: &str, start: f64, duration: f64) -> CharacterScene {
        let c = Character::basic(name);
        let audio = AudioFile::new(format!("{name}.wav"), c.clone(), "line");
        CharacterScene::new(c, audio, start, duration, None).unwrap()
    }

    fn project(dir: &Path, scenes: Vec<CharacterScene>) -> VideoProject {
        let bg = dir.join("bg.mp4");
        std::fs::write(&bg, b"video").unwrap();
        VideoProject {
            background: VideoClip::new(bg, 0.0, None).unwrap(),
            scenes,
            output_format: VideoFormat::Mp4,
            quality: VideoQuality::High,
            enable_subtitles: true,
        }
    }

    #[test]
    fn quality_presets() {
        assert_eq!((VideoQuality::Low.crf(), VideoQuality::Low.preset()), (28, "faster"));
        assert_eq!((VideoQuality::Ultra.crf(), VideoQuality::Ultra.preset()), (15, "slower"));
        assert_eq!(VideoFormat::Avi.codec(), "libxvid");
        assert_eq!(VideoFormat::Mov.codec(), "libx264");
    }

    #[test]
    fn serde_names_are_lowercase() {
        let q: VideoQuality = serde_json::from_str("\"ultra\"").unwrap();
        assert_eq!(q, VideoQuality::Ultra);
        assert_eq!(serde_json::to_string(&VideoFormat::Mov).unwrap(), "\"mov\"");
    }

    #[test]
    fn clip_and_scene_validation() {
        let dir = tempdir().expect("temp dir");
        assert!(matches!(
            VideoClip::new(dir.path().join("missing.mp4"), 0.0, None),
            Err(VideoError::InvalidClip(_))
        ));

        let c = Character::basic("A");
        let audio = AudioFile::new("a.wav", c.clone(), "");
        assert!(CharacterScene::new(c.clone(), audio.clone(), -1.0, 1.0, None).is_err());
        assert!(CharacterScene::new(c.clone(), audio.clone(), 0.0, 0.0, None).is_err());
        assert!(CharacterScene::new(c, audio, 0.0, 1.0, Some(dir.path().join("no.png"))).is_err());
    }

    #[test]
    fn project_duration_and_lookup() {
        let dir = tempdir().expect("temp dir");
        let p = project(dir.path(), vec![scene("A", 0.0, 2.0), scene("B", 2.0, 3.0), scene("a", 5.0, 1.0)]);
        assert_eq!(p.total_duration(), 6.0);
        assert_eq!(p.characters(), vec!["A", "B", "a"]);
        assert_eq!(p.scenes_for("A").len(), 2);

        let empty = project(dir.path(), Vec::new());
        assert_eq!(empty.total_duration(), 0.0);
    }

    #[test]
    fn preview_clips_scenes_and_forces_low_quality() {
        let dir = tempdir().expect("temp dir");
        let p = project(dir.path(), vec![scene("A", 0.0, 4.0), scene("B", 4.0, 4.0), scene("A", 8.0, 2.0)]);
        let preview = p.preview(6.0);
        assert_eq!(preview.scenes.len(), 2);
        assert_eq!(preview.scenes[1].duration, 2.0);
        assert_eq!(preview.total_duration(), 6.0);
        assert_eq!(preview.quality, VideoQuality::Low);
    }
}
