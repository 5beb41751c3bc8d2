//! `audio_script_metadata.json` reading and writing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::MetadataError;
use crate::audio::{AudioFile, AudioScript};
use crate::config::Character;

/// File name written next to the synthesized audio.
pub const METADATA_FILE: &str = "audio_script_metadata.json";

/// Timing and size details for one audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub filename: String,
    pub full_path: PathBuf,
    /// Zero when unknown.
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub character: Character,
    pub dialogue: String,
    pub audio_metadata: AudioMetadata,
}

/// The on-disk metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub total_duration_seconds: f64,
    pub audio_files: Vec<MetadataEntry>,
}

impl MetadataDocument {
    /// Describe `script` with back-to-back start/end times.
    pub fn from_audio_script(script: &AudioScript) -> Self {
        let audio_files = script
            .audio_files
            .iter()
            .zip(script.timeline())
            .map(|(f, (start, end))| MetadataEntry {
                character: f.character.clone(),
                dialogue: f.dialogue.clone(),
                audio_metadata: AudioMetadata {
                    filename: f.filename(),
                    full_path: f.path.clone(),
                    duration_seconds: f.duration_seconds.unwrap_or(0.0),
                    file_size_bytes: f.file_size_bytes.unwrap_or(0),
                    start_time: start,
                    end_time: end,
                },
            })
            .collect();

        Self {
            total_duration_seconds: script.total_duration_seconds,
            audio_files,
        }
    }

    /// Rebuild the [`AudioScript`]; zero durations and sizes read back as
    /// unknown.
    pub fn to_audio_script(&self) -> AudioScript {
        let files = self
            .audio_files
            .iter()
            .map(|e| {
                let m = &e.audio_metadata;
                AudioFile {
                    path: m.full_path.clone(),
                    character: e.character.clone(),
                    dialogue: e.dialogue.clone(),
                    duration_seconds: (m.duration_seconds > 0.0).then_some(m.duration_seconds),
                    file_size_bytes: (m.file_size_bytes > 0).then_some(m.file_size_bytes),
                }
            })
            .collect();
        AudioScript::from_files(files)
    }
}

/// Write `script` as pretty JSON to `path`.
pub fn write_metadata(script: &AudioScript, path: &Path) -> Result<(), MetadataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let doc = MetadataDocument::from_audio_script(script);
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    log::debug!("wrote metadata for {} files to {}", doc.audio_files.len(), path.display());
    Ok(())
}

pub fn read_metadata_document(path: &Path) -> Result<MetadataDocument, MetadataError> {
    if !path.exists() {
        return Err(MetadataError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn read_metadata(path: &Path) -> Result<AudioScript, MetadataError> {
    Ok(read_metadata_document(path)?.to_audio_script())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
