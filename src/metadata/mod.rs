//! Audio-script metadata: the JSON document, SRT subtitles and the
//! loaders that rebuild an [`AudioScript`](crate::audio::AudioScript) from
//! a directory.

pub mod json;
pub mod loader;
pub mod srt;

use std::path::PathBuf;

use thiserror::Error;

use crate::script::ScriptError;

pub use json::{
    read_metadata, read_metadata_document, write_metadata, AudioMetadata, MetadataDocument,
    MetadataEntry, METADATA_FILE,
};
pub use loader::{
    build_complete_audio_script, list_audio_files, load_from_directory, load_from_srt,
    load_with_fallback, COMPLETE_AUDIO_SCRIPT_FILE, SUBTITLES_FILE,
};
pub use srt::{format_timestamp, generate_srt, parse_srt, read_srt, write_srt, SubtitleCue};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("metadata I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Script(#[from] ScriptError),
}
