//! The `TtsService` trait and its error type.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::request::TtsRequest;
use crate::audio::AudioFile;
use crate::metadata::MetadataError;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Failed to connect to TTS server at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("TTS request timed out")]
    Timeout,

    #[error("Voice clone file '{0}' not found on TTS server. Please upload the file or use a predefined voice instead.")]
    CloneVoiceNotFound(String),

    #[error("Predefined voice '{0}' not found on TTS server.")]
    PredefinedVoiceNotFound(String),

    #[error("TTS resource not found: {0}")]
    ResourceNotFound(String),

    /// A 404 whose body was not JSON.
    #[error("TTS server returned 404: {0}")]
    NotFound(String),

    #[error("TTS server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("unexpected TTS server response: {0}")]
    Parse(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to write audio: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A line failed during batch synthesis; `characters` lists the voices
    /// configured for the cast.
    #[error("TTS generation failed: {source}\nCharacters configured: {characters}")]
    Generation {
        #[source]
        source: Box<TtsError>,
        characters: String,
    },
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Uploads and voice listings
// ---------------------------------------------------------------------------

/// Result of a voice upload that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded(String),
    /// The server already had the file and `force` was not set.
    AlreadyExists(String),
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Uploaded(name) => write!(f, "Successfully uploaded '{name}'"),
            UploadOutcome::AlreadyExists(name) => write!(
                f,
                "File '{name}' already exists on server (use --force to overwrite)"
            ),
        }
    }
}

/// Everything the server offers, plus any listing errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCatalog {
    pub predefined: Vec<String>,
    pub reference: Vec<String>,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// TtsService trait
// ---------------------------------------------------------------------------

/// A text-to-speech backend.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TtsService>`.
#[async_trait]
pub trait TtsService: Send + Sync {
    /// Synthesize `request` into `output_path`.
    async fn synthesize(&self, request: &TtsRequest, output_path: &Path)
        -> Result<AudioFile, TtsError>;

    /// Voice-clone reference files available on the server.
    async fn reference_files(&self) -> Result<Vec<String>, TtsError>;

    async fn predefined_voices(&self) -> Result<Vec<String>, TtsError>;

    async fn upload_reference(&self, path: &Path, force: bool) -> Result<UploadOutcome, TtsError>;

    async fn upload_predefined(&self, path: &Path, force: bool)
        -> Result<UploadOutcome, TtsError>;

    /// Both listings; a failing call is recorded in `errors` instead of
    /// aborting.
    async fn list_available_voices(&self) -> VoiceCatalog {
        let mut catalog = VoiceCatalog::default();
        match self.predefined_voices().await {
            Ok(v) => catalog.predefined = v,
            Err(e) => catalog.errors.push(format!("predefined voices: {e}")),
        }
        match self.reference_files().await {
            Ok(v) => catalog.reference = v,
            Err(e) => catalog.errors.push(format!("reference files: {e}")),
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HalfDown;

    #[async_trait]
    impl TtsService for HalfDown {
        async fn synthesize(&self, _r: &TtsRequest, _p: &Path) -> Result<AudioFile, TtsError> {
            Err(TtsError::Timeout)
        }
        async fn reference_files(&self) -> Result<Vec<String>, TtsError> {
            Err(TtsError::Server { status: 500, body: "boom".into() })
        }
        async fn predefined_voices(&self) -> Result<Vec<String>, TtsError> {
            Ok(vec!["Emily.wav".into()])
        }
        async fn upload_reference(&self, p: &Path, _f: bool) -> Result<UploadOutcome, TtsError> {
            Err(TtsError::FileNotFound(p.to_path_buf()))
        }
        async fn upload_predefined(&self, p: &Path, _f: bool) -> Result<UploadOutcome, TtsError> {
            Err(TtsError::FileNotFound(p.to_path_buf()))
        }
    }

    #[tokio::test]
    async fn catalog_tolerates_failed_listing() {
        let catalog = HalfDown.list_available_voices().await;
        assert_eq!(catalog.predefined, vec!["Emily.wav"]);
        assert!(catalog.reference.is_empty());
        assert_eq!(catalog.errors, vec!["reference files: TTS server error (500): boom"]);
    }

    #[test]
    fn generation_error_lists_characters() {
        let err = TtsError::Generation {
            source: Box::new(TtsError::PredefinedVoiceNotFound("X.wav".into())),
            characters: "'A' (predefined: X.wav)".into(),
        };
        assert_eq!(
            err.to_string(),
            "TTS generation failed: Predefined voice 'X.wav' not found on TTS server.\nCharacters configured: 'A' (predefined: X.wav)"
        );
    }

    #[test]
    fn upload_outcome_messages() {
        assert_eq!(UploadOutcome::Uploaded("a.wav".into()).to_string(), "Successfully uploaded 'a.wav'");
        assert!(UploadOutcome::AlreadyExists("a.wav".into()).to_string().contains("--force"));
    }

    #[test]
    fn service_is_object_safe() {
        let _: Box<dyn TtsService> = Box::new(HalfDown);
    }
}
