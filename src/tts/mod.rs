//! Speech synthesis.
//!
//! * [`TtsService`]: async trait for TTS backends.
//! * [`ChatterboxClient`]: Chatterbox REST implementation.
//! * [`TtsRequest`] / [`VoiceProfile`]: per-line request and voice presets.
//! * [`SpeechGenerator`]: synthesizes a whole script into a directory.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use memeforge::audio::Ffmpeg;
//! use memeforge::config::ProjectConfig;
//! use memeforge::script::load_auto;
//! use memeforge::tts::{ChatterboxClient, SpeechGenerator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ProjectConfig::load_from("config.json".as_ref()).unwrap();
//!     let cb = config.require_tts().unwrap().chatterbox().unwrap();
//!     let script = load_auto("dialogue.txt".as_ref(), &config.characters).unwrap();
//!
//!     let generator = SpeechGenerator::new(
//!         Arc::new(ChatterboxClient::from_config(cb)),
//!         Arc::new(Ffmpeg::default()),
//!     );
//!     let audio = generator
//!         .synthesize_entries(&script.entries, "out/tts".as_ref())
//!         .await
//!         .unwrap();
//!     println!("{} files", audio.len());
//! }
//! ```

pub mod chatterbox;
pub mod files;
pub mod profile;
pub mod request;
pub mod service;
pub mod synthesize;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use chatterbox::ChatterboxClient;
pub use files::{audio_filename, estimate_duration};
pub use profile::{VoiceProfile, PRESET_NAMES};
pub use request::{OutputFormat, TtsRequest, VoiceMode};
pub use service::{TtsError, TtsService, UploadOutcome, VoiceCatalog};
pub use synthesize::SpeechGenerator;
