//! Audio records and ffmpeg-backed audio operations.
//!
//! * [`AudioFile`] / [`AudioScript`] describe synthesized lines.
//! * [`Ffmpeg`] wraps the `ffmpeg`/`ffprobe` binaries.
//! * [`resolve_duration`] finds a file's length with fallbacks.
//! * [`AudioMerger`] concatenates lines into one track.

pub mod duration;
pub mod ffmpeg;
pub mod merge;
pub mod model;

pub use duration::{resolve_duration, wav_duration, DurationProbe};
pub use ffmpeg::{AudioError, Ffmpeg};
pub use merge::AudioMerger;
pub use model::{AudioFile, AudioScript};
