//! Video composition.
//!
//! * [`VideoProject`] / [`CharacterScene`] describe what to render.
//! * [`scenes_from_audio_script`] / [`scenes_from_metadata`] lay audio on a
//!   timeline; [`build_project`] attaches the background.
//! * [`VideoService`] renders a project; [`FfmpegCompositor`] does it with
//!   a single ffmpeg filter graph built by [`filter`].

pub mod builder;
pub mod compositor;
pub mod filter;
pub mod model;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use builder::{build_project, scenes_from_audio_script, scenes_from_metadata, DEFAULT_SCENE_SECONDS};
pub use compositor::{FfmpegCompositor, VideoService};
pub use filter::MediaInfo;
pub use model::{
    CharacterScene, VideoClip, VideoError, VideoFile, VideoFormat, VideoProject, VideoQuality,
};
