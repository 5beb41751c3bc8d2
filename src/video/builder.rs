//! Turning audio metadata into timeline scenes.

use std::path::PathBuf;

use super::model::{CharacterScene, VideoClip, VideoError, VideoProject};
use crate::audio::AudioScript;
use crate::config::{Character, VideoConfig};
use crate::metadata::MetadataDocument;

/// Used when an audio file's duration is unknown.
pub const DEFAULT_SCENE_SECONDS: f64 = 3.0;

fn image_for(character: &Character) -> Option<PathBuf> {
    character.existing_image().map(|p| p.to_path_buf())
}

/// Lay the audio files end to end starting at zero.
///
/// Files missing on disk are skipped, but their time slot is kept so the
/// remaining lines stay in sync with the subtitles.
pub fn scenes_from_audio_script(script: &AudioScript) -> Vec<CharacterScene> {
    let mut scenes = Vec::new();
    let mut t = 0.0;
    for file in &script.audio_files {
        let duration = file
            .duration_seconds
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_SCENE_SECONDS);
        let start = t;
        t += duration;

        if !file.exists() {
            log::warn!("Audio file missing, skipping scene: {}", file.path.display());
            continue;
        }
        match CharacterScene::new(
            file.character.clone(),
            file.clone(),
            start,
            duration,
            image_for(&file.character),
        ) {
            Ok(scene) => scenes.push(scene),
            Err(e) => log::warn!("Skipping scene for {}: {e}", file.path.display()),
        }
    }
    scenes
}

/// Scenes at the start times recorded in the metadata document.
pub fn scenes_from_metadata(doc: &MetadataDocument) -> Vec<CharacterScene> {
    let script = doc.to_audio_script();
    let mut scenes = Vec::new();
    for (entry, file) in doc.audio_files.iter().zip(script.audio_files) {
        let m = &entry.audio_metadata;
        let duration = if m.duration_seconds > 0.0 {
            m.duration_seconds
        } else {
            DEFAULT_SCENE_SECONDS
        };
        if !file.exists() {
            log::warn!("Audio file missing, skipping scene: {}", file.path.display());
            continue;
        }
        match CharacterScene::new(
            file.character.clone(),
            file.clone(),
            m.start_time,
            duration,
            image_for(&file.character),
        ) {
            Ok(scene) => scenes.push(scene),
            Err(e) => log::warn!("Skipping scene for {}: {e}", file.path.display()),
        }
    }
    scenes
}

/// Wrap `scenes` with the background and render settings from `video`.
pub fn build_project(
    video: &VideoConfig,
    scenes: Vec<CharacterScene>,
) -> Result<VideoProject, VideoError> {
    if scenes.is_empty() {
        return Err(VideoError::NoScenes);
    }
    let background = VideoClip::new(&video.background_video, 0.0, None)?;
    Ok(VideoProject {
        background,
        scenes,
        output_format: video.render.format,
        quality: video.render.quality,
        enable_subtitles: video.render.subtitles.enabled,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
