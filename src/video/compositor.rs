//! `VideoService` trait and the ffmpeg-backed compositor.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use super::filter::{self, MediaInfo};
use super::model::{VideoError, VideoFile, VideoProject};
use crate::audio::Ffmpeg;
use crate::config::RenderConfig;

/// Fallback canvas when the background cannot be probed (vertical 1080p).
const FALLBACK_SIZE: (u32, u32) = (1080, 1920);

// ---------------------------------------------------------------------------
// VideoService trait
// ---------------------------------------------------------------------------

/// Renders a [`VideoProject`] to a file.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn VideoService>`.
#[async_trait]
pub trait VideoService: Send + Sync {
    async fn create_video(
        &self,
        project: &VideoProject,
        output: &Path,
        render: &RenderConfig,
    ) -> Result<VideoFile, VideoError>;

    /// Render only the first `seconds` at low quality.
    async fn preview_video(
        &self,
        project: &VideoProject,
        output: &Path,
        render: &RenderConfig,
        seconds: f64,
    ) -> Result<VideoFile, VideoError> {
        let preview = project.preview(seconds);
        if preview.scenes.is_empty() {
            return Err(VideoError::NoScenes);
        }
        log::info!("Rendering {seconds:.1}s preview to {}", output.display());
        self.create_video(&preview, output, render).await
    }
}

// ---------------------------------------------------------------------------
// FfmpegCompositor
// ---------------------------------------------------------------------------

/// Builds one ffmpeg invocation per video: looped background, character
/// overlays, burned-in subtitles and the delayed dialogue mix.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCompositor {
    ffmpeg: Ffmpeg,
}

impl FfmpegCompositor {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }

    async fn probe_media(&self, project: &VideoProject) -> MediaInfo {
        let bg = &project.background.path;
        let (background_width, background_height, background_duration) =
            match self.ffmpeg.audio_info(bg).await {
                Ok(info) => background_from_info(&info),
                Err(e) => {
                    log::warn!("could not probe background {}: {e}", bg.display());
                    (FALLBACK_SIZE.0, FALLBACK_SIZE.1, 0.0)
                }
            };

        let mut audio_durations = Vec::with_capacity(project.scenes.len());
        for scene in &project.scenes {
            let probed = match self.ffmpeg.probe_duration(&scene.audio_file.path).await {
                Ok(d) => Some(d),
                Err(e) => {
                    log::debug!("probe failed for {}: {e}", scene.audio_file.path.display());
                    None
                }
            };
            audio_durations.push(probed);
        }

        MediaInfo {
            background_width,
            background_height,
            background_duration,
            audio_durations,
        }
    }

    async fn render(
        &self,
        project: &VideoProject,
        output: &Path,
        render: &RenderConfig,
        started: Instant,
    ) -> Result<VideoFile, VideoError> {
        if project.scenes.is_empty() {
            return Err(VideoError::NoScenes);
        }
        if !project.background.path.exists() {
            return Err(VideoError::InvalidClip(format!(
                "Video file not found: {}",
                project.background.path.display()
            )));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let media = self.probe_media(project).await;
        let total = project.total_duration();
        let loops = filter::loop_count(total, media.background_duration);
        if loops > 1 {
            log::info!(
                "Background is {:.2}s, looping {loops}x to cover {total:.2}s",
                media.background_duration
            );
        }

        let args = filter::build_args(project, render, &media, output);
        log::debug!("ffmpeg {}", args.join(" "));
        self.ffmpeg.run_ffmpeg(&args).await?;

        VideoFile::new(output, started.elapsed().as_secs_f64())
    }
}

/// `(width, height, duration)` of the first video stream.
pub(crate) fn background_from_info(info: &Value) -> (u32, u32, f64) {
    let stream = info["streams"]
        .as_array()
        .and_then(|s| s.iter().find(|s| s["codec_type"] == "video"));
    let dim = |key: &str, fallback: u32| {
        stream
            .and_then(|s| s[key].as_u64())
            .map(|v| v as u32)
            .filter(|v| *v > 0)
            .unwrap_or(fallback)
    };
    // ffprobe reports durations as strings.
    let duration = info["format"]["duration"]
        .as_str()
        .or_else(|| stream.and_then(|s| s["duration"].as_str()))
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);
    (dim("width", FALLBACK_SIZE.0), dim("height", FALLBACK_SIZE.1), duration)
}

#[async_trait]
impl VideoService for FfmpegCompositor {
    async fn create_video(
        &self,
        project: &VideoProject,
        output: &Path,
        render: &RenderConfig,
    ) -> Result<VideoFile, VideoError> {
        log::info!(
            "Rendering {} scenes ({:.2}s) to {}",
            project.scenes.len(),
            project.total_duration(),
            output.display()
        );
        let started = Instant::now();
        match self.render(project, output, render, started).await {
            Ok(video) => {
                log::info!(
                    "Video created: {} ({:.2} MB) in {:.2}s",
                    video.path.display(),
                    video.size_mb(),
                    video.render_time_seconds
                );
                Ok(video)
            }
            Err(e) => Err(VideoError::Failed {
                elapsed: started.elapsed().as_secs_f64(),
                source: Box::new(e),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFile;
    use crate::config::Character;
    use crate::video::{CharacterScene, VideoClip, VideoFormat, VideoQuality};
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test]
    fn background_info_reads_video_stream() {
        let info = json!({
            "streams": [
                { "codec_type": "audio", "sample_rate": "44100" },
                { "codec_type": "video", "width": 1280, "height": 720 }
            ],
            "format": { "duration": "12.5" }
        });
        assert_eq!(background_from_info(&info), (1280, 720, 12.5));
        assert_eq!(background_from_info(&json!({})), (1080, 1920, 0.0));
    }

    struct Recorder {
        seen: Mutex<Vec<(usize, VideoQuality)>>,
    }

    #[async_trait]
    impl VideoService for Recorder {
        async fn create_video(
            &self,
            project: &VideoProject,
            output: &Path,
            _render: &RenderConfig,
        ) -> Result<VideoFile, VideoError> {
            self.seen
                .lock()
                .unwrap()
                .push((project.scenes.len(), project.quality));
            std::fs::write(output, b"video")?;
            VideoFile::new(output, 0.0)
        }
    }

    fn project(dir: &Path) -> VideoProject {
        let bg = dir.join("bg.mp4");
        std::fs::write(&bg, b"v").unwrap();
        let c = Character::basic("A");
        let scenes = [0.0, 5.0, 10.0]
            .iter()
            .map(|&t| {
                let audio = AudioFile::new(format!("{t}.wav"), c.clone(), "line");
                CharacterScene::new(c.clone(), audio, t, 5.0, None).unwrap()
            })
            .collect();
        VideoProject {
            background: VideoClip::new(bg, 0.0, None).unwrap(),
            scenes,
            output_format: VideoFormat::Mp4,
            quality: VideoQuality::Ultra,
            enable_subtitles: true,
        }
    }

    #[tokio::test]
    async fn preview_renders_trimmed_low_quality_project() {
        let dir = tempdir().expect("temp dir");
        let recorder = Recorder { seen: Mutex::new(Vec::new()) };
        let out = dir.path().join("preview.mp4");

        let video = recorder
            .preview_video(&project(dir.path()), &out, &RenderConfig::default(), 7.0)
            .await
            .unwrap();
        assert_eq!(video.file_size_bytes, 5);
        assert_eq!(*recorder.seen.lock().unwrap(), vec![(2, VideoQuality::Low)]);
    }

    #[tokio::test]
    async fn preview_of_nothing_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let recorder = Recorder { seen: Mutex::new(Vec::new()) };
        let mut p = project(dir.path());
        p.scenes.clear();
        let err = recorder
            .preview_video(&p, &dir.path().join("p.mp4"), &RenderConfig::default(), 5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::NoScenes));
    }

    #[tokio::test]
    async fn compositor_wraps_errors_with_elapsed_time() {
        let dir = tempdir().expect("temp dir");
        let p = project(dir.path());
        std::fs::remove_file(&p.background.path).unwrap();

        let compositor = FfmpegCompositor::new(Ffmpeg::new("ffmpeg-missing", "ffprobe-missing"));
        let err = compositor
            .create_video(&p, &dir.path().join("out.mp4"), &RenderConfig::default())
            .await
            .unwrap_err();
        let VideoError::Failed { source, .. } = &err else {
            panic!("expected Failed, got {err:?}");
        };
        assert!(matches!(**source, VideoError::InvalidClip(_)));
        assert!(err.to_string().starts_with("Video creation failed after "));
    }
}
