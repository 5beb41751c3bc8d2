//! Thin async wrapper around the `ffmpeg` and `ffprobe` binaries.
//!
//! Every operation shells out; nothing here decodes audio itself.  Binary
//! paths come from [`ToolsConfig`] so a non-`PATH` install can be used.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;

use super::duration::DurationProbe;
use crate::config::ToolsConfig;
use crate::metadata::MetadataError;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("FFmpeg not found. Please install ffmpeg.")]
    FfmpegNotFound,

    #[error("FFprobe not found. Please install ffprobe.")]
    FfprobeNotFound,

    /// The tool ran but exited non-zero.
    #[error("command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    /// ffprobe output could not be interpreted.
    #[error("could not probe {}: {message}", .path.display())]
    Probe { path: PathBuf, message: String },

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("No audio files provided for merging")]
    NoInput,

    #[error("Audio file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No audio files found in {}", .0.display())]
    EmptyDirectory(PathBuf),

    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

// ---------------------------------------------------------------------------
// Ffmpeg
// ---------------------------------------------------------------------------

/// Handle to the ffmpeg/ffprobe pair.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::from_settings(&ToolsConfig::default())
    }
}

impl Ffmpeg {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn from_settings(tools: &ToolsConfig) -> Self {
        Self::new(&tools.ffmpeg_path, &tools.ffprobe_path)
    }

    /// Run `ffmpeg` with `args` and wait for it to finish.
    pub async fn run_ffmpeg(&self, args: &[String]) -> Result<(), AudioError> {
        run(&self.ffmpeg_path, args, AudioError::FfmpegNotFound).await?;
        Ok(())
    }

    /// Run `ffprobe` with `args` and return its stdout.
    pub async fn run_ffprobe(&self, args: &[String]) -> Result<String, AudioError> {
        run(&self.ffprobe_path, args, AudioError::FfprobeNotFound).await
    }

    /// Container duration in seconds.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64, AudioError> {
        let args = strings(&["-v", "quiet", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .into_iter()
            .chain([path.to_string_lossy().to_string()])
            .collect::<Vec<_>>();
        let stdout = self.run_ffprobe(&args).await?;
        stdout.trim().parse::<f64>().map_err(|e| AudioError::Probe {
            path: path.to_path_buf(),
            message: format!("'{}': {e}", stdout.trim()),
        })
    }

    /// Full `ffprobe -show_format -show_streams` output as JSON.
    pub async fn audio_info(&self, path: &Path) -> Result<Value, AudioError> {
        let args = strings(&["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .into_iter()
            .chain([path.to_string_lossy().to_string()])
            .collect::<Vec<_>>();
        let stdout = self.run_ffprobe(&args).await?;
        serde_json::from_str(&stdout).map_err(|e| AudioError::Probe {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Sample rate and channel count of the first audio stream, falling
    /// back to 44.1 kHz stereo.
    pub async fn stream_params(&self, path: &Path) -> (u32, u32) {
        match self.audio_info(path).await {
            Ok(info) => stream_params_from_info(&info),
            Err(e) => {
                log::debug!("could not read stream params of {}: {e}", path.display());
                (DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS)
            }
        }
    }

    /// Write `seconds` of 16-bit PCM silence to `output`.
    pub async fn create_silence(
        &self,
        seconds: f64,
        output: &Path,
        sample_rate: u32,
        channels: u32,
    ) -> Result<(), AudioError> {
        self.run_ffmpeg(&silence_args(seconds, output, sample_rate, channels))
            .await
    }

    /// Re-encode `input` as `format` (`mp3`, `opus` or `wav`).
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: &str,
        quality: &str,
    ) -> Result<(), AudioError> {
        let args = convert_args(input, output, format, quality)?;
        self.run_ffmpeg(&args).await
    }

    /// Join the entries of a concat list into `output`, stream-copying when
    /// `stream_copy` is set and re-encoding for the output's extension
    /// otherwise.
    pub async fn concat(
        &self,
        list: &Path,
        output: &Path,
        stream_copy: bool,
    ) -> Result<(), AudioError> {
        self.run_ffmpeg(&concat_args(list, output, stream_copy)).await
    }
}

#[async_trait]
impl DurationProbe for Ffmpeg {
    async fn probe_duration(&self, path: &Path) -> Result<f64, AudioError> {
        Ffmpeg::probe_duration(self, path).await
    }
}

// ---------------------------------------------------------------------------
// Argument builders
// ---------------------------------------------------------------------------

const DEFAULT_SAMPLE_RATE: u32 = 44_100;
const DEFAULT_CHANNELS: u32 = 2;

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn stream_params_from_info(info: &Value) -> (u32, u32) {
    let stream = info["streams"].as_array().and_then(|streams| {
        streams
            .iter()
            .find(|s| s["codec_type"] == "audio")
            .or_else(|| streams.first())
    });

    let Some(stream) = stream else {
        return (DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS);
    };

    // ffprobe reports sample_rate as a string.
    let sample_rate = stream["sample_rate"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| stream["sample_rate"].as_u64().map(|v| v as u32))
        .unwrap_or(DEFAULT_SAMPLE_RATE);
    let channels = stream["channels"]
        .as_u64()
        .map(|v| v as u32)
        .unwrap_or(DEFAULT_CHANNELS);
    (sample_rate, channels)
}

fn channel_layout(channels: u32) -> String {
    match channels {
        1 => "mono".into(),
        2 => "stereo".into(),
        n => format!("{n}c"),
    }
}

pub(crate) fn silence_args(seconds: f64, output: &Path, sample_rate: u32, channels: u32) -> Vec<String> {
    let mut args = strings(&["-f", "lavfi", "-i"]);
    args.push(format!("anullsrc=r={sample_rate}:cl={}", channel_layout(channels)));
    args.push("-t".into());
    args.push(seconds.to_string());
    args.extend(strings(&["-c:a", codec_for(output), "-y"]));
    args.push(output.to_string_lossy().to_string());
    args
}

/// Audio encoder for a file extension; anything unknown is PCM WAV.
pub(crate) fn codec_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "libmp3lame",
        "opus" => "libopus",
        _ => "pcm_s16le",
    }
}

pub(crate) fn concat_args(list: &Path, output: &Path, stream_copy: bool) -> Vec<String> {
    let mut args = strings(&["-f", "concat", "-safe", "0", "-i"]);
    args.push(list.to_string_lossy().to_string());
    if stream_copy {
        args.extend(strings(&["-c", "copy"]));
    } else {
        args.extend(strings(&["-c:a", codec_for(output)]));
    }
    args.push("-y".into());
    args.push(output.to_string_lossy().to_string());
    args
}

pub(crate) fn convert_args(
    input: &Path,
    output: &Path,
    format: &str,
    quality: &str,
) -> Result<Vec<String>, AudioError> {
    let mut args = vec!["-i".to_string(), input.to_string_lossy().to_string()];
    match format.to_lowercase().as_str() {
        "mp3" => {
            let bitrate = match quality {
                "low" => "96k",
                "high" => "192k",
                _ => "128k",
            };
            args.extend(strings(&["-codec:a", "libmp3lame", "-b:a", bitrate]));
        }
        "opus" => {
            let bitrate = match quality {
                "low" => "64k",
                "high" => "128k",
                _ => "96k",
            };
            args.extend(strings(&["-codec:a", "libopus", "-b:a", bitrate]));
        }
        "wav" => args.extend(strings(&["-codec:a", "pcm_s16le"])),
        other => return Err(AudioError::UnsupportedFormat(other.to_string())),
    }
    args.push("-y".into());
    args.push(output.to_string_lossy().to_string());
    Ok(args)
}

async fn run(program: &str, args: &[String], not_found: AudioError) -> Result<String, AudioError> {
    log::debug!("exec: {program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found
            } else {
                AudioError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(AudioError::CommandFailed {
            command: format!("{program} {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn silence_matches_source_layout() {
        let args = silence_args(0.5, Path::new("/tmp/s.wav"), 24_000, 1);
        assert_eq!(
            args.join(" "),
            "-f lavfi -i anullsrc=r=24000:cl=mono -t 0.5 -c:a pcm_s16le -y /tmp/s.wav"
        );
    }

    #[test]
    fn silence_uses_the_source_codec() {
        let args = silence_args(0.25, Path::new("/tmp/s.mp3"), 44_100, 2);
        assert!(args.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
        let args = silence_args(0.25, Path::new("/tmp/s.OPUS"), 48_000, 1);
        assert!(args.windows(2).any(|w| w == ["-c:a", "libopus"]));
    }

    #[test]
    fn concat_copies_or_reencodes() {
        let copy = concat_args(Path::new("/t/list.txt"), Path::new("/o/m.wav"), true);
        assert_eq!(
            copy.join(" "),
            "-f concat -safe 0 -i /t/list.txt -c copy -y /o/m.wav"
        );

        let encode = concat_args(Path::new("/t/list.txt"), Path::new("/o/m.wav"), false);
        assert!(encode.windows(2).any(|w| w == ["-c:a", "pcm_s16le"]));
        assert!(!encode.contains(&"copy".to_string()));
    }

    #[test]
    fn convert_picks_bitrate_by_quality() {
        let args = convert_args(Path::new("in.wav"), Path::new("out.mp3"), "mp3", "high").unwrap();
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
        assert!(args.windows(2).any(|w| w == ["-codec:a", "libmp3lame"]));

        let args = convert_args(Path::new("in.wav"), Path::new("out.opus"), "opus", "low").unwrap();
        assert!(args.windows(2).any(|w| w == ["-b:a", "64k"]));

        let args = convert_args(Path::new("in.mp3"), Path::new("out.wav"), "WAV", "medium").unwrap();
        assert!(args.contains(&"pcm_s16le".to_string()));
    }

    #[test]
    fn convert_rejects_unknown_format() {
        let err = convert_args(Path::new("a"), Path::new("b"), "flac", "medium").unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(f) if f == "flac"));
    }

    #[test]
    fn stream_params_read_first_audio_stream() {
        let info = json!({"streams": [
            {"codec_type": "video"},
            {"codec_type": "audio", "sample_rate": "22050", "channels": 1}
        ]});
        assert_eq!(stream_params_from_info(&info), (22_050, 1));
        assert_eq!(stream_params_from_info(&json!({})), (44_100, 2));
    }

    #[tokio::test]
    async fn missing_binary_reports_not_found() {
        let ff = Ffmpeg::new("/nonexistent/ffmpeg-bin", "/nonexistent/ffprobe-bin");
        let err = ff.run_ffmpeg(&["-version".into()]).await.unwrap_err();
        assert_eq!(err.to_string(), "FFmpeg not found. Please install ffmpeg.");

        let err = ff.probe_duration(Path::new("x.wav")).await.unwrap_err();
        assert!(matches!(err, AudioError::FfprobeNotFound));
    }
}
