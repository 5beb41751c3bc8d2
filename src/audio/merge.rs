//! Concatenating per-line audio into a single track.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::duration::DurationProbe;
use super::ffmpeg::{AudioError, Ffmpeg};
use super::model::{AudioFile, AudioScript};
use crate::config::Character;
use crate::metadata;

/// Joins audio files with the ffmpeg concat demuxer, optionally separated
/// by silence that matches the first file's sample rate and channel count.
#[derive(Debug, Clone, Default)]
pub struct AudioMerger {
    ffmpeg: Ffmpeg,
}

impl AudioMerger {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }

    pub async fn merge(
        &self,
        files: &[AudioFile],
        output: &Path,
        delay_seconds: f64,
    ) -> Result<AudioFile, AudioError> {
        if files.is_empty() {
            return Err(AudioError::NoInput);
        }
        let mut sources = Vec::with_capacity(files.len());
        for f in files {
            if !f.path.exists() {
                return Err(AudioError::FileNotFound(f.path.clone()));
            }
            sources.push(absolute(&f.path)?);
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        log::info!(
            "Merging {} audio files into {} (delay {:.2}s)",
            files.len(),
            output.display(),
            delay_seconds
        );
        let started = Instant::now();

        let shared = shared_extension(&sources);
        let stream_copy = shared.is_some() && shared == extension(output);

        // Holds the concat list and silence until ffmpeg is done.
        let scratch = tempfile::tempdir()?;
        let silence = if delay_seconds > 0.0 && files.len() > 1 {
            let (rate, channels) = self.ffmpeg.stream_params(&sources[0]).await;
            let ext = shared.as_deref().unwrap_or("wav");
            let path = scratch.path().join(format!("silence.{ext}"));
            self.ffmpeg
                .create_silence(delay_seconds, &path, rate, channels)
                .await?;
            Some(path)
        } else {
            None
        };

        let list = scratch.path().join("concat.txt");
        std::fs::write(&list, concat_list(&sources, silence.as_deref()))?;
        self.ffmpeg.concat(&list, output, stream_copy).await?;

        let size = std::fs::metadata(output)?.len();
        let duration = merged_duration(files, delay_seconds);
        log::info!(
            "Merged audio: {:.2}s, {} bytes in {:.2}s",
            duration,
            size,
            started.elapsed().as_secs_f64()
        );

        Ok(AudioFile::new(
            output,
            Character::basic("Merged"),
            format!("Merged audio ({} files)", files.len()),
        )
        .with_duration(duration)
        .with_size(size))
    }

    /// Merge the audio in `dir`, reading its metadata JSON or SRT when
    /// present and scanning the directory otherwise.
    pub async fn merge_directory(
        &self,
        dir: &Path,
        output: &Path,
        delay_seconds: f64,
        probe: &dyn DurationProbe,
    ) -> Result<AudioFile, AudioError> {
        let script = load_for_merge(dir, probe).await?;
        if script.is_empty() {
            return Err(AudioError::EmptyDirectory(dir.to_path_buf()));
        }
        self.merge(&script.audio_files, output, delay_seconds).await
    }
}

async fn load_for_merge(dir: &Path, probe: &dyn DurationProbe) -> Result<AudioScript, AudioError> {
    if let Some(script) = metadata::load_with_fallback(dir) {
        return Ok(script);
    }
    Ok(metadata::load_from_directory(dir, &[], probe).await?)
}

fn absolute(path: &Path) -> Result<PathBuf, AudioError> {
    Ok(std::fs::canonicalize(path)?)
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// The extension every source shares, if any. Stream copy and a matching
/// silence segment are only possible when the inputs agree.
pub(crate) fn shared_extension(sources: &[PathBuf]) -> Option<String> {
    let first = extension(sources.first()?)?;
    sources[1..]
        .iter()
        .all(|p| extension(p).as_deref() == Some(first.as_str()))
        .then_some(first)
}

/// Concat-demuxer list with `silence` between consecutive entries.
pub(crate) fn concat_list(sources: &[PathBuf], silence: Option<&Path>) -> String {
    let line = |p: &Path| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''"));
    let mut out = String::new();
    for (i, src) in sources.iter().enumerate() {
        if i > 0 {
            if let Some(s) = silence {
                out.push_str(&line(s));
            }
        }
        out.push_str(&line(src));
    }
    out
}

/// Sum of known durations plus one delay per gap.
pub(crate) fn merged_duration(files: &[AudioFile], delay_seconds: f64) -> f64 {
    let total: f64 = files.iter().map(|f| f.duration_seconds.unwrap_or(0.0)).sum();
    let gaps = files.len().saturating_sub(1) as f64;
    total + delay_seconds.max(0.0) * gaps
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn concat_list_interleaves_silence() {
        let sources = vec![PathBuf::from("/a/1.wav"), PathBuf::from("/a/2.wav"), PathBuf::from("/a/3.wav")];
        let list = concat_list(&sources, Some(Path::new("/tmp/s.wav")));
        assert_eq!(
            list,
            "file '/a/1.wav'\nfile '/tmp/s.wav'\nfile '/a/2.wav'\nfile '/tmp/s.wav'\nfile '/a/3.wav'\n"
        );
        assert_eq!(concat_list(&sources[..1], None), "file '/a/1.wav'\n");
    }

    #[test]
    fn concat_list_escapes_quotes() {
        let list = concat_list(&[PathBuf::from("/x/bob's.wav")], None);
        assert_eq!(list, "file '/x/bob'\\''s.wav'\n");
    }

    #[test]
    fn shared_extension_requires_agreement() {
        let mp3 = vec![PathBuf::from("/a/0.mp3"), PathBuf::from("/a/1.MP3")];
        assert_eq!(shared_extension(&mp3).as_deref(), Some("mp3"));

        let mixed = vec![PathBuf::from("/a/0.mp3"), PathBuf::from("/a/1.wav")];
        assert_eq!(shared_extension(&mixed), None);
        assert_eq!(shared_extension(&[PathBuf::from("/a/noext")]), None);
        assert_eq!(shared_extension(&[]), None);
    }

    #[test]
    fn merged_duration_adds_gaps() {
        let files = vec![
            AudioFile::new("a", Character::basic("A"), "").with_duration(1.0),
            AudioFile::new("b", Character::basic("B"), ""),
            AudioFile::new("c", Character::basic("A"), "").with_duration(2.5),
        ];
        assert_eq!(merged_duration(&files, 0.5), 4.5);
        assert_eq!(merged_duration(&files, 0.0), 3.5);
        assert_eq!(merged_duration(&[], 1.0), 0.0);
    }

    #[tokio::test]
    async fn merge_rejects_empty_and_missing_input() {
        let dir = tempdir().expect("temp dir");
        let merger = AudioMerger::new(Ffmpeg::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe"));
        let out = dir.path().join("out.wav");

        let err = merger.merge(&[], &out, 0.0).await.unwrap_err();
        assert_eq!(err.to_string(), "No audio files provided for merging");

        let missing = AudioFile::new(dir.path().join("nope.wav"), Character::basic("A"), "");
        let err = merger.merge(&[missing], &out, 0.0).await.unwrap_err();
        assert!(matches!(err, AudioError::FileNotFound(_)));
    }
}
