//! Best-effort audio duration lookup.

use std::path::Path;

use async_trait::async_trait;

use super::ffmpeg::AudioError;

/// Something that can report the playing time of an audio file.
///
/// [`Ffmpeg`](super::Ffmpeg) is the production implementation; tests
/// substitute fixed answers.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe_duration(&self, path: &Path) -> Result<f64, AudioError>;
}

/// Bytes per second of 44.1 kHz 16-bit stereo PCM.
const PCM_BYTES_PER_SECOND: f64 = 44_100.0 * 2.0 * 2.0;
const MIN_ESTIMATE_SECS: f64 = 0.1;

/// Duration of `path`, trying in turn:
///
/// 1. the probe;
/// 2. the WAV header, for `.wav` files;
/// 3. the file size as 44.1 kHz 16-bit stereo, at least 0.1 s.
pub async fn resolve_duration(probe: &dyn DurationProbe, path: &Path) -> f64 {
    match probe.probe_duration(path).await {
        Ok(d) if d > 0.0 => return d,
        Ok(d) => log::debug!("probe reported {d}s for {}", path.display()),
        Err(e) => log::debug!("probe failed for {}: {e}", path.display()),
    }

    if is_wav(path) {
        match wav_duration(path) {
            Ok(d) if d > 0.0 => return d,
            Ok(_) => {}
            Err(e) => log::debug!("wav header unreadable for {}: {e}", path.display()),
        }
    }

    let estimate = size_estimate(path);
    log::warn!(
        "Could not determine duration of {}, estimating {:.2}s from file size",
        path.display(),
        estimate
    );
    estimate
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Frames divided by sample rate, from the RIFF header.
pub fn wav_duration(path: &Path) -> Result<f64, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return Ok(0.0);
    }
    Ok(reader.duration() as f64 / rate as f64)
}

fn size_estimate(path: &Path) -> f64 {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    (size as f64 / PCM_BYTES_PER_SECOND).max(MIN_ESTIMATE_SECS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Fixed(f64);

    #[async_trait]
    impl DurationProbe for Fixed {
        async fn probe_duration(&self, _path: &Path) -> Result<f64, AudioError> {
            Ok(self.0)
        }
    }

    struct Broken;

    #[async_trait]
    impl DurationProbe for Broken {
        async fn probe_duration(&self, _path: &Path) -> Result<f64, AudioError> {
            Err(AudioError::FfprobeNotFound)
        }
    }

    fn write_wav(path: &Path, rate: u32, frames: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            w.write_sample(0i16).unwrap();
        }
        w.finalize().unwrap();
    }

    #[tokio::test]
    async fn probe_result_wins() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("a.wav");
        write_wav(&path, 8_000, 8_000);
        assert_eq!(resolve_duration(&Fixed(2.25), &path).await, 2.25);
    }

    #[tokio::test]
    async fn falls_back_to_wav_header() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("a.WAV");
        write_wav(&path, 16_000, 24_000);
        let d = resolve_duration(&Broken, &path).await;
        assert!((d - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn falls_back_to_size_estimate() {
        let dir = tempdir().expect("temp dir");
        let big = dir.path().join("a.mp3");
        std::fs::write(&big, vec![0u8; 352_800]).unwrap();
        assert!((resolve_duration(&Broken, &big).await - 2.0).abs() < 1e-9);

        let tiny = dir.path().join("b.mp3");
        std::fs::write(&tiny, b"x").unwrap();
        assert_eq!(resolve_duration(&Fixed(0.0), &tiny).await, 0.1);
    }
}
