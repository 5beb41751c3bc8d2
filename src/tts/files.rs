//! Output naming and streaming of synthesized audio to disk.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use super::request::OutputFormat;
use super::service::TtsError;

/// `{index:03}_{name}.{ext}`, with the name lowercased and spaces replaced
/// by underscores.
pub fn audio_filename(index: usize, character_name: &str, format: OutputFormat) -> String {
    format!(
        "{index:03}_{}.{}",
        character_name.to_lowercase().replace(' ', "_"),
        format.extension()
    )
}

/// Rough speaking time at 150 words per minute.
pub fn estimate_duration(text: &str) -> f64 {
    text.split_whitespace().count() as f64 / 150.0 * 60.0
}

/// Write the response body to `path` chunk by chunk; returns the size on
/// disk.
pub async fn save_response(mut response: reqwest::Response, path: &Path) -> Result<u64, TtsError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    let size = tokio::fs::metadata(path).await?.len();
    log::debug!("saved {} bytes to {}", size, path.display());
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_zero_padded_and_normalised() {
        assert_eq!(audio_filename(0, "Alice", OutputFormat::Wav), "000_alice.wav");
        assert_eq!(audio_filename(12, "Mr Smith", OutputFormat::Opus), "012_mr_smith.opus");
    }

    #[test]
    fn estimate_uses_150_wpm() {
        assert_eq!(estimate_duration(""), 0.0);
        assert!((estimate_duration("one two three four five") - 2.0).abs() < 1e-9);
    }
}
