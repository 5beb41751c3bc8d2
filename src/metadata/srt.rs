//! SubRip (`.srt`) writing and parsing.

use std::path::Path;

use super::MetadataError;
use crate::audio::AudioScript;

/// One subtitle block.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub index: u32,
    /// Seconds from the start of the track.
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleCue {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// `HH:MM:SS,mmm`, milliseconds truncated.
pub fn format_timestamp(seconds: f64) -> String {
    // The epsilon keeps 1.001 from printing as 1,000 due to float error.
    let ms = (seconds.max(0.0) * 1000.0 + 1e-6).floor() as u64;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Build SRT text from back-to-back audio files.
///
/// Lines with empty dialogue get no block but still advance the clock.
pub fn generate_srt(script: &AudioScript) -> String {
    let mut blocks = Vec::new();
    let mut t = 0.0;
    for file in &script.audio_files {
        let start = t;
        t += file.duration_seconds.unwrap_or(0.0);
        let text = file.dialogue.trim();
        if text.is_empty() {
            continue;
        }
        blocks.push(format!(
            "{}\n{} --> {}\n{}\n",
            blocks.len() + 1,
            format_timestamp(start),
            format_timestamp(t),
            text
        ));
    }
    blocks.join("\n")
}

pub fn write_srt(script: &AudioScript, path: &Path) -> Result<(), MetadataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_srt(script))?;
    log::debug!("wrote subtitles to {}", path.display());
    Ok(())
}

/// Parse SRT text.  CRLF line endings and multi-line cue text are accepted.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, MetadataError> {
    let mut cues = Vec::new();
    let mut lines = content.lines().map(|l| l.trim_end_matches('\r')).peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(seq_line) = lines.next() else { break };
        let Ok(index) = seq_line.trim().trim_start_matches('\u{feff}').parse::<u32>() else {
            continue;
        };

        let Some(time_line) = lines.next() else { break };
        let (start, end) = parse_timestamp_line(time_line)?;

        let mut text_lines = Vec::new();
        while let Some(l) = lines.peek() {
            if l.trim().is_empty() {
                break;
            }
            text_lines.push(l.trim().to_string());
            lines.next();
        }

        cues.push(SubtitleCue {
            index,
            start,
            end,
            text: text_lines.join("\n"),
        });
    }

    Ok(cues)
}

pub fn read_srt(path: &Path) -> Result<Vec<SubtitleCue>, MetadataError> {
    if !path.exists() {
        return Err(MetadataError::NotFound(path.to_path_buf()));
    }
    parse_srt(&std::fs::read_to_string(path)?)
}

fn parse_timestamp_line(line: &str) -> Result<(f64, f64), MetadataError> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| MetadataError::Invalid(format!("Invalid timestamp line: {line}")))?;
    Ok((parse_timestamp(start.trim())?, parse_timestamp(end.trim())?))
}

/// `HH:MM:SS,mmm` (or `.mmm`) to seconds.
pub fn parse_timestamp(ts: &str) -> Result<f64, MetadataError> {
    let invalid = || MetadataError::Invalid(format!("Invalid timestamp: {ts}"));
    let parts: Vec<&str> = ts.split(&[',', '.', ':'][..]).collect();
    if parts.len() != 4 {
        return Err(invalid());
    }
    let mut nums = [0u64; 4];
    for (n, p) in nums.iter_mut().zip(&parts) {
        *n = p.trim().parse().map_err(|_| invalid())?;
    }
    let [h, m, s, ms] = nums;
    Ok((h * 3600 + m * 60 + s) as f64 + ms as f64 / 1000.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
