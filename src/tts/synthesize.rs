//! Batch synthesis of a script into numbered audio files.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::files::audio_filename;
use super::request::{OutputFormat, TtsRequest};
use super::service::{TtsError, TtsService};
use crate::audio::{resolve_duration, AudioScript, DurationProbe};
use crate::config::CharacterMap;
use crate::metadata::{write_metadata, write_srt, METADATA_FILE, SUBTITLES_FILE};
use crate::script::ScriptEntry;

/// Synthesizes script entries in order and records their metadata.
pub struct SpeechGenerator {
    tts: Arc<dyn TtsService>,
    probe: Arc<dyn DurationProbe>,
    format: OutputFormat,
}

impl SpeechGenerator {
    pub fn new(tts: Arc<dyn TtsService>, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            tts,
            probe,
            format: OutputFormat::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Synthesize every entry into `dir`, then write
    /// `audio_script_metadata.json` and `subtitles.srt` alongside.
    pub async fn synthesize_entries(
        &self,
        entries: &[ScriptEntry],
        dir: &Path,
    ) -> Result<AudioScript, TtsError> {
        std::fs::create_dir_all(dir)?;
        log::info!("Synthesizing {} lines into {}", entries.len(), dir.display());
        let started = Instant::now();

        let mut script = AudioScript::new();
        for (i, entry) in entries.iter().enumerate() {
            let path = dir.join(audio_filename(i, &entry.character.name, self.format));
            let request = TtsRequest::for_entry(entry, self.format);

            let mut file = self
                .tts
                .synthesize(&request, &path)
                .await
                .map_err(|e| with_cast(e, entries))?;

            if path.exists() {
                file.duration_seconds = Some(resolve_duration(self.probe.as_ref(), &path).await);
            }
            log::debug!(
                "[{}/{}] {} ({:.2}s)",
                i + 1,
                entries.len(),
                file.filename(),
                file.duration_seconds.unwrap_or(0.0)
            );
            script.add(file);
        }

        write_metadata(&script, &dir.join(METADATA_FILE))?;
        write_srt(&script, &dir.join(SUBTITLES_FILE))?;

        log::info!(
            "Synthesized {} files ({:.2}s of audio) in {:.2}s",
            script.len(),
            script.total_duration_seconds,
            started.elapsed().as_secs_f64()
        );
        Ok(script)
    }
}

fn with_cast(e: TtsError, entries: &[ScriptEntry]) -> TtsError {
    let mut seen = CharacterMap::default();
    let mut summaries = Vec::new();
    for entry in entries {
        if seen.get(&entry.character.name).is_none() {
            seen.insert(entry.character.clone());
            summaries.push(entry.character.voice_summary());
        }
    }
    TtsError::Generation {
        source: Box::new(e),
        characters: summaries.join(", "),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
