//! Human-readable and JSON run summaries.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audio::{AudioFile, AudioScript};
use crate::metadata::METADATA_FILE;
use crate::script::{ScriptEntry, SCRIPT_ENTRIES_FILE};
use crate::video::VideoFile;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Script, speech, merge and video.
    Complete,
    /// Script and speech only.
    ScriptAndTts,
}

impl SummaryKind {
    fn header(&self) -> &'static str {
        match self {
            SummaryKind::Complete => "# Complete Meme Creation Summary",
            SummaryKind::ScriptAndTts => "# Script and TTS Generation Summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedSummary {
    pub file: String,
    pub duration_seconds: f64,
    pub size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub file: String,
    pub size_mb: f64,
    pub render_time_seconds: f64,
}

/// Facts about one run, written as `*_summary.txt` and `*_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub kind: SummaryKind,
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub script_entries: usize,
    pub audio_files: Vec<String>,
    pub total_duration_seconds: f64,
    pub characters: Vec<String>,
    pub merged_audio: Option<MergedSummary>,
    pub video: Option<VideoSummary>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl RunSummary {
    pub fn new(
        kind: SummaryKind,
        project_name: &str,
        entries: &[ScriptEntry],
        audio: &AudioScript,
        merged: Option<&AudioFile>,
        video: Option<&VideoFile>,
    ) -> Self {
        Self {
            kind,
            project_name: project_name.to_string(),
            generated_at: Utc::now(),
            script_entries: entries.len(),
            audio_files: audio.audio_files.iter().map(AudioFile::filename).collect(),
            total_duration_seconds: audio.total_duration_seconds,
            characters: audio.characters(),
            merged_audio: merged.map(|m| MergedSummary {
                file: m.filename(),
                duration_seconds: m.duration_seconds.unwrap_or(0.0),
                size_mb: m.file_size_bytes.unwrap_or(0) as f64 / BYTES_PER_MB,
            }),
            video: video.map(|v| VideoSummary {
                file: file_name(&v.path),
                size_mb: v.size_mb(),
                render_time_seconds: v.render_time_seconds,
            }),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = format!(
            "{}\n\n\
             Generated: {} script entries\n\
             Audio Files: {}\n\
             Total Duration: {:.2} seconds\n\
             Characters: {}\n\n",
            self.kind.header(),
            self.script_entries,
            self.audio_files.len(),
            self.total_duration_seconds,
            self.characters.join(", "),
        );

        if self.kind == SummaryKind::Complete {
            out.push_str(&format!("## Script Files\n- {SCRIPT_ENTRIES_FILE}\n\n"));
        }

        out.push_str("## TTS Files\n");
        for f in &self.audio_files {
            out.push_str(&format!("- {f}\n"));
        }

        if let Some(m) = &self.merged_audio {
            out.push_str(&format!(
                "\n## Merged Audio\n- {}\n- Total Duration: {:.2} seconds\n- File Size: {:.2} MB\n",
                m.file, m.duration_seconds, m.size_mb
            ));
        }

        if let Some(v) = &self.video {
            out.push_str(&format!(
                "\n## Video (with Subtitles)\n- {}\n- File Size: {:.2} MB\n- Render Time: {:.2} seconds\n",
                v.file, v.size_mb, v.render_time_seconds
            ));
        }

        if self.kind == SummaryKind::Complete {
            out.push_str(&format!(
                "\n## TTS Metadata\n- {METADATA_FILE} (timing + metadata for subtitles)\n"
            ));
        }
        out
    }

    pub fn write_text(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Character;
    use tempfile::tempdir;

    fn audio() -> AudioScript {
        AudioScript::from_files(vec![
            AudioFile::new("/t/000_alice.wav", Character::basic("Alice"), "hi").with_duration(1.25),
            AudioFile::new("/t/001_bob.wav", Character::basic("Bob"), "yo").with_duration(2.0),
        ])
    }

    fn entries() -> Vec<ScriptEntry> {
        vec![
            ScriptEntry::new(Character::basic("Alice"), "hi"),
            ScriptEntry::new(Character::basic("Bob"), "yo"),
        ]
    }

    #[test]
    fn complete_summary_sections_in_order() {
        let dir = tempdir().expect("temp dir");
        let video_path = dir.path().join("cats_meme.mp4");
        std::fs::write(&video_path, vec![0u8; 1024 * 1024]).unwrap();
        let video = VideoFile::new(&video_path, 4.5).unwrap();
        let merged = AudioFile::new("/p/cats_merged.wav", Character::basic("Merged"), "m")
            .with_duration(3.25)
            .with_size(2 * 1024 * 1024);

        let text = RunSummary::new(
            SummaryKind::Complete,
            "cats",
            &entries(),
            &audio(),
            Some(&merged),
            Some(&video),
        )
        .to_text();

        assert!(text.starts_with("# Complete Meme Creation Summary\n\nGenerated: 2 script entries\n"));
        assert!(text.contains("Total Duration: 3.25 seconds\nCharacters: Alice, Bob\n"));
        assert!(text.contains("- 000_alice.wav\n- 001_bob.wav\n"));
        assert!(text.contains("- cats_merged.wav\n- Total Duration: 3.25 seconds\n- File Size: 2.00 MB"));
        assert!(text.contains("- cats_meme.mp4\n- File Size: 1.00 MB\n- Render Time: 4.50 seconds"));

        let order: Vec<usize> = [
            "## Script Files",
            "## TTS Files",
            "## Merged Audio",
            "## Video (with Subtitles)",
            "## TTS Metadata",
        ]
        .iter()
        .map(|h| text.find(h).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn script_and_tts_summary_omits_absent_sections() {
        let text = RunSummary::new(SummaryKind::ScriptAndTts, "cats", &entries(), &audio(), None, None)
            .to_text();
        assert!(text.starts_with("# Script and TTS Generation Summary"));
        assert!(!text.contains("## Merged Audio"));
        assert!(!text.contains("## Video"));
        assert!(!text.contains("## Script Files"));
    }

    #[test]
    fn script_and_tts_text_is_exact() {
        let text = RunSummary::new(SummaryKind::ScriptAndTts, "cats", &entries(), &audio(), None, None)
            .to_text();
        assert_eq!(
            text,
            "# Script and TTS Generation Summary\n\n\
             Generated: 2 script entries\n\
             Audio Files: 2\n\
             Total Duration: 3.25 seconds\n\
             Characters: Alice, Bob\n\n\
             ## TTS Files\n\
             - 000_alice.wav\n\
             - 001_bob.wav\n"
        );
    }

    #[test]
    fn json_has_rfc3339_timestamp() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("s.json");
        RunSummary::new(SummaryKind::Complete, "cats", &entries(), &audio(), None, None)
            .write_json(&path)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "complete");
        assert_eq!(value["script_entries"], 2);
        assert!(value["merged_audio"].is_null());
        let stamp = value["generated_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
