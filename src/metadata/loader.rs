//! Rebuilding an [`AudioScript`] from whatever a directory holds.
//!
//! Order of preference is the metadata JSON, then `subtitles.srt`, then a
//! scan of the audio files themselves.

use std::path::{Path, PathBuf};

use super::json::{read_metadata, write_metadata, METADATA_FILE};
use super::srt::read_srt;
use super::MetadataError;
use crate::audio::{resolve_duration, AudioFile, AudioScript, DurationProbe};
use crate::config::{Character, CharacterMap};
use crate::script::{load_json_file, ScriptEntry, SCRIPT_ENTRIES_FILE};

/// Subtitle file written next to the synthesized audio.
pub const SUBTITLES_FILE: &str = "subtitles.srt";
/// Combined metadata written by [`build_complete_audio_script`].
pub const COMPLETE_AUDIO_SCRIPT_FILE: &str = "audio_script.json";

const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "mp3", "opus", "m4a", "flac"];

/// Audio files directly inside `dir`, sorted by path.
pub fn list_audio_files(dir: &Path) -> Result<Vec<PathBuf>, MetadataError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_audio = path
            .extension()
            .map(|e| {
                let e = e.to_string_lossy().to_lowercase();
                AUDIO_EXTENSIONS.contains(&e.as_str())
            })
            .unwrap_or(false);
        if is_audio && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// One [`AudioFile`] per cue, paired by position with the sorted audio
/// files in `dir`.
pub fn load_from_srt(srt: &Path, dir: &Path) -> Result<AudioScript, MetadataError> {
    let cues = read_srt(srt)?;
    let audio = if dir.is_dir() { list_audio_files(dir)? } else { Vec::new() };

    let files = cues
        .into_iter()
        .enumerate()
        .map(|(i, cue)| {
            let path = audio
                .get(i)
                .cloned()
                .unwrap_or_else(|| dir.join("unknown.wav"));
            let duration = cue.duration();
            AudioFile::new(path, Character::basic("Unknown"), cue.text).with_duration(duration)
        })
        .collect();
    Ok(AudioScript::from_files(files))
}

/// Try the metadata JSON, then the SRT.  Failures are logged and skipped.
pub fn load_with_fallback(dir: &Path) -> Option<AudioScript> {
    let json = dir.join(METADATA_FILE);
    if json.exists() {
        match read_metadata(&json) {
            Ok(script) => {
                log::info!("Loaded {} audio files from {}", script.len(), json.display());
                return Some(script);
            }
            Err(e) => log::warn!("Could not read {}: {e}", json.display()),
        }
    }

    let srt = dir.join(SUBTITLES_FILE);
    if srt.exists() {
        match load_from_srt(&srt, dir) {
            Ok(script) => {
                log::info!("Loaded {} cues from {}", script.len(), srt.display());
                return Some(script);
            }
            Err(e) => log::warn!("Could not read {}: {e}", srt.display()),
        }
    }

    None
}

/// Scan `dir` for audio named `NNN_character.ext`.
///
/// Characters come from `characters` and from `dir/script_entries.json`
/// when present; so does each file's dialogue, looked up by the numeric
/// prefix.
pub async fn load_from_directory(
    dir: &Path,
    characters: &[Character],
    probe: &dyn DurationProbe,
) -> Result<AudioScript, MetadataError> {
    if !dir.is_dir() {
        return Err(MetadataError::NotFound(dir.to_path_buf()));
    }

    let mut cast = CharacterMap::new(characters);
    let entries = read_script_entries(&dir.join(SCRIPT_ENTRIES_FILE));
    for e in &entries {
        cast.insert(e.character.clone());
    }

    let mut script = AudioScript::new();
    for path in list_audio_files(dir)? {
        let (index, name) = split_stem(&path);
        let character = match cast.get(&name).or_else(|| cast.get(&name.replace('_', " "))) {
            Some(c) => c.clone(),
            None => {
                log::warn!("Character '{name}' not found, created basic character");
                let c = Character::basic(name);
                cast.insert(c.clone());
                c
            }
        };

        let dialogue = index
            .and_then(|i| entries.get(i))
            .map(|e| e.content.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "Audio from {}",
                    path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
                )
            });

        let duration = resolve_duration(probe, &path).await;
        let size = std::fs::metadata(&path)?.len();
        script.add(
            AudioFile::new(path, character, dialogue)
                .with_duration(duration)
                .with_size(size),
        );
    }

    log::info!("Loaded {} audio files from {}", script.len(), dir.display());
    Ok(script)
}

/// Pair `project_dir/tts/*` with `project_dir/scripts/script_entries.json`
/// by position and write `project_dir/audio_script.json`.
pub async fn build_complete_audio_script(
    project_dir: &Path,
    probe: &dyn DurationProbe,
) -> Result<AudioScript, MetadataError> {
    let entries_path = project_dir.join("scripts").join(SCRIPT_ENTRIES_FILE);
    let tts_dir = project_dir.join("tts");
    if !entries_path.exists() {
        return Err(MetadataError::NotFound(entries_path));
    }
    if !tts_dir.is_dir() {
        return Err(MetadataError::NotFound(tts_dir));
    }

    let entries = load_json_file(&entries_path)?.entries;
    let characters: Vec<Character> = entries.iter().map(|e| e.character.clone()).collect();
    let scanned = load_from_directory(&tts_dir, &characters, probe).await?;

    let files = scanned
        .audio_files
        .into_iter()
        .enumerate()
        .map(|(i, mut f)| {
            if let Some(entry) = entries.get(i) {
                f.character = entry.character.clone();
                f.dialogue = entry.content.clone();
            }
            f
        })
        .collect();
    let script = AudioScript::from_files(files);

    let out = project_dir.join(COMPLETE_AUDIO_SCRIPT_FILE);
    write_metadata(&script, &out)?;
    log::info!(
        "Wrote complete audio script ({} files, {:.2}s) to {}",
        script.len(),
        script.total_duration_seconds,
        out.display()
    );
    Ok(script)
}

fn read_script_entries(path: &Path) -> Vec<ScriptEntry> {
    if !path.exists() {
        return Vec::new();
    }
    match load_json_file(path) {
        Ok(script) => script.entries,
        Err(e) => {
            log::warn!("Could not read {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// `"003_mr_smith"` → `(Some(3), "mr_smith")`; no underscore keeps the
/// whole stem as the name.
fn split_stem(path: &Path) -> (Option<usize>, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match stem.split_once('_') {
        Some((prefix, name)) => (prefix.parse().ok(), name.to_string()),
        None => (None, stem),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::script::{save_json, Script};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct Fixed(f64);

    #[async_trait]
    impl DurationProbe for Fixed {
        async fn probe_duration(&self, _path: &Path) -> Result<f64, AudioError> {
            Ok(self.0)
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, b"RIFF").unwrap();
        p
    }

    #[test]
    fn lists_audio_case_insensitively_and_sorted() {
        let dir = tempdir().expect("temp dir");
        touch(dir.path(), "002_b.MP3");
        touch(dir.path(), "001_a.wav");
        touch(dir.path(), "notes.txt");

        let names: Vec<_> = list_audio_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["001_a.wav", "002_b.MP3"]);
    }

    #[test]
    fn srt_cues_pair_with_audio_by_position() {
        let dir = tempdir().expect("temp dir");
        let first = touch(dir.path(), "000_alice.wav");
        std::fs::write(
            dir.path().join(SUBTITLES_FILE),
            "1\n00:00:00,000 --> 00:00:01,500\nHi\n\n2\n00:00:01,500 --> 00:00:02,000\nBye\n",
        )
        .unwrap();

        let script = load_with_fallback(dir.path()).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.audio_files[0].path, first);
        assert_eq!(script.audio_files[1].path, dir.path().join("unknown.wav"));
        assert_eq!(script.audio_files[0].character.name, "Unknown");
        assert_eq!(script.total_duration_seconds, 2.0);
    }

    #[test]
    fn fallback_prefers_json_and_skips_broken_files() {
        let dir = tempdir().expect("temp dir");
        std::fs::write(dir.path().join(METADATA_FILE), "{ not json").unwrap();
        assert!(load_with_fallback(dir.path()).is_none());

        let script = AudioScript::from_files(vec![AudioFile::new(
            dir.path().join("000_a.wav"),
            Character::basic("A"),
            "line",
        )
        .with_duration(1.0)]);
        write_metadata(&script, &dir.path().join(METADATA_FILE)).unwrap();
        assert_eq!(load_with_fallback(dir.path()).unwrap(), script);
    }

    #[tokio::test]
    async fn directory_scan_uses_script_entries() {
        let dir = tempdir().expect("temp dir");
        touch(dir.path(), "000_mr_smith.wav");
        touch(dir.path(), "001_carol.wav");
        touch(dir.path(), "002_dave.wav");

        let mut smith = Character::basic("Mr Smith");
        smith.tts_voice_predefined = "Smith.wav".into();
        let entries = Script::new(vec![
            ScriptEntry::new(smith, "Good morning."),
            ScriptEntry::new(Character::basic("Carol"), "Morning!"),
        ]);
        save_json(&entries, &dir.path().join(SCRIPT_ENTRIES_FILE)).unwrap();

        let script = load_from_directory(dir.path(), &[], &Fixed(1.0)).await.unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script.audio_files[0].character.tts_voice_predefined, "Smith.wav");
        assert_eq!(script.audio_files[0].dialogue, "Good morning.");
        assert_eq!(script.audio_files[1].character.name, "Carol");
        assert_eq!(script.audio_files[2].character.name, "dave");
        assert_eq!(script.audio_files[2].dialogue, "Audio from 002_dave.wav");
        assert_eq!(script.total_duration_seconds, 3.0);
        assert_eq!(script.audio_files[0].file_size_bytes, Some(4));
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let dir = tempdir().expect("temp dir");
        let err = load_from_directory(&dir.path().join("nope"), &[], &Fixed(1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
    }

    #[tokio::test]
    async fn complete_audio_script_pairs_by_position() {
        let dir = tempdir().expect("temp dir");
        let tts = dir.path().join("tts");
        std::fs::create_dir_all(&tts).unwrap();
        touch(&tts, "000_x.wav");
        touch(&tts, "001_y.wav");
        touch(&tts, "002_z.wav");

        let entries = Script::new(vec![
            ScriptEntry::new(Character::basic("Alice"), "one"),
            ScriptEntry::new(Character::basic("Bob"), "two"),
        ]);
        save_json(&entries, &dir.path().join("scripts").join(SCRIPT_ENTRIES_FILE)).unwrap();

        let script = build_complete_audio_script(dir.path(), &Fixed(2.0)).await.unwrap();
        assert_eq!(script.characters(), vec!["Alice", "Bob", "z"]);
        assert_eq!(script.audio_files[1].dialogue, "two");
        assert_eq!(script.total_duration_seconds, 6.0);
        assert!(dir.path().join(COMPLETE_AUDIO_SCRIPT_FILE).exists());
    }

    #[tokio::test]
    async fn complete_audio_script_requires_inputs() {
        let dir = tempdir().expect("temp dir");
        let err = build_complete_audio_script(dir.path(), &Fixed(1.0)).await.unwrap_err();
        assert!(err.to_string().contains("script_entries.json"));
    }
}
