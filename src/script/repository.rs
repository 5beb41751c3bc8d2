//! Loading and saving script files.
//!
//! Three on-disk forms are understood:
//!
//! * dialogue: `NAME: text` per line, `#` comments allowed;
//! * numbered: `1. NAME: text`, as produced by some editors and exports;
//! * JSON: the array written by [`save_json`].

use std::path::Path;

use serde_json::Value;

use super::model::{Script, ScriptEntry};
use super::parser::{split_speaker, ScriptError};
use crate::config::{Character, CharacterMap};

fn read_existing(path: &Path) -> Result<String, ScriptError> {
    if !path.exists() {
        return Err(ScriptError::NotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Load a plain `NAME: text` file.
pub fn load_dialogue_file(path: &Path, characters: &[Character]) -> Result<Script, ScriptError> {
    let content = read_existing(path)?;
    let mut cast = CharacterMap::new(characters);
    let mut entries = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match split_speaker(line) {
            Some((name, text)) => entries.push(ScriptEntry::new(cast.resolve_or_insert(name), text)),
            None => log::warn!("Line {} has invalid format, skipping: {}", i + 1, line),
        }
    }

    log::info!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(Script::new(entries))
}

fn is_numbered(line: &str) -> bool {
    line.starts_with(|c: char| c.is_ascii_digit()) && line.contains('.')
}

/// Load a `N. NAME: text` file.  Lines without a colon are skipped silently.
pub fn load_numbered_file(path: &Path, characters: &[Character]) -> Result<Script, ScriptError> {
    let content = read_existing(path)?;
    let mut cast = CharacterMap::new(characters);
    let mut entries = Vec::new();

    for line in content.lines() {
        let mut line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if is_numbered(line) {
            if let Some((_, rest)) = line.split_once('.') {
                line = rest.trim();
            }
        }
        if let Some((name, text)) = split_speaker(line) {
            entries.push(ScriptEntry::new(cast.resolve_or_insert(name), text));
        }
    }

    log::info!("Loaded {} numbered entries from {}", entries.len(), path.display());
    Ok(Script::new(entries))
}

/// Load the JSON array form.
///
/// Each element's `character` is a full character record; config
/// characters are not consulted.
pub fn load_json_file(path: &Path) -> Result<Script, ScriptError> {
    let content = read_existing(path)?;
    let root: Value = serde_json::from_str(&content)?;
    if !root.is_array() {
        return Err(ScriptError::Format(
            "JSON file must contain a list of script entries".into(),
        ));
    }
    let entries: Vec<ScriptEntry> = serde_json::from_value(root)?;
    log::info!("Loaded {} entries from JSON {}", entries.len(), path.display());
    Ok(Script::new(entries))
}

/// Pick a loader from the extension and, for text files, the first lines.
pub fn load_auto(path: &Path, characters: &[Character]) -> Result<Script, ScriptError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => load_json_file(path),
        "txt" | "script" => {
            let content = read_existing(path)?;
            let numbered = content.lines().take(5).any(|l| is_numbered(l.trim()));
            if numbered {
                load_numbered_file(path, characters)
            } else {
                load_dialogue_file(path, characters)
            }
        }
        _ => load_dialogue_file(path, characters),
    }
}

/// Write `script` as a pretty-printed JSON array, creating parent dirs.
pub fn save_json(script: &Script, path: &Path) -> Result<(), ScriptError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&script.entries)?;
    std::fs::write(path, json)?;
    log::debug!("saved {} script entries to {}", script.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
