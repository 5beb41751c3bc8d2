//! Parsing of `NAME: line` dialogue text into [`ScriptEntry`] records.

use std::path::PathBuf;

use thiserror::Error;

use super::model::{Script, ScriptEntry};
use crate::config::{Character, CharacterMap};
use crate::llm::LlmError;

// ---------------------------------------------------------------------------
// ScriptError
// ---------------------------------------------------------------------------

/// Errors raised while generating, parsing or loading scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid script JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but does not have the expected shape.
    #[error("{0}")]
    Format(String),

    /// One message per offending line.
    #[error("Invalid script format: {}", .0.join(", "))]
    InvalidFormat(Vec<String>),

    #[error("No valid script entries found after parsing.")]
    Empty,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Check that every non-blank line has a `NAME:` prefix.
///
/// Returns one message per bad line, numbered from 1; empty means valid.
pub fn validate_script_format(text: &str) -> Vec<String> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.contains(':') {
                None
            } else {
                Some(format!("Line {}: Missing colon - '{}'", i + 1, trimmed))
            }
        })
        .collect()
}

/// Parse LLM output into a [`Script`].
///
/// Names are matched case-insensitively against `characters`; unknown
/// speakers become basic characters.
pub fn parse_script(text: &str, characters: &[Character]) -> Result<Script, ScriptError> {
    let errors = validate_script_format(text);
    if !errors.is_empty() {
        return Err(ScriptError::InvalidFormat(errors));
    }

    let mut cast = CharacterMap::new(characters);
    let entries: Vec<ScriptEntry> = text
        .lines()
        .filter_map(|line| split_speaker(line))
        .map(|(name, content)| ScriptEntry::new(cast.resolve_or_insert(name), content))
        .collect();

    if entries.is_empty() {
        return Err(ScriptError::Empty);
    }
    log::debug!("parsed {} script entries", entries.len());
    Ok(Script::new(entries))
}

/// Split `NAME: content` on the first colon, trimming both halves.
///
/// Returns `None` for blank lines, lines without a colon and lines whose
/// name is empty.
pub(crate) fn split_speaker(line: &str) -> Option<(&str, &str)> {
    let (name, content) = line.trim().split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, content.trim()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cast() -> Vec<Character> {
        let mut alice = Character::basic("Alice");
        alice.tts_voice_clone = "alice.wav".into();
        vec![alice, Character::basic("Bob")]
    }

    #[test]
    fn validation_reports_lines_without_colon() {
        let errors = validate_script_format("ALICE: hi\n\nnarration here\nBOB: yo\n  laughs  ");
        assert_eq!(
            errors,
            vec![
                "Line 3: Missing colon - 'narration here'",
                "Line 5: Missing colon - 'laughs'",
            ]
        );
    }

    #[test]
    fn parse_matches_characters_case_insensitively() {
        let script = parse_script("ALICE:  Hello there \nbob: Time: 5pm\n", &cast()).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.entries[0].character.name, "Alice");
        assert_eq!(script.entries[0].character.tts_voice_clone, "alice.wav");
        assert_eq!(script.entries[0].content, "Hello there");
        assert_eq!(script.entries[1].character.name, "Bob");
        assert_eq!(script.entries[1].content, "Time: 5pm");
    }

    #[test]
    fn unknown_speaker_becomes_basic_character() {
        let script = parse_script("Carol: who am I?", &cast()).unwrap();
        assert_eq!(script.entries[0].character, Character::basic("Carol"));
    }

    #[test]
    fn invalid_format_error_joins_messages() {
        let err = parse_script("ALICE: ok\nno colon\nalso none", &cast()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid script format: Line 2: Missing colon - 'no colon', Line 3: Missing colon - 'also none'"
        );
    }

    #[test]
    fn empty_text_has_no_entries() {
        let err = parse_script("  \n\n", &cast()).unwrap_err();
        assert!(matches!(err, ScriptError::Empty));
        assert_eq!(err.to_string(), "No valid script entries found after parsing.");
    }
}
