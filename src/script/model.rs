//! Script records.

use serde::{Deserialize, Serialize};

use crate::config::Character;

/// One line of dialogue and the character who speaks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub character: Character,
    pub content: String,
}

impl ScriptEntry {
    pub fn new(character: Character, content: impl Into<String>) -> Self {
        Self {
            character,
            content: content.into(),
        }
    }

    /// `NAME: content`, the form the dialogue files use.
    pub fn as_dialogue_line(&self) -> String {
        format!("{}: {}", self.character.name, self.content)
    }
}

/// An ordered dialogue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub entries: Vec<ScriptEntry>,
}

impl Script {
    pub fn new(entries: Vec<ScriptEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unique speaker names in order of first appearance.
    pub fn characters(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for e in &self.entries {
            if !seen.contains(&e.character.name) {
                seen.push(e.character.name.clone());
            }
        }
        seen
    }

    /// The whole dialogue as `NAME: content` lines.
    pub fn to_dialogue(&self) -> String {
        self.entries
            .iter()
            .map(ScriptEntry::as_dialogue_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<ScriptEntry>> for Script {
    fn from(entries: Vec<ScriptEntry>) -> Self {
        Self::new(entries)
    }
}
