//! Character definitions shared by every pipeline stage.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A speaker in the dialogue, with the voice settings used for TTS.
///
/// Every field except `name` is optional in JSON and defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub speaking_style: String,
    #[serde(default)]
    pub conversational_role: String,
    /// Full-frame overlay image shown while the character speaks.
    #[serde(default, with = "optional_path")]
    pub image_path: Option<PathBuf>,
    /// Reference audio filename on the TTS server; selects clone mode.
    #[serde(default)]
    pub tts_voice_clone: String,
    #[serde(default)]
    pub tts_voice_predefined: String,
    /// Voice profile preset name (e.g. `"EXPRESSIVE_MONOLOGUE"`).
    #[serde(default)]
    pub tts_voice_profile: String,
    /// String-valued overrides applied on top of the preset.
    #[serde(default)]
    pub tts_voice_profile_overrides: BTreeMap<String, String>,
}

impl Character {
    /// A character with only a name, used when a script mentions someone
    /// the config does not know about.
    pub fn basic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            speaking_style: String::new(),
            conversational_role: String::new(),
            image_path: None,
            tts_voice_clone: String::new(),
            tts_voice_predefined: String::new(),
            tts_voice_profile: String::new(),
            tts_voice_profile_overrides: BTreeMap::new(),
        }
    }

    /// Lowercased name used for all character lookups.
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// Returns the overlay image only when it is set and exists on disk.
    pub fn existing_image(&self) -> Option<&Path> {
        self.image_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Short description of the configured voice, used in error messages.
    pub fn voice_summary(&self) -> String {
        if !self.tts_voice_clone.is_empty() {
            format!("'{}' (clone: {})", self.name, self.tts_voice_clone)
        } else if !self.tts_voice_predefined.is_empty() {
            format!("'{}' (predefined: {})", self.name, self.tts_voice_predefined)
        } else {
            format!("'{}'", self.name)
        }
    }
}

// ---------------------------------------------------------------------------
// CharacterMap
// ---------------------------------------------------------------------------

/// Case-insensitive name → character lookup.
#[derive(Debug, Clone, Default)]
pub struct CharacterMap {
    by_key: HashMap<String, Character>,
}

impl CharacterMap {
    pub fn new(characters: &[Character]) -> Self {
        let mut map = Self::default();
        for c in characters {
            map.insert(c.clone());
        }
        map
    }

    pub fn insert(&mut self, character: Character) {
        self.by_key.insert(character.key(), character);
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.by_key.get(&name.trim().to_lowercase())
    }

    /// Look up `name`, registering a basic character (and logging a warning)
    /// when it is unknown.
    pub fn resolve_or_insert(&mut self, name: &str) -> Character {
        if let Some(c) = self.get(name) {
            return c.clone();
        }
        log::warn!("Character '{name}' not in config, created basic character");
        let character = Character::basic(name.trim());
        self.insert(character.clone());
        character
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

// ---------------------------------------------------------------------------
// serde helper: "" <-> None
// ---------------------------------------------------------------------------

mod optional_path {
    use std::path::PathBuf;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(p) => s.serialize_str(&p.to_string_lossy()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PathBuf>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
    }
}
