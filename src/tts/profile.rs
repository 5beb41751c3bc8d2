//! Chatterbox voice profiles: named presets plus per-character overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Character;

/// Generation parameters sent alongside a TTS request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub temperature: f64,
    pub exaggeration: f64,
    pub cfg_weight: f64,
    pub seed: i64,
    pub speed_factor: f64,
    pub language: String,
}

/// Preset names, in the order they are listed to users.
pub const PRESET_NAMES: [&str; 7] = [
    "STANDARD_NARRATION",
    "EXPRESSIVE_MONOLOGUE",
    "TECHNICAL_EXPLANATION",
    "UPBEAT_ADVERTISEMENT",
    "THOUGHTFUL_REFLECTION",
    "SIMPLE_PUNCTUATION_TEST",
    "LONG_STORY_EXCERPT",
];

impl VoiceProfile {
    fn with(temperature: f64, exaggeration: f64, cfg_weight: f64) -> Self {
        Self {
            temperature,
            exaggeration,
            cfg_weight,
            seed: 0,
            speed_factor: 1.0,
            language: "en".into(),
        }
    }

    /// Look up a preset by name, ignoring case.
    pub fn preset(name: &str) -> Option<Self> {
        let profile = match name.trim().to_uppercase().as_str() {
            "STANDARD_NARRATION" => Self::with(0.8, 0.4, 0.5),
            "EXPRESSIVE_MONOLOGUE" => Self::with(0.75, 1.1, 0.6),
            "TECHNICAL_EXPLANATION" => Self::with(0.85, 0.4, 0.5),
            "UPBEAT_ADVERTISEMENT" => Self::with(0.8, 1.3, 0.45),
            "THOUGHTFUL_REFLECTION" => Self::with(0.7, 0.4, 0.6),
            "SIMPLE_PUNCTUATION_TEST" => Self::with(0.8, 0.5, 0.5),
            "LONG_STORY_EXCERPT" => Self::with(0.78, 1.1, 0.55),
            _ => return None,
        };
        Some(profile)
    }

    /// Apply string-valued overrides.  Unknown keys and values that do not
    /// parse are logged and skipped.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) {
        for (key, raw) in overrides {
            let value = raw.trim();
            let applied = match key.as_str() {
                "temperature" => value.parse().map(|v| self.temperature = v).is_ok(),
                "exaggeration" => value.parse().map(|v| self.exaggeration = v).is_ok(),
                "cfg_weight" => value.parse().map(|v| self.cfg_weight = v).is_ok(),
                "seed" => value.parse().map(|v| self.seed = v).is_ok(),
                "speed_factor" => value.parse().map(|v| self.speed_factor = v).is_ok(),
                "language" => {
                    self.language = value.to_string();
                    true
                }
                _ => {
                    log::warn!("Unknown voice profile override '{key}', ignoring");
                    continue;
                }
            };
            if !applied {
                log::warn!("Invalid value '{raw}' for voice profile override '{key}', ignoring");
            }
        }
    }

    /// The character's preset with its overrides applied, or `None` when no
    /// (known) preset is configured.
    pub fn for_character(character: &Character) -> Option<Self> {
        let name = character.tts_voice_profile.trim();
        if name.is_empty() {
            return None;
        }
        let Some(mut profile) = Self::preset(name) else {
            log::warn!(
                "Unknown voice profile '{name}' for '{}', sending none",
                character.name
            );
            return None;
        };
        profile.apply_overrides(&character.tts_voice_profile_overrides);
        Some(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_preset_resolves() {
        for name in PRESET_NAMES {
            assert!(VoiceProfile::preset(name).is_some(), "{name}");
        }
        let p = VoiceProfile::preset("upbeat_advertisement").unwrap();
        assert_eq!((p.temperature, p.exaggeration, p.cfg_weight), (0.8, 1.3, 0.45));
        assert_eq!((p.seed, p.speed_factor, p.language.as_str()), (0, 1.0, "en"));
        assert!(VoiceProfile::preset("WHISPER").is_none());
    }

    #[test]
    fn overrides_parse_known_fields_only() {
        let mut p = VoiceProfile::preset("STANDARD_NARRATION").unwrap();
        let overrides: BTreeMap<String, String> = [
            ("temperature", "0.55"),
            ("seed", "42"),
            ("speed_factor", "fast"),
            ("language", "de"),
            ("pitch", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        p.apply_overrides(&overrides);
        assert_eq!(p.temperature, 0.55);
        assert_eq!(p.seed, 42);
        assert_eq!(p.speed_factor, 1.0);
        assert_eq!(p.language, "de");
    }

    #[test]
    fn character_without_profile_gets_none() {
        let mut c = Character::basic("Alice");
        assert!(VoiceProfile::for_character(&c).is_none());

        c.tts_voice_profile = "thoughtful_reflection".into();
        c.tts_voice_profile_overrides.insert("exaggeration".into(), "0.9".into());
        let p = VoiceProfile::for_character(&c).unwrap();
        assert_eq!(p.exaggeration, 0.9);
        assert_eq!(p.temperature, 0.7);
    }
}
