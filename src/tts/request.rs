//! TTS request model and its JSON wire form.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::profile::VoiceProfile;
use crate::config::Character;
use crate::script::ScriptEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    Predefined,
    Clone,
}

impl VoiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceMode::Predefined => "predefined",
            VoiceMode::Clone => "clone",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Opus,
}

impl OutputFormat {
    /// File extension and wire name.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Opus => "opus",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One line to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub struct TtsRequest {
    pub text: String,
    pub character: Character,
    pub voice_mode: VoiceMode,
    pub predefined_voice_id: Option<String>,
    pub reference_audio_filename: Option<String>,
    pub output_format: OutputFormat,
    pub split_text: bool,
    pub chunk_size: u32,
    pub voice_profile: Option<VoiceProfile>,
}

impl TtsRequest {
    /// Build a request from the speaker's voice settings: clone mode when a
    /// clone file is set, predefined otherwise.
    pub fn for_entry(entry: &ScriptEntry, output_format: OutputFormat) -> Self {
        let c = &entry.character;
        let (voice_mode, predefined_voice_id, reference_audio_filename) =
            if !c.tts_voice_clone.is_empty() {
                (VoiceMode::Clone, None, Some(c.tts_voice_clone.clone()))
            } else {
                let id = Some(c.tts_voice_predefined.clone()).filter(|v| !v.is_empty());
                (VoiceMode::Predefined, id, None)
            };

        Self {
            text: entry.content.clone(),
            character: c.clone(),
            voice_mode,
            predefined_voice_id,
            reference_audio_filename,
            output_format,
            split_text: true,
            chunk_size: 120,
            voice_profile: VoiceProfile::for_character(c),
        }
    }

    /// The voice the request names, for error messages.
    pub fn voice_id(&self) -> &str {
        match self.voice_mode {
            VoiceMode::Clone => self.reference_audio_filename.as_deref().unwrap_or(""),
            VoiceMode::Predefined => self.predefined_voice_id.as_deref().unwrap_or(""),
        }
    }

    /// Request body with the profile fields flattened in.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "text":          self.text,
            "voice_mode":    self.voice_mode.as_str(),
            "output_format": self.output_format.extension(),
            "split_text":    self.split_text,
            "chunk_size":    self.chunk_size,
        });
        if let Some(id) = &self.predefined_voice_id {
            body["predefined_voice_id"] = json!(id);
        }
        if let Some(file) = &self.reference_audio_filename {
            body["reference_audio_filename"] = json!(file);
        }
        if let (Some(profile), Some(obj)) = (&self.voice_profile, body.as_object_mut()) {
            if let Ok(Value::Object(fields)) = serde_json::to_value(profile) {
                obj.extend(fields);
            }
        }
        body
    }
}
