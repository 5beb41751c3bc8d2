//! Per-run project configuration, loaded from a JSON file.
//!
//! The `script`, `tts` and `video` sections are optional so that partial
//! runs (e.g. video from existing audio) can use a trimmed-down file; each
//! pipeline stage checks for the section it needs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::character::{Character, CharacterMap};
use crate::video::{VideoFormat, VideoQuality};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`ProjectConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field failed validation; the message names the field.
    #[error("{0}")]
    Invalid(String),

    #[error("Unsupported {kind} provider: {name}")]
    UnsupportedProvider { kind: &'static str, name: String },

    /// A stage was requested without its config section.
    #[error("{0} configuration is required")]
    MissingSection(&'static str),
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

/// Gemini extended-thinking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(default)]
    pub include_thoughts: bool,
    #[serde(default)]
    pub thinking_budget: i64,
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            include_thoughts: false,
            thinking_budget: 0,
        }
    }
}

/// Generation parameters for the Gemini provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub model: String,
    /// Append an instruction asking for the bare script with no commentary.
    pub direct_output: bool,
    pub thinking_config: ThinkingConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1024,
            model: "gemini-2.5-flash".into(),
            direct_output: false,
            thinking_config: ThinkingConfig::default(),
        }
    }
}

/// LLM provider selection and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    /// Empty means "read from the environment".
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_llm_provider() -> String {
    "gemini".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: String::new(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key: config value, then `GEMINI_API_KEY`, then
    /// `GOOGLE_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .filter_map(|name| env(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Parameters for dialogue generation.
///
/// `characters` is not part of the JSON `script` section; it is filled from
/// the top-level `characters` list after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub overall_conversation_style: String,
    pub main_topic: String,
    #[serde(default)]
    pub scenario: String,
    pub dialogue_length: String,
    #[serde(default)]
    pub system_prompt_extra: String,
    #[serde(default)]
    pub user_prompt_extra: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(skip)]
    pub characters: Vec<Character>,
}

// ---------------------------------------------------------------------------
// TTS
// ---------------------------------------------------------------------------

/// Connection settings for a Chatterbox TTS server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatterboxConfig {
    pub base_url: String,
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_tts_timeout")]
    pub timeout: u64,
}

fn default_tts_endpoint() -> String {
    "/tts".into()
}

fn default_tts_timeout() -> u64 {
    120
}

impl ChatterboxConfig {
    /// Full synthesis URL, tolerant of a trailing slash on `base_url`.
    pub fn tts_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_provider")]
    pub provider: String,
    pub chatterbox: Option<ChatterboxConfig>,
}

fn default_tts_provider() -> String {
    "chatterbox".into()
}

impl TtsConfig {
    /// The Chatterbox section, required by the only supported provider.
    pub fn chatterbox(&self) -> Result<&ChatterboxConfig, ConfigError> {
        self.chatterbox
            .as_ref()
            .ok_or(ConfigError::MissingSection("Chatterbox TTS"))
    }
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// Vertical placement of subtitle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    Top,
    Center,
    Bottom,
}

impl Default for SubtitlePosition {
    fn default() -> Self {
        Self::Bottom
    }
}

/// Styling for burned-in subtitles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    pub enabled: bool,
    pub font_name: String,
    pub font_size: u32,
    pub font_color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub position: SubtitlePosition,
    /// Distance from the top/bottom edge in pixels.
    pub margin: u32,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_name: "Arial".into(),
            font_size: 48,
            font_color: "white".into(),
            stroke_color: "black".into(),
            stroke_width: 2,
            position: SubtitlePosition::Bottom,
            margin: 50,
        }
    }
}

/// Encoder and canvas settings for the video renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub quality: VideoQuality,
    pub fps: u32,
    /// Kept for config compatibility; the container format picks the codec.
    pub codec: String,
    pub format: VideoFormat,
    /// Output width; both `width` and `height` must be set to override the
    /// background's size.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub subtitles: SubtitleConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quality: VideoQuality::Medium,
            fps: 30,
            codec: "libx264".into(),
            format: VideoFormat::Mp4,
            width: None,
            height: None,
            subtitles: SubtitleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_video_provider")]
    pub provider: String,
    pub background_video: PathBuf,
    #[serde(default, alias = "moviepy", alias = "movis")]
    pub render: RenderConfig,
}

fn default_video_provider() -> String {
    "ffmpeg".into()
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for one pipeline run.
///
/// ```rust,no_run
/// use memeforge::config::ProjectConfig;
///
/// let config = ProjectConfig::load_from("config.json".as_ref()).unwrap();
/// println!("writing to {}", config.project_dir().display());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project_name: String,
    #[serde(default = "default_output_dir")]
    pub base_output_dir: PathBuf,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub script: Option<ScriptConfig>,
    #[serde(default)]
    pub tts: Option<TtsConfig>,
    #[serde(default)]
    pub video: Option<VideoConfig>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl ProjectConfig {
    /// Load, populate script characters and validate.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::debug!("loaded project config '{}' from {}", config.project_name, path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(content)?;
        if let Some(script) = config.script.as_mut() {
            script.characters = config.characters.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_name.trim().is_empty() {
            return Err(invalid("project_name cannot be empty"));
        }
        for c in &self.characters {
            if c.name.trim().is_empty() {
                return Err(invalid("Character 'name' cannot be empty."));
            }
        }

        if let Some(script) = &self.script {
            if script.overall_conversation_style.trim().is_empty() {
                return Err(invalid("Overall conversation style cannot be empty."));
            }
            if script.main_topic.trim().is_empty() {
                return Err(invalid("Main topic cannot be empty."));
            }
            if script.dialogue_length.trim().is_empty() {
                return Err(invalid("Dialogue length cannot be empty."));
            }
            if script.characters.is_empty() {
                return Err(invalid("At least one character must be provided."));
            }
            validate_llm(&script.llm)?;
        }

        if let Some(tts) = &self.tts {
            if !tts.provider.eq_ignore_ascii_case("chatterbox") {
                return Err(ConfigError::UnsupportedProvider {
                    kind: "TTS",
                    name: tts.provider.clone(),
                });
            }
            if let Some(cb) = &tts.chatterbox {
                if cb.base_url.trim().is_empty() {
                    return Err(invalid("Base URL cannot be empty"));
                }
                if cb.timeout == 0 {
                    return Err(invalid("Timeout must be positive"));
                }
            }
        }

        if let Some(video) = &self.video {
            validate_video(video)?;
        }

        Ok(())
    }

    /// `base_output_dir/project_name`.
    pub fn project_dir(&self) -> PathBuf {
        self.base_output_dir.join(&self.project_name)
    }

    pub fn character_map(&self) -> CharacterMap {
        CharacterMap::new(&self.characters)
    }

    pub fn require_script(&self) -> Result<&ScriptConfig, ConfigError> {
        self.script.as_ref().ok_or(ConfigError::MissingSection("Script"))
    }

    pub fn require_tts(&self) -> Result<&TtsConfig, ConfigError> {
        self.tts.as_ref().ok_or(ConfigError::MissingSection("TTS"))
    }

    pub fn require_video(&self) -> Result<&VideoConfig, ConfigError> {
        self.video.as_ref().ok_or(ConfigError::MissingSection("Video"))
    }
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if !llm.provider.eq_ignore_ascii_case("gemini") {
        return Err(ConfigError::UnsupportedProvider {
            kind: "LLM",
            name: llm.provider.clone(),
        });
    }
    let g = &llm.gemini;
    if !(0.0..=2.0).contains(&g.temperature) {
        return Err(invalid("Temperature must be a number between 0 and 2"));
    }
    if g.max_output_tokens == 0 {
        return Err(invalid("max_output_tokens must be a positive integer"));
    }
    if g.model.trim().is_empty() {
        return Err(invalid("Model must be a non-empty string"));
    }
    if g.thinking_config.thinking_budget < 0 {
        return Err(invalid("thinking_budget must be a non-negative number"));
    }
    Ok(())
}

fn validate_video(video: &VideoConfig) -> Result<(), ConfigError> {
    let provider = video.provider.to_lowercase();
    if !matches!(provider.as_str(), "ffmpeg" | "moviepy" | "movis") {
        return Err(ConfigError::UnsupportedProvider {
            kind: "video",
            name: video.provider.clone(),
        });
    }
    let r = &video.render;
    if r.fps == 0 {
        return Err(invalid("fps must be positive"));
    }
    if r.width == Some(0) || r.height == Some(0) {
        return Err(invalid("width and height must be positive"));
    }
    let s = &r.subtitles;
    if s.font_name.trim().is_empty() {
        return Err(invalid("font_name cannot be empty"));
    }
    if s.font_size == 0 {
        return Err(invalid("font_size must be positive"));
    }
    if s.font_color.trim().is_empty() {
        return Err(invalid("font_color cannot be empty"));
    }
    if s.stroke_color.trim().is_empty() {
        return Err(invalid("stroke_color cannot be empty"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FULL: &str = r#"{
        "project_name": "demo",
        "base_output_dir": "out",
        "characters": [
            {"name": "Alice", "speaking_style": "dry", "tts_voice_clone": "alice.wav"},
            {"name": "Bob", "tts_voice_predefined": "Bob.wav", "tts_voice_profile": "UPBEAT_ADVERTISEMENT"}
        ],
        "script": {
            "overall_conversation_style": "banter",
            "main_topic": "cats",
            "scenario": "",
            "dialogue_length": "6 lines",
            "llm": {"provider": "gemini", "gemini": {"temperature": 1.2}}
        },
        "tts": {"provider": "chatterbox", "chatterbox": {"base_url": "http://localhost:8004/"}},
        "video": {"provider": "moviepy", "background_video": "bg.mp4",
                  "moviepy": {"quality": "high", "fps": 24}}
    }"#;

    #[test]
    fn parses_full_config_with_defaults() {
        let cfg = ProjectConfig::from_json(FULL).expect("valid");
        assert_eq!(cfg.project_dir(), PathBuf::from("out/demo"));

        let script = cfg.require_script().unwrap();
        assert_eq!(script.characters.len(), 2);
        assert_eq!(script.llm.gemini.temperature, 1.2);
        assert_eq!(script.llm.gemini.max_output_tokens, 1024);
        assert_eq!(script.llm.gemini.model, "gemini-2.5-flash");

        let cb = cfg.require_tts().unwrap().chatterbox().unwrap();
        assert_eq!(cb.endpoint, "/tts");
        assert_eq!(cb.timeout, 120);
        assert_eq!(cb.tts_url(), "http://localhost:8004/tts");

        let video = cfg.require_video().unwrap();
        assert_eq!(video.render.quality, VideoQuality::High);
        assert_eq!(video.render.fps, 24);
        assert_eq!(video.render.codec, "libx264");
        assert!(video.render.subtitles.enabled);
        assert_eq!(video.render.subtitles.position, SubtitlePosition::Bottom);
    }

    #[test]
    fn sections_are_optional() {
        let cfg = ProjectConfig::from_json(r#"{"project_name": "p"}"#).unwrap();
        assert_eq!(cfg.base_output_dir, PathBuf::from("output"));
        assert!(matches!(
            cfg.require_video(),
            Err(ConfigError::MissingSection("Video"))
        ));
        assert_eq!(
            cfg.require_script().unwrap_err().to_string(),
            "Script configuration is required"
        );
    }

    #[test]
    fn rejects_blank_character_name() {
        let err = ProjectConfig::from_json(r#"{"project_name": "p", "characters": [{"name": "  "}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let json = FULL.replace("\"temperature\": 1.2", "\"temperature\": 2.5");
        let err = ProjectConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("between 0 and 2"));
    }

    #[test]
    fn rejects_script_without_characters() {
        let json = r#"{"project_name": "p", "script": {
            "overall_conversation_style": "s", "main_topic": "t", "dialogue_length": "l"}}"#;
        let err = ProjectConfig::from_json(json).unwrap_err();
        assert_eq!(err.to_string(), "At least one character must be provided.");
    }

    #[test]
    fn rejects_zero_timeout_and_unknown_provider() {
        let json = FULL.replace("\"base_url\": \"http://localhost:8004/\"", "\"base_url\": \"x\", \"timeout\": 0");
        assert!(ProjectConfig::from_json(&json)
            .unwrap_err()
            .to_string()
            .contains("Timeout must be positive"));

        let json = FULL.replace("\"provider\": \"gemini\"", "\"provider\": \"openai\"");
        assert!(matches!(
            ProjectConfig::from_json(&json),
            Err(ConfigError::UnsupportedProvider { kind: "LLM", .. })
        ));
    }

    #[test]
    fn api_key_resolution_order() {
        let mut llm = LlmConfig::default();
        let env = |name: &str| match name {
            "GOOGLE_API_KEY" => Some("google".to_string()),
            _ => None,
        };
        assert_eq!(llm.resolve_api_key_with(env).as_deref(), Some("google"));

        let env_both = |name: &str| Some(name.to_lowercase());
        assert_eq!(
            llm.resolve_api_key_with(env_both).as_deref(),
            Some("gemini_api_key")
        );

        llm.api_key = "from-config".into();
        assert_eq!(llm.resolve_api_key_with(env).as_deref(), Some("from-config"));

        llm.api_key.clear();
        assert!(llm.resolve_api_key_with(|_| None).is_none());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().expect("temp dir");
        let err = ProjectConfig::load_from(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.to_string().starts_with("Configuration file not found"));
    }

    #[test]
    fn round_trip_json() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested/config.json");

        let original = ProjectConfig::from_json(FULL).unwrap();
        original.save_to(&path).expect("save");
        let loaded = ProjectConfig::load_from(&path).expect("load");

        assert_eq!(loaded.project_name, original.project_name);
        assert_eq!(loaded.characters, original.characters);
        assert_eq!(
            loaded.require_script().unwrap().characters,
            original.characters
        );
        assert_eq!(
            loaded.require_video().unwrap().render.quality,
            VideoQuality::High
        );
    }
}
