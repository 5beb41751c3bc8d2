//! Configuration module.
//!
//! Provides the per-run [`ProjectConfig`] (JSON), its sub-configs and
//! [`Character`] records, plus the per-user [`AppSettings`] (TOML) and
//! [`settings_path`] for the platform config directory.

pub mod character;
pub mod paths;
pub mod project;
pub mod settings;

pub use character::{Character, CharacterMap};
pub use paths::settings_path;
pub use project::{
    ChatterboxConfig, ConfigError, GeminiConfig, LlmConfig, ProjectConfig, RenderConfig,
    ScriptConfig, SubtitleConfig, SubtitlePosition, ThinkingConfig, TtsConfig, VideoConfig,
};
pub use settings::{AppSettings, PipelineDefaults, ServiceConfig, ToolsConfig};
