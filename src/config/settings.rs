//! Per-user tool settings, defaults and TOML persistence.
//!
//! These are machine-level knobs (where ffmpeg lives, default merge
//! behaviour) as opposed to the per-run [`ProjectConfig`](super::ProjectConfig).

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::settings_path;

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// Locations of external binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

/// Locate `name` on `PATH`, falling back to the bare name so the OS can
/// still resolve it at spawn time.
fn locate(name: &str) -> String {
    which::which(name).map_or_else(|_| name.to_string(), |p| p.to_string_lossy().to_string())
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: locate("ffmpeg"),
            ffprobe_path: locate("ffprobe"),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineDefaults
// ---------------------------------------------------------------------------

/// Defaults for CLI flags that are not given explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// Merge per-line audio into a single track after TTS.
    pub merge_audio: bool,
    /// Seconds of silence inserted between merged lines.
    pub delay_between_files: f64,
    /// Length of `preview` renders in seconds.
    pub preview_seconds: f64,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            merge_audio: true,
            delay_between_files: 0.0,
            preview_seconds: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Remote service endpoints that are not part of a project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Seconds to wait for script generation before timing out.
    pub llm_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com".into(),
            llm_timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// AppSettings  (top-level)
// ---------------------------------------------------------------------------

/// Top-level tool settings, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use memeforge::config::AppSettings;
///
/// // Returns Default when the file is missing.
/// let settings = AppSettings::load().unwrap();
/// println!("ffmpeg at {}", settings.tools.ffmpeg_path);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub tools: ToolsConfig,
    pub defaults: PipelineDefaults,
    pub services: ServiceConfig,
}

impl AppSettings {
    /// Load settings from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppSettings::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_path())
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to the platform-appropriate `settings.toml`.
    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_path())
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
