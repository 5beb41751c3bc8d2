//! LLM-backed dialogue generation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::model::Script;
use super::parser::{parse_script, ScriptError};
use super::repository::save_json;
use crate::config::ScriptConfig;
use crate::llm::{LlmClient, PromptBuilder};

/// Name of the JSON file written by [`ScriptGenerator::generate_and_save`].
pub const SCRIPT_ENTRIES_FILE: &str = "script_entries.json";

/// Builds prompts from a [`ScriptConfig`], calls the LLM and parses the
/// reply.
pub struct ScriptGenerator {
    llm: Arc<dyn LlmClient>,
}

impl ScriptGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, config: &ScriptConfig) -> Result<Script, ScriptError> {
        let (system, user) = PromptBuilder::new(config).build();
        log::info!("Generating script about '{}'", config.main_topic);

        let started = Instant::now();
        let raw = self.llm.generate(&system, &user).await?;
        log::debug!(
            "LLM replied with {} chars in {:.2}s",
            raw.len(),
            started.elapsed().as_secs_f64()
        );

        let script = parse_script(raw.trim(), &config.characters)?;
        log::info!(
            "Generated {} script entries ({} characters)",
            script.len(),
            script.characters().len()
        );
        Ok(script)
    }

    /// Generate and write `dir/script_entries.json`.
    pub async fn generate_and_save(
        &self,
        config: &ScriptConfig,
        dir: &Path,
    ) -> Result<Script, ScriptError> {
        std::fs::create_dir_all(dir)?;
        let script = self.generate(config).await?;
        save_json(&script, &dir.join(SCRIPT_ENTRIES_FILE))?;
        Ok(script)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
