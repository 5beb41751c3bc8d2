//! Prompt builder for multi-speaker dialogue generation.
//!
//! [`PromptBuilder`] produces a `(system, user)` pair for a chat-style LLM
//! call.  The system prompt fixes the output format (`NAME: line`) so the
//! response can be parsed by [`crate::script::parse_script`]; the user
//! prompt carries the per-project topic, style and cast.

use crate::config::ScriptConfig;

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const SYSTEM_INSTRUCTION: &str = "\
You are a dialogue writer specializing in generating realistic and engaging multi-speaker conversations. \
Your primary goal is to produce a clean transcript suitable for text-to-speech conversion, \
where each speaker's line is clearly identified.

Dialogue Requirements:
1. Each speaker's line MUST be prefixed with their NAME followed immediately by a colon (e.g., \"CHARACTER_NAME:\"). Do not include any spaces between the name and the colon.
2. Do NOT include any narrative descriptions, action tags (e.g., laughs, sighs), or stage directions within the dialogue itself. Only the speaker's name and their spoken words should appear.
3. Ensure the dialogue maintains the specified overall conversation style and the individual speaking styles for each character.
4. Do not include any introductory or concluding remarks outside the dialogue. The output should start directly with the first speaker's line and end with the last speaker's line.";

/// Appended to the user prompt when `direct_output` is enabled.
const DIRECT_OUTPUT_SUFFIX: &str = "IMPORTANT: Provide only the requested script content. \
Do not include explanations, reasoning, or meta-commentary. Output the script directly.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds dialogue-generation prompts from a [`ScriptConfig`].
///
/// # Example
/// ```rust,no_run
/// use memeforge::config::ProjectConfig;
/// use memeforge::llm::PromptBuilder;
///
/// let config = ProjectConfig::load_from("config.json".as_ref()).unwrap();
/// let script = config.require_script().unwrap();
/// let (system, user) = PromptBuilder::new(script).build();
/// assert!(system.contains("Dialogue Requirements"));
/// assert!(user.contains(&script.main_topic));
/// ```
pub struct PromptBuilder<'a> {
    config: &'a ScriptConfig,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(config: &'a ScriptConfig) -> Self {
        Self { config }
    }

    /// Returns `(system_prompt, user_prompt)`.
    pub fn build(&self) -> (String, String) {
        (self.system_prompt(), self.user_prompt())
    }

    /// Fixed writer rules followed by `system_prompt_extra`, if any.
    pub fn system_prompt(&self) -> String {
        let extra = self.config.system_prompt_extra.trim();
        if extra.is_empty() {
            SYSTEM_INSTRUCTION.to_string()
        } else {
            format!("{SYSTEM_INSTRUCTION}\n\n{extra}")
        }
    }

    /// Topic, style, cast and length, followed by `user_prompt_extra` and,
    /// when configured, the direct-output instruction.
    pub fn user_prompt(&self) -> String {
        let c = self.config;

        let cast = c
            .characters
            .iter()
            .map(|ch| {
                format!(
                    "- Name: {}\n\t- Role: {}\n\t- Style: {}",
                    ch.name, ch.conversational_role, ch.speaking_style
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut parts = vec![
            "Your task is to generate a natural, flowing dialogue based on the following specifications:".to_string(),
            String::new(),
            format!("Overall Conversation Style: {}", c.overall_conversation_style),
            String::new(),
            format!("Main Topic: {}", c.main_topic),
            String::new(),
            format!(
                "Characters and Their Defined Roles and Speaking Styles (if supplied):\n{cast}"
            ),
        ];

        if !c.scenario.trim().is_empty() {
            parts.push(format!(
                "\nSpecific Scenario or Context for the Dialogue:\n{}",
                c.scenario.trim()
            ));
        }

        parts.push(format!(
            "\nGenerate a complete dialogue for a conversation approximately {}.",
            c.dialogue_length
        ));

        let extra = c.user_prompt_extra.trim();
        if !extra.is_empty() {
            parts.push(format!("\n{extra}"));
        }

        if c.llm.gemini.direct_output {
            parts.push(format!("\n{DIRECT_OUTPUT_SUFFIX}"));
        }

        parts.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
