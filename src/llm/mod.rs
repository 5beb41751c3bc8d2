//! LLM module for dialogue generation.
//!
//! This module provides:
//! * [`LlmClient`]: async trait implemented by all generation backends.
//! * [`GeminiClient`]: Gemini REST `generateContent` backend.
//! * [`PromptBuilder`]: builds the dialogue-writer system/user prompts.
//! * [`LlmError`]: error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use memeforge::config::{AppSettings, ProjectConfig};
//! use memeforge::llm::{GeminiClient, LlmClient, PromptBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = AppSettings::default();
//!     let config = ProjectConfig::load_from("config.json".as_ref()).unwrap();
//!     let script = config.require_script().unwrap();
//!
//!     let client = GeminiClient::from_config(&script.llm, &settings.services).unwrap();
//!     let (system, user) = PromptBuilder::new(script).build();
//!     let dialogue = client.generate(&system, &user).await.unwrap();
//!     println!("{dialogue}");
//! }
//! ```

pub mod client;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{GeminiClient, LlmClient, LlmError};
pub use prompt::PromptBuilder;
