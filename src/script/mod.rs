//! Script generation, parsing and persistence.
//!
//! * [`ScriptGenerator`] asks an [`LlmClient`](crate::llm::LlmClient) for a
//!   dialogue and parses it.
//! * [`parse_script`] / [`validate_script_format`] turn `NAME: line` text
//!   into [`ScriptEntry`] records.
//! * [`load_auto`] and friends read dialogue, numbered and JSON script files.

pub mod generator;
pub mod model;
pub mod parser;
pub mod repository;

pub use generator::{ScriptGenerator, SCRIPT_ENTRIES_FILE};
pub use model::{Script, ScriptEntry};
pub use parser::{parse_script, validate_script_format, ScriptError};
pub use repository::{load_auto, load_dialogue_file, load_json_file, load_numbered_file, save_json};
