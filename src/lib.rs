//! memeforge: turn a topic into a narrated meme video.
//!
//! Stages, in data-flow order:
//!
//! ```text
//! config ─▶ llm + script ─▶ tts ─▶ audio (merge) ─▶ video ─▶ pipeline summary
//!                                   └──── metadata (JSON / SRT) ────┘
//! ```

pub mod audio;
pub mod config;
pub mod llm;
pub mod metadata;
pub mod pipeline;
pub mod script;
pub mod tts;
pub mod video;
