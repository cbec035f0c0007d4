//! Domain core for Storyline: story model, validation, and the recipient
//! playback engine (progress, prompts, integration text, controller, export).

pub mod completion;
pub mod error;
pub mod export;
pub mod integration;
pub mod media;
pub mod playback;
pub mod progress;
pub mod prompt;
pub mod prompt_state;
pub mod slug;
pub mod story;
pub mod types;
pub mod validation;
