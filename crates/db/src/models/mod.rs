//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` + `Validate` DTOs for inserts and updates
//! - Conversions into the playback types from `storyline-core`

pub mod chapter;
pub mod story;
pub mod story_completion;
