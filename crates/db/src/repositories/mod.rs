//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod chapter_repo;
pub mod story_completion_repo;
pub mod story_repo;

pub use chapter_repo::ChapterRepo;
pub use story_completion_repo::StoryCompletionRepo;
pub use story_repo::StoryRepo;
