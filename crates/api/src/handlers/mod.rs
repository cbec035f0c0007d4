pub mod chapter;
pub mod completion;
pub mod export;
pub mod media;
pub mod public_story;
pub mod publish;
pub mod story;
