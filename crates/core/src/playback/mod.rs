//! Recipient playback: the controller state machine, its renderable view,
//! and the async session that drives auto-advance timers.
//!
//! The controller is synchronous and owns all playback state. Delays are
//! returned to the caller as [`Effect::ScheduleAdvance`] tickets; the
//! [`PlaybackSession`] turns those into cancellable tokio tasks.

mod controller;
mod session;
mod view;

use std::time::Duration;

use serde::Serialize;

use crate::error::CoreError;
use crate::prompt::PromptKind;

pub use controller::PlaybackController;
pub use session::PlaybackSession;
pub use view::{ChapterView, PlaybackView};

/// Pause between an answer and the automatic reveal of the next chapter.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(800);

/// Where the recipient is in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Landing,
    InStory,
    Finished,
}

/// Tunable playback policy.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Delay before an automatic advance fires.
    pub auto_advance_delay: Duration,
    /// Prompt kinds that advance on their own once answered. Every other
    /// kind waits for an explicit continue.
    pub auto_advance_kinds: Vec<PromptKind>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay: AUTO_ADVANCE_DELAY,
            auto_advance_kinds: vec![PromptKind::MultipleChoice, PromptKind::TextInput],
        }
    }
}

impl PlaybackConfig {
    pub fn auto_advances(&self, kind: PromptKind) -> bool {
        self.auto_advance_kinds.contains(&kind)
    }
}

/// Side effect the caller must carry out after a controller transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call [`PlaybackController::fire_auto_advance`] with `ticket` after
    /// `delay`, unless cancelled first.
    ScheduleAdvance { ticket: u64, delay: Duration },
    /// Another chapter was revealed.
    Advanced { revealed_count: usize },
    /// The last chapter was left and the final message is showing.
    Finished,
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Story has not been started")]
    NotStarted,

    #[error("Story is already in progress")]
    AlreadyStarted,

    #[error("Story is already finished")]
    AlreadyFinished,

    #[error("Chapter {0} has not been revealed")]
    ChapterNotRevealed(usize),

    #[error("Chapter {0} must be answered before continuing")]
    NotAdvanceable(usize),

    #[error("Story is not finished yet")]
    NotFinished,

    #[error("Answers are final once saved")]
    AnswersLocked,

    #[error("Failed to save completion: {0}")]
    Completion(#[from] CoreError),
}
