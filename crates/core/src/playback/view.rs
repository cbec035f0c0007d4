use serde::Serialize;

use crate::integration::{render_for, DisplayText};
use crate::prompt::Prompt;
use crate::prompt_state::PromptState;
use crate::story::{FinalMessage, ImagePosition, PlayableChapter};

use super::Phase;

/// A revealed chapter as a renderer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterView {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub paragraph_text: String,
    pub image_url: Option<String>,
    pub image_position: ImagePosition,
    pub prompt: Prompt,
    pub state: PromptState,
    pub answer: Option<String>,
    /// Integration text for the answer, once there is one.
    pub display: Option<DisplayText>,
    /// The chapter currently waiting on the recipient.
    pub active: bool,
}

impl ChapterView {
    pub(super) fn build(
        index: usize,
        chapter: &PlayableChapter,
        state: &PromptState,
        answer: Option<&str>,
        active: bool,
    ) -> Self {
        Self {
            index,
            id: chapter.id.clone(),
            label: chapter.label(index),
            paragraph_text: chapter.paragraph_text.clone(),
            image_url: chapter.image_url.clone(),
            image_position: chapter.image_position,
            prompt: chapter.prompt.clone(),
            state: state.clone(),
            answer: answer.map(String::from),
            display: answer.map(|a| render_for(&chapter.prompt, a)),
            active,
        }
    }
}

/// Serializable snapshot of a playback controller.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackView {
    pub story_id: String,
    pub title: String,
    pub recipient_name: Option<String>,
    pub phase: Phase,
    pub revealed_count: usize,
    pub total_chapters: usize,
    pub saved: bool,
    /// Whether an explicit continue would be accepted right now.
    pub can_continue: bool,
    pub chapters: Vec<ChapterView>,
    /// Present only once the story is finished.
    pub final_message: Option<FinalMessage>,
}
