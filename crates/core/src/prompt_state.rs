//! Per-chapter prompt state machines.
//!
//! Each variant exposes the same contract: recipient actions go in, and at
//! most one [`PromptEvent::Answered`] comes out per chapter. Text input may
//! additionally emit [`PromptEvent::Reanswered`] while the answer is being
//! edited. Actions that do not fit the current state are ignored.

use serde::Serialize;

use crate::prompt::{Prompt, PromptKind};

/// Answer recorded when an audio prompt is first played.
pub const PLAYED: &str = "played";

/// Answer recorded when an image-reveal prompt is tapped.
pub const REVEALED: &str = "revealed";

/// Recipient interaction with the active chapter's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    Select(String),
    Input(String),
    Submit,
    Focus,
    Blur,
    Play,
    Pause,
    PlaybackEnded,
    Tap,
}

/// Emitted when a prompt produces (or revises) its canonical answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Answered(String),
    Reanswered(String),
}

// ---------------------------------------------------------------------------
// Multiple choice
// ---------------------------------------------------------------------------

/// `awaiting -> locked_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceState {
    options: Vec<String>,
    selected: Option<String>,
}

impl ChoiceState {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.selected.is_some()
    }

    /// Lock in `option`. Ignored once locked or when `option` is not one of
    /// the configured options.
    pub fn select(&mut self, option: &str) -> Option<PromptEvent> {
        if self.selected.is_some() || !self.options.iter().any(|o| o == option) {
            return None;
        }
        self.selected = Some(option.to_string());
        Some(PromptEvent::Answered(option.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Text input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPhase {
    Awaiting,
    Submitted,
    Editing,
}

/// `awaiting -> submitted -> editing -> submitted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInputState {
    phase: TextPhase,
    max_length: usize,
    draft: String,
    answer: Option<String>,
}

impl TextInputState {
    pub fn new(max_length: usize) -> Self {
        Self {
            phase: TextPhase::Awaiting,
            max_length,
            draft: String::new(),
            answer: None,
        }
    }

    pub fn phase(&self) -> TextPhase {
        self.phase
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Replace the draft, truncated to `max_length` characters. Only
    /// accepted while awaiting or editing.
    pub fn input(&mut self, value: &str) {
        if self.phase == TextPhase::Submitted {
            return;
        }
        self.draft = value.chars().take(self.max_length).collect();
    }

    /// Submit the draft. Blank drafts are rejected and a second submit is a
    /// no-op.
    pub fn submit(&mut self) -> Option<PromptEvent> {
        if self.phase != TextPhase::Awaiting {
            return None;
        }
        let trimmed = self.draft.trim();
        if trimmed.is_empty() {
            return None;
        }
        let answer = trimmed.to_string();
        self.phase = TextPhase::Submitted;
        self.answer = Some(answer.clone());
        Some(PromptEvent::Answered(answer))
    }

    /// Re-focusing a submitted answer starts editing it.
    pub fn focus(&mut self) {
        if self.phase == TextPhase::Submitted {
            self.phase = TextPhase::Editing;
        }
    }

    /// Leave editing. A blank draft reverts to the previous answer; a
    /// changed one is reported as a re-answer.
    pub fn blur(&mut self) -> Option<PromptEvent> {
        if self.phase != TextPhase::Editing {
            return None;
        }
        self.phase = TextPhase::Submitted;
        let trimmed = self.draft.trim().to_string();
        if trimmed.is_empty() {
            self.draft = self.answer.clone().unwrap_or_default();
            return None;
        }
        if self.answer.as_deref() == Some(trimmed.as_str()) {
            return None;
        }
        self.answer = Some(trimmed.clone());
        Some(PromptEvent::Reanswered(trimmed))
    }
}

// ---------------------------------------------------------------------------
// Audio playback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AudioState {
    Awaiting,
    /// Answered on first play; playback may be paused and resumed.
    Unlocked { playing: bool },
    /// The clip ran to its natural end. Cosmetic only.
    Finished,
}

impl AudioState {
    pub fn is_unlocked(self) -> bool {
        !matches!(self, Self::Awaiting)
    }

    pub fn play(&mut self) -> Option<PromptEvent> {
        match self {
            Self::Awaiting => {
                *self = Self::Unlocked { playing: true };
                Some(PromptEvent::Answered(PLAYED.to_string()))
            }
            Self::Unlocked { playing } => {
                *playing = true;
                None
            }
            Self::Finished => {
                *self = Self::Unlocked { playing: true };
                None
            }
        }
    }

    pub fn pause(&mut self) {
        if let Self::Unlocked { playing } = self {
            *playing = false;
        }
    }

    pub fn ended(&mut self) {
        if self.is_unlocked() {
            *self = Self::Finished;
        }
    }
}

// ---------------------------------------------------------------------------
// Image reveal
// ---------------------------------------------------------------------------

/// `awaiting -> revealed`, one way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevealState {
    revealed: bool,
}

impl RevealState {
    pub fn is_revealed(self) -> bool {
        self.revealed
    }

    pub fn tap(&mut self) -> Option<PromptEvent> {
        if self.revealed {
            return None;
        }
        self.revealed = true;
        Some(PromptEvent::Answered(REVEALED.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The state machine for one chapter, chosen by its prompt variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum PromptState {
    None,
    Choice(ChoiceState),
    Text(TextInputState),
    Audio(AudioState),
    Reveal(RevealState),
}

impl PromptState {
    /// Fresh, unanswered state for `prompt`.
    pub fn new(prompt: &Prompt) -> Self {
        match prompt {
            Prompt::None => Self::None,
            Prompt::MultipleChoice(c) => Self::Choice(ChoiceState::new(c.options.clone())),
            Prompt::TextInput(c) => Self::Text(TextInputState::new(c.max_length as usize)),
            Prompt::AudioPlayback(_) => Self::Audio(AudioState::Awaiting),
            Prompt::ImageReveal(_) => Self::Reveal(RevealState::default()),
        }
    }

    /// State for `prompt` rebuilt from a stored answer. Without an answer
    /// this is the same as [`PromptState::new`].
    ///
    /// A stored choice is trusted even if the option list has since changed.
    pub fn restored(prompt: &Prompt, answer: Option<&str>) -> Self {
        let mut state = Self::new(prompt);
        let Some(answer) = answer else {
            return state;
        };
        match &mut state {
            Self::None => {}
            Self::Choice(c) => c.selected = Some(answer.to_string()),
            Self::Text(t) => {
                t.phase = TextPhase::Submitted;
                t.draft = answer.to_string();
                t.answer = Some(answer.to_string());
            }
            Self::Audio(a) => *a = AudioState::Unlocked { playing: false },
            Self::Reveal(r) => r.revealed = true,
        }
        state
    }

    pub fn kind(&self) -> PromptKind {
        match self {
            Self::None => PromptKind::None,
            Self::Choice(_) => PromptKind::MultipleChoice,
            Self::Text(_) => PromptKind::TextInput,
            Self::Audio(_) => PromptKind::AudioPlayback,
            Self::Reveal(_) => PromptKind::ImageReveal,
        }
    }

    pub fn is_answered(&self) -> bool {
        match self {
            Self::None => false,
            Self::Choice(c) => c.is_locked(),
            Self::Text(t) => t.answer.is_some(),
            Self::Audio(a) => a.is_unlocked(),
            Self::Reveal(r) => r.is_revealed(),
        }
    }

    /// Whether the chapter may be left: answered, or no prompt at all.
    pub fn is_advanceable(&self) -> bool {
        matches!(self, Self::None) || self.is_answered()
    }

    /// Feed one recipient action. Actions that do not belong to this
    /// variant are ignored.
    pub fn apply(&mut self, action: PromptAction) -> Option<PromptEvent> {
        match (self, action) {
            (Self::Choice(c), PromptAction::Select(option)) => c.select(&option),
            (Self::Text(t), PromptAction::Input(value)) => {
                t.input(&value);
                None
            }
            (Self::Text(t), PromptAction::Submit) => t.submit(),
            (Self::Text(t), PromptAction::Focus) => {
                t.focus();
                None
            }
            (Self::Text(t), PromptAction::Blur) => t.blur(),
            (Self::Audio(a), PromptAction::Play) => a.play(),
            (Self::Audio(a), PromptAction::Pause) => {
                a.pause();
                None
            }
            (Self::Audio(a), PromptAction::PlaybackEnded) => {
                a.ended();
                None
            }
            (Self::Reveal(r), PromptAction::Tap) => r.tap(),
            (state, action) => {
                tracing::debug!(kind = ?state.kind(), ?action, "Ignoring action for prompt");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{MultipleChoiceConfig, TextInputConfig};

    fn text_prompt(max_length: u32) -> Prompt {
        Prompt::TextInput(TextInputConfig {
            prompt: String::new(),
            placeholder: String::new(),
            max_length,
            integration_template: String::new(),
        })
    }

    #[test]
    fn choice_locks_in_exactly_once() {
        let mut state = ChoiceState::new(vec!["A".into(), "B".into()]);
        assert_eq!(state.select("A"), Some(PromptEvent::Answered("A".into())));
        assert_eq!(state.select("B"), None);
        assert_eq!(state.select("A"), None);
        assert_eq!(state.selected(), Some("A"));
    }

    #[test]
    fn choice_ignores_unknown_option() {
        let mut state = ChoiceState::new(vec!["A".into(), "B".into()]);
        assert_eq!(state.select("Z"), None);
        assert!(!state.is_locked());
    }

    #[test]
    fn text_rejects_blank_submit() {
        let mut state = TextInputState::new(50);
        assert_eq!(state.submit(), None);
        state.input("   ");
        assert_eq!(state.submit(), None);
        assert_eq!(state.phase(), TextPhase::Awaiting);
        assert_eq!(state.answer(), None);
    }

    #[test]
    fn text_submit_trims_and_guards_double_submit() {
        let mut state = TextInputState::new(50);
        state.input("  Hello ");
        assert_eq!(state.submit(), Some(PromptEvent::Answered("Hello".into())));
        assert_eq!(state.submit(), None);
        state.input("changed");
        assert_eq!(state.draft(), "  Hello ");
    }

    #[test]
    fn text_edit_to_blank_reverts() {
        let mut state = TextInputState::new(50);
        state.input("Hello");
        state.submit();
        state.focus();
        assert_eq!(state.phase(), TextPhase::Editing);
        state.input("");
        assert_eq!(state.blur(), None);
        assert_eq!(state.phase(), TextPhase::Submitted);
        assert_eq!(state.answer(), Some("Hello"));
        assert_eq!(state.draft(), "Hello");
    }

    #[test]
    fn text_edit_emits_reanswer() {
        let mut state = TextInputState::new(50);
        state.input("Hello");
        state.submit();
        state.focus();
        state.input("Hello there");
        assert_eq!(state.blur(), Some(PromptEvent::Reanswered("Hello there".into())));
        assert_eq!(state.answer(), Some("Hello there"));

        state.focus();
        assert_eq!(state.blur(), None, "unchanged edit is not a re-answer");
    }

    #[test]
    fn text_draft_is_truncated_to_max_length() {
        let mut state = TextInputState::new(3);
        state.input("abcdef");
        assert_eq!(state.draft(), "abc");
        state.input("héllo");
        assert_eq!(state.draft(), "hél");
    }

    #[test]
    fn focus_before_submit_does_not_edit() {
        let mut state = TextInputState::new(50);
        state.focus();
        assert_eq!(state.phase(), TextPhase::Awaiting);
        assert_eq!(state.blur(), None);
    }

    #[test]
    fn audio_answers_on_first_play_only() {
        let mut state = AudioState::Awaiting;
        assert_eq!(state.play(), Some(PromptEvent::Answered(PLAYED.into())));
        state.pause();
        assert_eq!(state, AudioState::Unlocked { playing: false });
        assert_eq!(state.play(), None);
        state.ended();
        assert_eq!(state, AudioState::Finished);
        assert_eq!(state.play(), None);
    }

    #[test]
    fn audio_end_before_play_is_ignored() {
        let mut state = AudioState::Awaiting;
        state.ended();
        assert_eq!(state, AudioState::Awaiting);
    }

    #[test]
    fn reveal_is_one_way() {
        let mut state = RevealState::default();
        assert_eq!(state.tap(), Some(PromptEvent::Answered(REVEALED.into())));
        assert_eq!(state.tap(), None);
        assert!(state.is_revealed());
    }

    #[test]
    fn none_is_advanceable_without_answer() {
        let state = PromptState::new(&Prompt::None);
        assert!(!state.is_answered());
        assert!(state.is_advanceable());
    }

    #[test]
    fn mismatched_actions_are_ignored() {
        let mut state = PromptState::new(&text_prompt(50));
        assert_eq!(state.apply(PromptAction::Tap), None);
        assert_eq!(state.apply(PromptAction::Select("A".into())), None);
        assert!(!state.is_answered());
    }

    #[test]
    fn restored_states_are_terminal() {
        let choice = Prompt::MultipleChoice(MultipleChoiceConfig {
            question: String::new(),
            options: vec!["A".into(), "B".into()],
            integration_template: String::new(),
        });
        let mut state = PromptState::restored(&choice, Some("B"));
        assert!(state.is_answered());
        assert_eq!(state.apply(PromptAction::Select("A".into())), None);

        let mut text = PromptState::restored(&text_prompt(50), Some("Hi"));
        assert_eq!(text.apply(PromptAction::Submit), None);
        text.apply(PromptAction::Focus);
        text.apply(PromptAction::Input("Hey".into()));
        assert_eq!(text.apply(PromptAction::Blur), Some(PromptEvent::Reanswered("Hey".into())));

        let unanswered = PromptState::restored(&choice, None);
        assert!(!unanswered.is_answered());
    }
}
