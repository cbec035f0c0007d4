use crate::completion::CompletionSink;
use crate::error::CoreError;
use crate::progress::{Progress, ProgressStore};
use crate::prompt_state::{PromptAction, PromptEvent, PromptState};
use crate::story::PlayableStory;
use crate::types::Answers;

use super::view::{ChapterView, PlaybackView};
use super::{Effect, Phase, PlaybackConfig, PlaybackError};

/// Owns one recipient's pass through a story.
///
/// Every transition that changes what a reload would restore is written to
/// the [`ProgressStore`] before the in-memory state changes. Store failures
/// are logged and otherwise ignored.
pub struct PlaybackController<S> {
    story: PlayableStory,
    store: S,
    config: PlaybackConfig,
    phase: Phase,
    revealed_count: usize,
    states: Vec<PromptState>,
    answers: Answers,
    saved: bool,
    pending_ticket: Option<u64>,
    next_ticket: u64,
    torn_down: bool,
}

impl<S: ProgressStore> PlaybackController<S> {
    pub fn new(story: PlayableStory, store: S) -> Result<Self, CoreError> {
        Self::with_config(story, store, PlaybackConfig::default())
    }

    pub fn with_config(
        story: PlayableStory,
        store: S,
        config: PlaybackConfig,
    ) -> Result<Self, CoreError> {
        story.ensure_playable()?;
        let states = fresh_states(&story);
        Ok(Self {
            story,
            store,
            config,
            phase: Phase::Landing,
            revealed_count: 0,
            states,
            answers: Answers::new(),
            saved: false,
            pending_ticket: None,
            next_ticket: 0,
            torn_down: false,
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn story(&self) -> &PlayableStory {
        &self.story
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn pending_ticket(&self) -> Option<u64> {
        self.pending_ticket
    }

    pub fn prompt_state(&self, chapter_idx: usize) -> Option<&PromptState> {
        self.states.get(chapter_idx)
    }

    fn chapter_count(&self) -> usize {
        self.story.chapters.len()
    }

    /// Index of the chapter currently waiting on the recipient.
    fn active_index(&self) -> Option<usize> {
        match self.phase {
            Phase::InStory => self.revealed_count.checked_sub(1),
            Phase::Landing | Phase::Finished => None,
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Restore state on entering the story.
    ///
    /// Priority: a saved local record, then an in-progress local record,
    /// then the server-side completion, otherwise the landing page.
    pub fn mount(&mut self, server_completion: Option<&Answers>) -> Phase {
        let local = match self.store.load(&self.story.id) {
            Ok(local) => local,
            Err(e) => {
                tracing::warn!(story_id = %self.story.id, error = %e, "Progress unavailable, starting fresh");
                None
            }
        };

        match (local, server_completion) {
            (Some(progress), _) if progress.saved => {
                tracing::debug!(story_id = %self.story.id, "Restoring saved local record");
                self.restore_completed(progress.answers, true);
            }
            (Some(progress), _) if progress.revealed_count >= 1 => {
                if progress.revealed_count > self.chapter_count() {
                    tracing::debug!(story_id = %self.story.id, "Restoring finished, unsaved record");
                    self.restore_completed(progress.answers, false);
                } else {
                    tracing::debug!(
                        story_id = %self.story.id,
                        revealed_count = progress.revealed_count,
                        "Restoring in-progress record"
                    );
                    self.restore_in_progress(progress);
                }
            }
            (_, Some(answers)) => {
                tracing::debug!(story_id = %self.story.id, "Restoring server completion");
                self.restore_completed(answers.clone(), true);
            }
            _ => self.clear_memory(),
        }
        self.phase
    }

    fn restore_completed(&mut self, answers: Answers, saved: bool) {
        self.states = self
            .story
            .chapters
            .iter()
            .map(|c| PromptState::restored(&c.prompt, answers.get(&c.id).map(String::as_str)))
            .collect();
        self.answers = answers;
        self.revealed_count = self.chapter_count() + 1;
        self.phase = Phase::Finished;
        self.saved = saved;
        self.pending_ticket = None;
    }

    fn restore_in_progress(&mut self, progress: Progress) {
        let revealed = progress.revealed_count.min(self.chapter_count());
        self.states = self
            .story
            .chapters
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let answer = (idx < revealed)
                    .then(|| progress.answers.get(&c.id).map(String::as_str))
                    .flatten();
                PromptState::restored(&c.prompt, answer)
            })
            .collect();
        self.answers = progress.answers;
        self.revealed_count = revealed;
        self.phase = Phase::InStory;
        self.saved = false;
        self.pending_ticket = None;
    }

    fn clear_memory(&mut self) {
        self.states = fresh_states(&self.story);
        self.answers.clear();
        self.revealed_count = 0;
        self.phase = Phase::Landing;
        self.saved = false;
        self.pending_ticket = None;
    }

    /// Leave the landing page and reveal the first chapter.
    pub fn begin(&mut self) -> Result<(), PlaybackError> {
        if self.phase != Phase::Landing {
            return Err(PlaybackError::AlreadyStarted);
        }
        self.persist(1, &self.answers, false);
        self.revealed_count = 1;
        self.phase = Phase::InStory;
        tracing::info!(story_id = %self.story.id, "Story started");
        Ok(())
    }

    /// Feed a recipient action to a revealed chapter's prompt.
    ///
    /// Only the active chapter can trigger an advance; earlier text-input
    /// chapters may still be re-answered.
    pub fn act(
        &mut self,
        chapter_idx: usize,
        action: PromptAction,
    ) -> Result<Option<Effect>, PlaybackError> {
        if self.phase == Phase::Landing {
            return Err(PlaybackError::NotStarted);
        }
        if self.saved {
            return Err(PlaybackError::AnswersLocked);
        }
        if chapter_idx >= self.revealed_count.min(self.chapter_count()) {
            return Err(PlaybackError::ChapterNotRevealed(chapter_idx));
        }

        let mut state = self.states[chapter_idx].clone();
        let event = state.apply(action);
        let chapter_id = self.story.chapters[chapter_idx].id.clone();

        let (answer, first_answer) = match event {
            None => {
                self.states[chapter_idx] = state;
                return Ok(None);
            }
            Some(PromptEvent::Answered(answer)) => (answer, true),
            Some(PromptEvent::Reanswered(answer)) => (answer, false),
        };

        let mut answers = self.answers.clone();
        answers.insert(chapter_id.clone(), answer);
        self.persist(self.revealed_count, &answers, false);
        self.answers = answers;
        let kind = state.kind();
        self.states[chapter_idx] = state;
        tracing::debug!(story_id = %self.story.id, chapter_id = %chapter_id, "Answer recorded");

        let is_active = self.active_index() == Some(chapter_idx);
        if first_answer && is_active && self.config.auto_advances(kind) {
            self.next_ticket += 1;
            let ticket = self.next_ticket;
            self.pending_ticket = Some(ticket);
            return Ok(Some(Effect::ScheduleAdvance {
                ticket,
                delay: self.config.auto_advance_delay,
            }));
        }
        Ok(None)
    }

    /// Explicit continue from the active chapter. Supersedes any pending
    /// automatic advance.
    pub fn continue_story(&mut self) -> Result<Effect, PlaybackError> {
        let Some(idx) = self.active_index() else {
            return Err(match self.phase {
                Phase::Landing => PlaybackError::NotStarted,
                Phase::InStory | Phase::Finished => PlaybackError::AlreadyFinished,
            });
        };
        if !self.states[idx].is_advanceable() {
            return Err(PlaybackError::NotAdvanceable(idx));
        }
        self.pending_ticket = None;
        Ok(self.advance())
    }

    /// Handle an expired auto-advance timer. Stale tickets are ignored.
    pub fn fire_auto_advance(&mut self, ticket: u64) -> Option<Effect> {
        if self.torn_down || self.pending_ticket != Some(ticket) || self.phase != Phase::InStory {
            tracing::debug!(ticket, "Ignoring stale auto-advance");
            return None;
        }
        self.pending_ticket = None;
        Some(self.advance())
    }

    fn advance(&mut self) -> Effect {
        let next = self.revealed_count + 1;
        self.persist(next, &self.answers, false);
        self.revealed_count = next;
        if next > self.chapter_count() {
            self.phase = Phase::Finished;
            tracing::info!(story_id = %self.story.id, "Story finished");
            Effect::Finished
        } else {
            tracing::debug!(story_id = %self.story.id, revealed_count = next, "Chapter revealed");
            Effect::Advanced {
                revealed_count: next,
            }
        }
    }

    /// Send the answers to `sink` and mark the pass as saved.
    pub async fn save(&mut self, sink: &dyn CompletionSink) -> Result<(), PlaybackError> {
        if self.phase != Phase::Finished {
            return Err(PlaybackError::NotFinished);
        }
        sink.save_completion(&self.story.id, &self.answers).await?;
        self.persist(self.revealed_count, &self.answers, true);
        self.saved = true;
        tracing::info!(
            story_id = %self.story.id,
            answers = self.answers.len(),
            "Story completion saved"
        );
        Ok(())
    }

    /// Discard all progress and return to the landing page.
    ///
    /// A saved pass is final and cannot be reset.
    pub fn reset(&mut self) -> Result<(), PlaybackError> {
        if self.saved {
            return Err(PlaybackError::AnswersLocked);
        }
        if let Err(e) = self.store.clear(&self.story.id) {
            tracing::warn!(story_id = %self.story.id, error = %e, "Failed to clear progress");
        }
        self.clear_memory();
        tracing::info!(story_id = %self.story.id, "Story reset");
        Ok(())
    }

    /// Stop reacting to timers. Called when the player goes away.
    pub fn teardown(&mut self) {
        self.pending_ticket = None;
        self.torn_down = true;
    }

    fn persist(&self, revealed_count: usize, answers: &Answers, saved: bool) {
        let progress = Progress {
            revealed_count,
            answers: answers.clone(),
            saved,
        };
        if let Err(e) = self.store.save(&self.story.id, &progress) {
            tracing::warn!(story_id = %self.story.id, error = %e, "Failed to persist progress");
        }
    }

    // -- view ---------------------------------------------------------------

    /// Snapshot of everything a renderer needs.
    pub fn view(&self) -> PlaybackView {
        let visible = self.revealed_count.min(self.chapter_count());
        let active = self.active_index();
        let chapters = self
            .story
            .chapters
            .iter()
            .zip(&self.states)
            .take(visible)
            .enumerate()
            .map(|(index, (chapter, state))| {
                ChapterView::build(
                    index,
                    chapter,
                    state,
                    self.answers.get(&chapter.id).map(String::as_str),
                    active == Some(index),
                )
            })
            .collect();

        PlaybackView {
            story_id: self.story.id.clone(),
            title: self.story.title.clone(),
            recipient_name: self.story.recipient_name.clone(),
            phase: self.phase,
            revealed_count: self.revealed_count,
            total_chapters: self.chapter_count(),
            saved: self.saved,
            can_continue: active.is_some_and(|idx| self.states[idx].is_advanceable()),
            chapters,
            final_message: match self.phase {
                Phase::Finished => self.story.final_message.clone(),
                Phase::Landing | Phase::InStory => None,
            },
        }
    }
}

fn fresh_states(story: &PlayableStory) -> Vec<PromptState> {
    story
        .chapters
        .iter()
        .map(|c| PromptState::new(&c.prompt))
        .collect()
}
