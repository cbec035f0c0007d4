use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::completion::CompletionSink;
use crate::progress::ProgressStore;
use crate::prompt_state::PromptAction;
use crate::types::Answers;

use super::{Effect, Phase, PlaybackController, PlaybackError, PlaybackView};

/// Async driver around a [`PlaybackController`].
///
/// Scheduled advances run as spawned timer tasks. Each task is bound to a
/// [`CancellationToken`] that is cancelled on explicit continue, reset,
/// teardown and drop, so a stale timer can never advance the story.
/// Advances that fire from a timer are reported on the event channel.
pub struct PlaybackSession<S> {
    controller: Arc<Mutex<PlaybackController<S>>>,
    events: mpsc::UnboundedSender<Effect>,
    timer: Option<CancellationToken>,
}

impl<S: ProgressStore + 'static> PlaybackSession<S> {
    pub fn new(controller: PlaybackController<S>) -> (Self, mpsc::UnboundedReceiver<Effect>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            controller: Arc::new(Mutex::new(controller)),
            events,
            timer: None,
        };
        (session, rx)
    }

    pub async fn mount(&self, server_completion: Option<&Answers>) -> Phase {
        self.controller.lock().await.mount(server_completion)
    }

    pub async fn begin(&self) -> Result<(), PlaybackError> {
        self.controller.lock().await.begin()
    }

    pub async fn act(
        &mut self,
        chapter_idx: usize,
        action: PromptAction,
    ) -> Result<Option<Effect>, PlaybackError> {
        let effect = self.controller.lock().await.act(chapter_idx, action)?;
        if let Some(Effect::ScheduleAdvance { ticket, delay }) = &effect {
            self.schedule(*ticket, *delay);
        }
        Ok(effect)
    }

    pub async fn continue_story(&mut self) -> Result<Effect, PlaybackError> {
        let effect = self.controller.lock().await.continue_story()?;
        self.cancel_timer();
        Ok(effect)
    }

    pub async fn save(&self, sink: &dyn CompletionSink) -> Result<(), PlaybackError> {
        self.controller.lock().await.save(sink).await
    }

    /// Refused once the pass is saved; a pending advance is only cancelled
    /// when the reset goes through.
    pub async fn reset(&mut self) -> Result<(), PlaybackError> {
        self.controller.lock().await.reset()?;
        self.cancel_timer();
        Ok(())
    }

    pub async fn teardown(&mut self) {
        self.cancel_timer();
        self.controller.lock().await.teardown();
    }

    pub async fn view(&self) -> PlaybackView {
        self.controller.lock().await.view()
    }

    /// Shared handle to the underlying controller.
    pub fn controller(&self) -> Arc<Mutex<PlaybackController<S>>> {
        Arc::clone(&self.controller)
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn schedule(&mut self, ticket: u64, delay: Duration) {
        self.cancel_timer();
        let cancel = CancellationToken::new();
        self.timer = Some(cancel.clone());

        let controller = Arc::clone(&self.controller);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(ticket, "Auto-advance cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let effect = controller.lock().await.fire_auto_advance(ticket);
                    if let Some(effect) = effect {
                        if events.send(effect).is_err() {
                            tracing::debug!(ticket, "Auto-advance listener gone");
                        }
                    }
                }
            }
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl<S> Drop for PlaybackSession<S> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
