//! Interactive terminal loop around a playback session.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use storyline_core::export::{build_snapshots, SnapshotAspect};
use storyline_core::playback::{Effect, Phase, PlaybackController, PlaybackError, PlaybackSession};
use storyline_core::progress::FileProgressStore;
use storyline_core::prompt::Prompt;
use storyline_core::prompt_state::PromptAction;
use storyline_core::story::PlayableStory;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::client::{ApiClient, HttpCompletionSink, HttpImageSource, PublicStory};
use crate::command::{confirms, Command, HELP};
use crate::config::PlayerConfig;
use crate::render::render_view;

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Player {
    story: PlayableStory,
    session: PlaybackSession<FileProgressStore>,
    sink: HttpCompletionSink,
    images: HttpImageSource,
    export_dir: PathBuf,
    default_aspect: SnapshotAspect,
    /// Set after `reset` until the next line answers the y/N question.
    confirming_reset: bool,
}

impl Player {
    /// Fetch the story and restore any saved or in-progress pass.
    pub async fn load(
        config: &PlayerConfig,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<Effect>)> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let client = ApiClient::new(http.clone(), &config.api_url);

        let public = client
            .fetch_story(&config.slug)
            .await
            .with_context(|| format!("Failed to load story '{}'", config.slug))?;
        tracing::info!(
            story_id = %public.story.id,
            chapters = public.story.chapters.len(),
            has_completion = public.completion.is_some(),
            "Story loaded"
        );

        Self::mount(
            public,
            FileProgressStore::new(&config.progress_dir),
            client,
            http,
            config.export_dir.join(&config.slug),
            config.aspect,
        )
        .await
    }

    async fn mount(
        public: PublicStory,
        store: FileProgressStore,
        client: ApiClient,
        http: reqwest::Client,
        export_dir: PathBuf,
        default_aspect: SnapshotAspect,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<Effect>)> {
        let controller = PlaybackController::new(public.story.clone(), store)
            .context("Story cannot be played")?;
        let (session, effects) = PlaybackSession::new(controller);
        let server_answers = public.completion.map(|c| c.answers);
        session.mount(server_answers.as_ref()).await;

        let player = Self {
            story: public.story,
            session,
            sink: HttpCompletionSink::new(client),
            images: HttpImageSource::new(http),
            export_dir,
            default_aspect,
            confirming_reset: false,
        };
        Ok((player, effects))
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(mut self, mut effects: mpsc::UnboundedReceiver<Effect>) -> anyhow::Result<()> {
        self.show().await;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        break;
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                }
                Some(effect) = effects.recv() => {
                    tracing::debug!(?effect, "Timer effect");
                    self.show().await;
                }
            }
        }

        self.session.teardown().await;
        Ok(())
    }

    async fn show(&self) {
        println!("\n{}\n", render_view(&self.session.view().await));
    }

    /// One input line: either the answer to a pending reset question or a
    /// command.
    async fn handle_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        if std::mem::take(&mut self.confirming_reset) {
            if confirms(line) {
                match self.session.reset().await {
                    Ok(()) => self.show().await,
                    Err(e) => println!("{e}"),
                }
            } else {
                println!("Reset cancelled.");
            }
            return Ok(Flow::Continue);
        }

        match line.parse::<Command>() {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                println!("{e}");
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle(&mut self, command: Command) -> anyhow::Result<Flow> {
        let result = match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                println!("{HELP}");
                return Ok(Flow::Continue);
            }
            Command::Show => Ok(()),
            Command::Start => self.session.begin().await,
            Command::Choose(n) => self.choose(n).await,
            Command::Answer(text) => self.answer(text).await,
            Command::Edit { chapter, text } => self.edit(chapter - 1, text).await,
            Command::Play => self.act_on_active(PromptAction::Play).await,
            Command::Pause => self.act_on_active(PromptAction::Pause).await,
            Command::Ended => self.act_on_active(PromptAction::PlaybackEnded).await,
            Command::Reveal => self.act_on_active(PromptAction::Tap).await,
            Command::Next => self.session.continue_story().await.map(|_| ()),
            Command::Save => self.session.save(&self.sink).await,
            Command::Reset => {
                if self.session.view().await.saved {
                    println!("{}", PlaybackError::AnswersLocked);
                } else {
                    self.confirming_reset = true;
                    println!("This discards all progress on this story. Reset? [y/N]");
                }
                return Ok(Flow::Continue);
            }
            Command::Export(aspect) => {
                if let Err(e) = self.export(aspect.unwrap_or(self.default_aspect)).await {
                    tracing::error!(error = %e, "Export failed");
                    println!("Export failed: {e:#}");
                }
                return Ok(Flow::Continue);
            }
        };

        match result {
            Ok(()) => self.show().await,
            Err(e) => println!("{e}"),
        }
        Ok(Flow::Continue)
    }

    /// Index of the chapter waiting on the recipient.
    async fn active_index(&self) -> Result<usize, PlaybackError> {
        let view = self.session.view().await;
        if let Some(chapter) = view.chapters.iter().find(|c| c.active) {
            return Ok(chapter.index);
        }
        Err(match view.phase {
            Phase::Landing => PlaybackError::NotStarted,
            Phase::InStory | Phase::Finished => PlaybackError::AlreadyFinished,
        })
    }

    async fn act_on_active(&mut self, action: PromptAction) -> Result<(), PlaybackError> {
        let idx = self.active_index().await?;
        self.session.act(idx, action).await.map(|_| ())
    }

    async fn choose(&mut self, option: usize) -> Result<(), PlaybackError> {
        let idx = self.active_index().await?;
        let picked = match &self.story.chapters[idx].prompt {
            Prompt::MultipleChoice(config) => config.options.get(option - 1).cloned(),
            _ => None,
        };
        match picked {
            Some(value) => self.session.act(idx, PromptAction::Select(value)).await.map(|_| ()),
            None => {
                println!("There is no option {option} here.");
                Ok(())
            }
        }
    }

    async fn answer(&mut self, text: String) -> Result<(), PlaybackError> {
        self.act_on_active(PromptAction::Input(text)).await?;
        self.act_on_active(PromptAction::Submit).await
    }

    /// Re-answer a submitted text chapter: focus, replace, blur.
    async fn edit(&mut self, idx: usize, text: String) -> Result<(), PlaybackError> {
        self.session.act(idx, PromptAction::Focus).await?;
        self.session.act(idx, PromptAction::Input(text)).await?;
        self.session.act(idx, PromptAction::Blur).await.map(|_| ())
    }

    /// Write one PNG per chapter under the export directory.
    async fn export(&self, aspect: SnapshotAspect) -> anyhow::Result<()> {
        let (phase, answers) = {
            let controller = self.session.controller();
            let controller = controller.lock().await;
            (controller.phase(), controller.answers().clone())
        };
        if phase != Phase::Finished {
            println!("Finish the story before exporting snapshots.");
            return Ok(());
        }

        let snapshots = build_snapshots(&self.story, &answers, aspect, &self.images)
            .await
            .context("Failed to render snapshots")?;
        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.export_dir.display()))?;
        for snapshot in &snapshots {
            let path = self.export_dir.join(snapshot.file_name());
            tokio::fs::write(&path, &snapshot.png)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !snapshot.image_included {
                tracing::warn!(chapter_id = %snapshot.chapter_id, "Snapshot written without its image");
            }
        }
        tracing::info!(count = snapshots.len(), dir = %self.export_dir.display(), "Snapshots exported");
        println!(
            "Wrote {} snapshots to {}",
            snapshots.len(),
            self.export_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use storyline_core::progress::ProgressStore;
    use storyline_core::story::{FinalMessage, ImagePosition, PlayableChapter};
    use storyline_core::types::Answers;

    use super::*;
    use crate::client::PublicCompletion;

    fn public_story(completion: Option<Answers>) -> PublicStory {
        PublicStory {
            story: PlayableStory {
                id: "7".into(),
                title: "Our Story".into(),
                recipient_name: None,
                occasion: None,
                final_message: Some(FinalMessage::Text {
                    content: "Always".into(),
                }),
                chapters: vec![PlayableChapter {
                    id: "11".into(),
                    title: None,
                    paragraph_text: "We met.".into(),
                    image_url: None,
                    image_position: ImagePosition::default(),
                    prompt: Prompt::None,
                }],
            },
            completion: completion.map(|answers| PublicCompletion {
                answers,
                completed_at: chrono::Utc::now(),
            }),
        }
    }

    async fn player(dir: &std::path::Path, completion: Option<Answers>) -> Player {
        let http = reqwest::Client::new();
        let client = ApiClient::new(http.clone(), "http://127.0.0.1:9");
        let (player, _effects) = Player::mount(
            public_story(completion),
            FileProgressStore::new(dir.join("progress")),
            client,
            http,
            dir.join("exports"),
            SnapshotAspect::Portrait,
        )
        .await
        .expect("mount");
        player
    }

    async fn finished(dir: &std::path::Path) -> Player {
        let mut player = player(dir, None).await;
        player.handle_line("start").await.unwrap();
        player.handle_line("next").await.unwrap();
        assert_eq!(player.session.view().await.phase, Phase::Finished);
        player
    }

    #[tokio::test]
    async fn confirmed_reset_returns_to_landing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut player = finished(tmp.path()).await;

        player.handle_line("reset").await.unwrap();
        assert!(player.confirming_reset);
        assert_eq!(player.session.view().await.phase, Phase::Finished);

        player.handle_line("y").await.unwrap();
        assert!(!player.confirming_reset);
        assert_eq!(player.session.view().await.phase, Phase::Landing);
        let store = FileProgressStore::new(tmp.path().join("progress"));
        assert_eq!(store.load("7").unwrap(), None);
    }

    #[tokio::test]
    async fn declined_reset_keeps_progress() {
        let tmp = tempfile::tempdir().unwrap();
        let mut player = finished(tmp.path()).await;

        player.handle_line("reset").await.unwrap();
        player.handle_line("no").await.unwrap();
        assert!(!player.confirming_reset);
        assert_eq!(player.session.view().await.phase, Phase::Finished);

        // The answer line is consumed; the next line is a command again.
        player.handle_line("y").await.unwrap();
        assert_eq!(player.session.view().await.phase, Phase::Finished);
    }

    #[tokio::test]
    async fn saved_pass_never_asks_to_reset() {
        let tmp = tempfile::tempdir().unwrap();
        let saved: Answers = [("11".to_string(), "seen".to_string())].into_iter().collect();
        let mut player = player(tmp.path(), Some(saved)).await;
        assert!(player.session.view().await.saved);

        player.handle_line("reset").await.unwrap();
        assert!(!player.confirming_reset);
        player.handle_line("y").await.unwrap();
        let view = player.session.view().await;
        assert_eq!(view.phase, Phase::Finished);
        assert!(view.saved);
    }

    #[tokio::test]
    async fn quit_ends_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut player = player(tmp.path(), None).await;
        assert_eq!(player.handle_line("quit").await.unwrap(), Flow::Quit);
        assert_eq!(player.handle_line("dance").await.unwrap(), Flow::Continue);
    }
}
