//! Plain-text rendering of a playback view.

use storyline_core::integration::{DisplayStyle, DisplayText};
use storyline_core::playback::{ChapterView, Phase, PlaybackView};
use storyline_core::prompt::Prompt;
use storyline_core::prompt_state::{AudioState, PromptState, TextPhase};
use storyline_core::story::{FinalMessage, ImagePosition};

/// The whole story as far as the recipient has got.
pub fn render_view(view: &PlaybackView) -> String {
    let mut lines = vec![format!("== {} ==", view.title)];
    if let Some(name) = view.recipient_name.as_deref() {
        lines.push(format!("For {name}"));
    }

    if view.phase == Phase::Landing {
        lines.push(String::new());
        lines.push(format!(
            "{} chapters await. Type 'start' to begin.",
            view.total_chapters
        ));
        return lines.join("\n");
    }

    for chapter in &view.chapters {
        lines.push(String::new());
        lines.extend(render_chapter(chapter));
    }

    if let Some(message) = &view.final_message {
        lines.push(String::new());
        lines.extend(render_final_message(message));
        lines.push(String::new());
        lines.push(
            if view.saved {
                "Your answers are saved."
            } else {
                "Type 'save' to keep your answers, 'export' for snapshots, or 'reset' to start over."
            }
            .to_string(),
        );
    } else if view.can_continue {
        lines.push(String::new());
        lines.push("Type 'next' to continue.".to_string());
    }

    lines.join("\n")
}

pub fn render_chapter(chapter: &ChapterView) -> Vec<String> {
    let mut lines = vec![format!("-- {} --", chapter.label)];

    let display = chapter.display.as_ref();
    match display.map(|d| &d.style) {
        Some(DisplayStyle::InlineAppend) => lines.push(format!(
            "{} {}",
            chapter.paragraph_text,
            display.map(|d| d.text.as_str()).unwrap_or_default()
        )),
        _ => lines.push(chapter.paragraph_text.clone()),
    }

    let image = chapter.image_url.as_deref().map(|url| format!("[image: {url}]"));
    if chapter.image_position == ImagePosition::BeforePrompt {
        lines.extend(image.clone());
    }
    lines.extend(render_prompt(&chapter.prompt, &chapter.state, chapter.active));
    if chapter.image_position == ImagePosition::AfterPrompt {
        lines.extend(image);
    }

    if let Some(display) = display {
        lines.extend(render_display(display));
    }
    lines
}

fn render_prompt(prompt: &Prompt, state: &PromptState, active: bool) -> Vec<String> {
    match (prompt, state) {
        (Prompt::MultipleChoice(config), PromptState::Choice(choice)) => {
            let mut lines = vec![format!("? {}", config.question)];
            let selected = choice.selected();
            lines.extend(config.options.iter().enumerate().map(|(i, option)| {
                match selected {
                    None => format!("  {}) {option}", i + 1),
                    Some(picked) if picked == option.as_str() => format!("> {}) {option}", i + 1),
                    Some(_) => format!("  {}) ({option})", i + 1),
                }
            }));
            lines
        }
        (Prompt::TextInput(config), PromptState::Text(text)) => {
            let mut lines = vec![format!("? {}", config.prompt)];
            if text.phase() != TextPhase::Submitted && active {
                let hint = if config.placeholder.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", config.placeholder)
                };
                lines.push(format!(
                    "  answer <text>, up to {} characters{hint}",
                    config.max_length
                ));
            }
            lines
        }
        (Prompt::AudioPlayback(config), PromptState::Audio(audio)) => {
            let status = match audio {
                AudioState::Awaiting => "type 'play'",
                AudioState::Unlocked { playing: true } => "playing",
                AudioState::Unlocked { playing: false } => "paused",
                AudioState::Finished => "finished",
            };
            vec![format!("[{}: {}] {status}", config.button_text, config.audio_url)]
        }
        (Prompt::ImageReveal(config), PromptState::Reveal(reveal)) => {
            if reveal.is_revealed() {
                vec![format!("[revealed: {}]", config.image_url)]
            } else {
                vec![format!("[{}] type 'reveal'", config.reveal_text)]
            }
        }
        _ => Vec::new(),
    }
}

fn render_display(display: &DisplayText) -> Vec<String> {
    match &display.style {
        DisplayStyle::Block => vec![format!("  \"{}\"", display.text)],
        DisplayStyle::Templated {
            highlight: Some(range),
        } => {
            let text = &display.text;
            vec![format!(
                "> {}*{}*{}",
                &text[..range.start],
                &text[range.clone()],
                &text[range.end..]
            )]
        }
        DisplayStyle::Templated { highlight: None } => vec![format!("> {}", display.text)],
        DisplayStyle::InlineAppend | DisplayStyle::Hidden => Vec::new(),
    }
}

fn render_final_message(message: &FinalMessage) -> Vec<String> {
    let mut lines = vec!["== The end ==".to_string()];
    lines.extend(message.content().map(String::from));
    lines.extend(message.media_url().map(|url| format!("[{}: {url}]", message.type_name())));
    lines
}

#[cfg(test)]
mod tests {
    use storyline_core::playback::PlaybackController;
    use storyline_core::progress::MemoryProgressStore;
    use storyline_core::prompt::{MultipleChoiceConfig, TextInputConfig};
    use storyline_core::prompt_state::PromptAction;
    use storyline_core::story::{PlayableChapter, PlayableStory};
    use storyline_core::types::Answers;

    use super::*;

    fn story() -> PlayableStory {
        PlayableStory {
            id: "7".into(),
            title: "Our Story".into(),
            recipient_name: Some("Sam".into()),
            occasion: None,
            final_message: Some(FinalMessage::Text {
                content: "Always".into(),
            }),
            chapters: vec![
                PlayableChapter {
                    id: "11".into(),
                    title: None,
                    paragraph_text: "We met by the water.".into(),
                    image_url: None,
                    image_position: ImagePosition::default(),
                    prompt: Prompt::MultipleChoice(MultipleChoiceConfig {
                        question: "Where was it?".into(),
                        options: vec!["the beach".into(), "a cafe".into()],
                        integration_template: "You chose [choice].".into(),
                    }),
                },
                PlayableChapter {
                    id: "12".into(),
                    title: Some("Later".into()),
                    paragraph_text: "Years passed.".into(),
                    image_url: Some("http://img.test/a.png".into()),
                    image_position: ImagePosition::AfterPrompt,
                    prompt: Prompt::TextInput(TextInputConfig {
                        prompt: "What do you remember?".into(),
                        placeholder: String::new(),
                        max_length: 50,
                        integration_template: String::new(),
                    }),
                },
            ],
        }
    }

    fn controller() -> PlaybackController<MemoryProgressStore> {
        PlaybackController::new(story(), MemoryProgressStore::new()).expect("playable")
    }

    #[test]
    fn landing_invites_start() {
        let mut c = controller();
        c.mount(None);
        let text = render_view(&c.view());
        assert!(text.starts_with("== Our Story ==\nFor Sam"));
        assert!(text.contains("2 chapters await"));
        assert!(!text.contains("We met"));
    }

    #[test]
    fn active_choice_lists_numbered_options() {
        let mut c = controller();
        c.mount(None);
        c.begin().expect("begin");
        let text = render_view(&c.view());
        assert!(text.contains("-- Chapter 1 --"));
        assert!(text.contains("  1) the beach\n  2) a cafe"));
        assert!(!text.contains("Type 'next'"));
    }

    #[test]
    fn answered_choice_shows_highlighted_template() {
        let mut c = controller();
        c.mount(None);
        c.begin().expect("begin");
        c.act(0, PromptAction::Select("a cafe".into())).expect("act");
        let text = render_view(&c.view());
        assert!(text.contains("> You chose *a cafe*."));
        assert!(text.contains("  1) (the beach)\n> 2) a cafe"));
        assert!(text.contains("Type 'next' to continue."));
    }

    #[test]
    fn text_answer_and_image_after_prompt() {
        let mut c = controller();
        c.mount(None);
        c.begin().expect("begin");
        c.act(0, PromptAction::Select("the beach".into())).expect("act");
        c.continue_story().expect("continue");
        c.act(1, PromptAction::Input("  the lighthouse ".into())).expect("input");
        c.act(1, PromptAction::Submit).expect("submit");

        let lines = render_chapter(&c.view().chapters[1]);
        assert_eq!(lines[0], "-- Later --");
        assert_eq!(lines[2], "? What do you remember?");
        assert_eq!(lines[3], "[image: http://img.test/a.png]");
        assert_eq!(lines[4], "  \"the lighthouse\"");
    }

    #[test]
    fn finished_story_shows_final_message_and_save_hint() {
        let saved: Answers = [("11", "the beach"), ("12", "by the lake")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut c = controller();
        c.mount(Some(&saved));
        let text = render_view(&c.view());
        assert!(text.contains("== The end ==\nAlways"));
        assert!(text.contains("Your answers are saved."));
        assert!(text.contains("> 1) the beach\n  2) (a cafe)"));
        assert!(!text.contains("'reset'"));
    }

    #[test]
    fn unsaved_finish_offers_reset() {
        let mut c = controller();
        c.mount(None);
        c.begin().expect("begin");
        c.act(0, PromptAction::Select("the beach".into())).expect("act");
        c.continue_story().expect("continue");
        c.act(1, PromptAction::Input("the lighthouse".into())).expect("input");
        c.act(1, PromptAction::Submit).expect("submit");
        c.continue_story().expect("finish");

        let text = render_view(&c.view());
        assert!(text.contains("== The end =="));
        assert!(text.contains("or 'reset' to start over."));
    }
}
