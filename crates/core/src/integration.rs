//! Answer integration: turns a recipient's answer into the text shown
//! inside the chapter.
//!
//! Rendering is a pure function of (prompt kind, template, answer). Only
//! multiple-choice answers are woven into authored prose; free-form
//! text-input answers are always shown verbatim.

use std::ops::Range;

use serde::Serialize;

use crate::prompt::{Prompt, PromptKind, CHOICE_TOKEN};

/// How a rendered answer should be presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum DisplayStyle {
    /// Text-input answer shown as its own block.
    Block,
    /// Template with the answer substituted. `highlight` is the byte range
    /// of the substituted answer (emphasised); `None` when the template had
    /// no placeholder.
    Templated { highlight: Option<Range<usize>> },
    /// Multiple-choice answer without a template, appended inline to the
    /// chapter paragraph.
    InlineAppend,
    /// Completion token for non-textual prompts; not shown as prose.
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayText {
    pub text: String,
    #[serde(flatten)]
    pub style: DisplayStyle,
}

impl DisplayText {
    /// Whether this text is meant to be shown to the recipient.
    pub fn is_visible(&self) -> bool {
        !matches!(self.style, DisplayStyle::Hidden)
    }

    /// The emphasised span, if any.
    pub fn highlighted(&self) -> Option<&str> {
        match &self.style {
            DisplayStyle::Templated {
                highlight: Some(range),
            } => self.text.get(range.clone()),
            _ => None,
        }
    }
}

/// Render `answer` for a prompt of `kind` with an optional authored
/// `template`.
pub fn render(kind: PromptKind, template: Option<&str>, answer: &str) -> DisplayText {
    match kind {
        PromptKind::TextInput => DisplayText {
            text: answer.to_string(),
            style: DisplayStyle::Block,
        },
        PromptKind::MultipleChoice => render_choice(template, answer),
        PromptKind::AudioPlayback | PromptKind::ImageReveal | PromptKind::None => DisplayText {
            text: answer.to_string(),
            style: DisplayStyle::Hidden,
        },
    }
}

/// [`render`] using the kind and template carried by `prompt`.
pub fn render_for(prompt: &Prompt, answer: &str) -> DisplayText {
    render(prompt.kind(), prompt.integration_template(), answer)
}

fn render_choice(template: Option<&str>, answer: &str) -> DisplayText {
    let template = template.map(str::trim).unwrap_or_default();
    if template.is_empty() {
        return DisplayText {
            text: answer.to_string(),
            style: DisplayStyle::InlineAppend,
        };
    }

    match template.find(CHOICE_TOKEN) {
        Some(start) => {
            let mut text = String::with_capacity(template.len() + answer.len());
            text.push_str(&template[..start]);
            text.push_str(answer);
            text.push_str(&template[start + CHOICE_TOKEN.len()..]);
            DisplayText {
                text,
                style: DisplayStyle::Templated {
                    highlight: Some(start..start + answer.len()),
                },
            }
        }
        None => DisplayText {
            text: template.to_string(),
            style: DisplayStyle::Templated { highlight: None },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::MultipleChoiceConfig;

    #[test]
    fn substitutes_first_choice_token() {
        let out = render(
            PromptKind::MultipleChoice,
            Some("You chose [choice] and..."),
            "the beach",
        );
        assert_eq!(out.text, "You chose the beach and...");
        assert_eq!(out.highlighted(), Some("the beach"));
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let out = render(PromptKind::MultipleChoice, Some("[choice] or [choice]"), "A");
        assert_eq!(out.text, "A or [choice]");
        assert_eq!(out.highlighted(), Some("A"));
    }

    #[test]
    fn template_without_token_is_returned_unchanged() {
        let out = render(PromptKind::MultipleChoice, Some("Always and forever"), "anything");
        assert_eq!(out.text, "Always and forever");
        assert_eq!(out.style, DisplayStyle::Templated { highlight: None });
        assert_eq!(out.highlighted(), None);
    }

    #[test]
    fn choice_without_template_appends_inline() {
        for template in [None, Some(""), Some("   ")] {
            let out = render(PromptKind::MultipleChoice, template, "B");
            assert_eq!(out.text, "B");
            assert_eq!(out.style, DisplayStyle::InlineAppend);
        }
    }

    #[test]
    fn text_input_never_applies_template() {
        let out = render(PromptKind::TextInput, Some("You said [response]"), "Hello");
        assert_eq!(out.text, "Hello");
        assert_eq!(out.style, DisplayStyle::Block);
    }

    #[test]
    fn non_textual_prompts_are_hidden() {
        let played = render(PromptKind::AudioPlayback, None, "played");
        assert!(!played.is_visible());
        assert_eq!(played.text, "played");
        assert!(!render(PromptKind::ImageReveal, None, "revealed").is_visible());
    }

    #[test]
    fn rendering_is_idempotent_and_pure() {
        let template = String::from("You picked [choice]!");
        let answer = String::from("A");
        let first = render(PromptKind::MultipleChoice, Some(&template), &answer);
        let second = render(PromptKind::MultipleChoice, Some(&template), &answer);
        assert_eq!(first, second);
        assert_eq!(template, "You picked [choice]!");
        assert_eq!(answer, "A");
    }

    #[test]
    fn render_for_reads_prompt_template() {
        let prompt = Prompt::MultipleChoice(MultipleChoiceConfig {
            question: String::new(),
            options: vec!["A".into(), "B".into()],
            integration_template: "You picked [choice]!".into(),
        });
        assert_eq!(render_for(&prompt, "A").text, "You picked A!");
    }
}
