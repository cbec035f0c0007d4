//! Story-level domain types: final message, chapter image placement, the
//! playable (recipient-facing) view of a story, and publish readiness.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationErrors};

use crate::error::CoreError;
use crate::prompt::Prompt;
use crate::validation::field_error;

/// Maximum number of chapters per story.
pub const MAX_CHAPTERS: usize = 10;

// ---------------------------------------------------------------------------
// Final message
// ---------------------------------------------------------------------------

/// What the recipient sees after the last chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinalMessage {
    Text { content: String },
    Image { media_url: String },
    Video { media_url: String },
    /// Text and media together.
    Combination { content: String, media_url: String },
}

impl FinalMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Combination { .. } => "combination",
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text { content } | Self::Combination { content, .. } => Some(content),
            Self::Image { .. } | Self::Video { .. } => None,
        }
    }

    pub fn media_url(&self) -> Option<&str> {
        match self {
            Self::Image { media_url }
            | Self::Video { media_url }
            | Self::Combination { media_url, .. } => Some(media_url),
            Self::Text { .. } => None,
        }
    }

    /// Rebuild from the three `final_message_*` columns.
    ///
    /// Returns `Ok(None)` when no type is configured. Columns that do not
    /// fit the stored type are reported rather than silently dropped.
    pub fn from_columns(
        message_type: Option<&str>,
        content: Option<String>,
        media_url: Option<String>,
    ) -> Result<Option<Self>, CoreError> {
        let Some(message_type) = message_type else {
            return Ok(None);
        };
        let missing = |field: &str| {
            CoreError::Validation(format!(
                "Final message of type '{message_type}' is missing {field}"
            ))
        };
        let message = match message_type {
            "text" => Self::Text {
                content: content.ok_or_else(|| missing("content"))?,
            },
            "image" => Self::Image {
                media_url: media_url.ok_or_else(|| missing("media_url"))?,
            },
            "video" => Self::Video {
                media_url: media_url.ok_or_else(|| missing("media_url"))?,
            },
            "combination" => Self::Combination {
                content: content.ok_or_else(|| missing("content"))?,
                media_url: media_url.ok_or_else(|| missing("media_url"))?,
            },
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown final message type '{other}'"
                )))
            }
        };
        Ok(Some(message))
    }
}

impl Validate for FinalMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(content) = self.content() {
            if content.trim().is_empty() {
                errors.add("content", field_error("required", "Message text is required"));
            }
        }
        if let Some(url) = self.media_url() {
            if !url.validate_url() {
                errors.add("media_url", field_error("required", "Media file is required"));
            }
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Chapter image placement
// ---------------------------------------------------------------------------

/// Whether a chapter's decorative image shows before or after the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePosition {
    #[default]
    BeforePrompt,
    AfterPrompt,
}

impl ImagePosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforePrompt => "before_prompt",
            Self::AfterPrompt => "after_prompt",
        }
    }

    /// Parse from the `image_position` column; unknown values fall back to
    /// the default placement.
    pub fn from_name(name: &str) -> Self {
        match name {
            "after_prompt" => Self::AfterPrompt,
            _ => Self::BeforePrompt,
        }
    }
}

// ---------------------------------------------------------------------------
// Playable view
// ---------------------------------------------------------------------------

/// A chapter as delivered to the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableChapter {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub paragraph_text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_position: ImagePosition,
    #[serde(default)]
    pub prompt: Prompt,
}

impl PlayableChapter {
    /// Heading shown above the chapter: the trimmed title, or `Chapter N`
    /// using the 0-based `index`.
    pub fn label(&self, index: usize) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Chapter {}", index + 1),
        }
    }
}

/// A published story as delivered to the recipient, chapters in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableStory {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub final_message: Option<FinalMessage>,
    pub chapters: Vec<PlayableChapter>,
}

impl PlayableStory {
    /// A story can only be played when it has at least one chapter.
    pub fn ensure_playable(&self) -> Result<(), CoreError> {
        if self.chapters.is_empty() {
            return Err(CoreError::Validation(format!(
                "Story '{}' has no chapters to play",
                self.id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Publish readiness
// ---------------------------------------------------------------------------

/// Check the completeness rules a story must meet before it is published.
///
/// `paragraphs` are the chapter paragraph texts in order.
pub fn check_publishable<'a>(
    paragraphs: impl IntoIterator<Item = &'a str>,
    final_message: Option<&FinalMessage>,
) -> Result<(), CoreError> {
    let mut count = 0usize;
    let mut missing_paragraph = false;
    for text in paragraphs {
        count += 1;
        missing_paragraph |= text.trim().is_empty();
    }

    if count == 0 {
        return Err(CoreError::Validation(
            "Add at least one chapter before publishing".to_string(),
        ));
    }
    if missing_paragraph {
        return Err(CoreError::Validation(
            "All chapters must have paragraph text".to_string(),
        ));
    }
    if final_message.is_none() {
        return Err(CoreError::Validation(
            "Configure a final message before publishing".to_string(),
        ));
    }
    Ok(())
}

/// Reject chapter creation once a story holds [`MAX_CHAPTERS`].
pub fn validate_chapter_capacity(existing: usize) -> Result<(), CoreError> {
    if existing >= MAX_CHAPTERS {
        return Err(CoreError::Validation(format!(
            "A story can have at most {MAX_CHAPTERS} chapters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn text(content: &str) -> FinalMessage {
        FinalMessage::Text {
            content: content.to_string(),
        }
    }

    #[test]
    fn final_message_columns_round_trip() {
        let msg = FinalMessage::Combination {
            content: "Love you".into(),
            media_url: "https://cdn.test/a.png".into(),
        };
        let parsed = FinalMessage::from_columns(
            Some(msg.type_name()),
            msg.content().map(String::from),
            msg.media_url().map(String::from),
        )
        .unwrap();
        assert_eq!(parsed, Some(msg));
    }

    #[test]
    fn final_message_absent_when_unconfigured() {
        assert_eq!(FinalMessage::from_columns(None, Some("x".into()), None).unwrap(), None);
    }

    #[test]
    fn final_message_missing_column_is_reported() {
        assert_matches!(
            FinalMessage::from_columns(Some("image"), None, None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            FinalMessage::from_columns(Some("hologram"), None, None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn final_message_validation() {
        assert!(text("Hello").validate().is_ok());
        assert!(text("   ").validate().is_err());
        let bad_media = FinalMessage::Image {
            media_url: "not-a-url".into(),
        };
        assert!(bad_media.validate().is_err());
    }

    #[test]
    fn chapter_label_falls_back_to_ordinal() {
        let mut chapter = PlayableChapter {
            id: "c1".into(),
            title: Some("  ".into()),
            paragraph_text: "Once".into(),
            image_url: None,
            image_position: ImagePosition::default(),
            prompt: Prompt::None,
        };
        assert_eq!(chapter.label(0), "Chapter 1");
        chapter.title = Some(" The Beach ".into());
        assert_eq!(chapter.label(4), "The Beach");
    }

    #[test]
    fn image_position_defaults_to_before_prompt() {
        assert_eq!(ImagePosition::from_name("sideways"), ImagePosition::BeforePrompt);
        assert_eq!(ImagePosition::from_name("after_prompt"), ImagePosition::AfterPrompt);
    }

    #[test]
    fn publish_requires_chapters_paragraphs_and_final_message() {
        let msg = text("The end");
        assert!(check_publishable(Vec::<&str>::new(), Some(&msg)).is_err());
        assert!(check_publishable(["One", "  "], Some(&msg)).is_err());
        assert!(check_publishable(["One"], None).is_err());
        assert!(check_publishable(["One", "Two"], Some(&msg)).is_ok());
    }

    #[test]
    fn chapter_capacity_is_bounded() {
        assert!(validate_chapter_capacity(MAX_CHAPTERS - 1).is_ok());
        assert!(validate_chapter_capacity(MAX_CHAPTERS).is_err());
    }

    #[test]
    fn empty_story_is_not_playable() {
        let story = PlayableStory {
            id: "S1".into(),
            title: "Ours".into(),
            recipient_name: None,
            occasion: None,
            final_message: None,
            chapters: vec![],
        };
        assert!(story.ensure_playable().is_err());
    }
}
