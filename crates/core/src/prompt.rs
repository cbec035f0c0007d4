//! Chapter prompt variants and their configuration schemas.
//!
//! A prompt is stored as two columns (`prompt_type` text + `prompt_config`
//! JSONB) but handled everywhere else as the [`Prompt`] enum, so every
//! consumer matches the variant exhaustively.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

/// Placeholder replaced by the selected option in a multiple-choice template.
pub const CHOICE_TOKEN: &str = "[choice]";

pub const DEFAULT_TEXT_MAX_LENGTH: u32 = 50;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The variant tag of a [`Prompt`] without its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    None,
    MultipleChoice,
    TextInput,
    AudioPlayback,
    ImageReveal,
}

impl PromptKind {
    /// Name used in the `prompt_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MultipleChoice => "multiple_choice",
            Self::TextInput => "text_input",
            Self::AudioPlayback => "audio_playback",
            Self::ImageReveal => "image_reveal",
        }
    }

    /// Parse from the `prompt_type` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "none" => Ok(Self::None),
            "multiple_choice" => Ok(Self::MultipleChoice),
            "text_input" => Ok(Self::TextInput),
            "audio_playback" => Ok(Self::AudioPlayback),
            "image_reveal" => Ok(Self::ImageReveal),
            other => Err(CoreError::Validation(format!(
                "Unknown prompt type '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Configs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MultipleChoiceConfig {
    #[serde(default)]
    pub question: String,
    #[validate(
        length(min = 2, max = 4, message = "Between 2 and 4 options required"),
        custom(function = "crate::validation::entries_not_blank")
    )]
    pub options: Vec<String>,
    #[serde(default)]
    pub integration_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TextInputConfig {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_max_length")]
    #[validate(range(min = 3, max = 200, message = "Max length must be between 3 and 200"))]
    pub max_length: u32,
    #[serde(default)]
    pub integration_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AudioPlaybackConfig {
    #[serde(default = "default_button_text")]
    pub button_text: String,
    #[validate(url(message = "Valid audio URL required"))]
    pub audio_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ImageRevealConfig {
    #[serde(default = "default_reveal_text")]
    pub reveal_text: String,
    #[validate(url(message = "Valid image URL required"))]
    pub image_url: String,
}

fn default_max_length() -> u32 {
    DEFAULT_TEXT_MAX_LENGTH
}

fn default_button_text() -> String {
    "Play to hear...".to_string()
}

fn default_reveal_text() -> String {
    "Tap to reveal...".to_string()
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// The interactive element attached to a chapter.
///
/// Serialized as `{"type": "...", "config": {...}}`; `none` carries no config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum Prompt {
    #[default]
    None,
    MultipleChoice(MultipleChoiceConfig),
    TextInput(TextInputConfig),
    AudioPlayback(AudioPlaybackConfig),
    ImageReveal(ImageRevealConfig),
}

impl Prompt {
    pub fn kind(&self) -> PromptKind {
        match self {
            Self::None => PromptKind::None,
            Self::MultipleChoice(_) => PromptKind::MultipleChoice,
            Self::TextInput(_) => PromptKind::TextInput,
            Self::AudioPlayback(_) => PromptKind::AudioPlayback,
            Self::ImageReveal(_) => PromptKind::ImageReveal,
        }
    }

    /// The authored integration template, if the variant has one.
    pub fn integration_template(&self) -> Option<&str> {
        match self {
            Self::MultipleChoice(c) => Some(&c.integration_template),
            Self::TextInput(c) => Some(&c.integration_template),
            Self::None | Self::AudioPlayback(_) | Self::ImageReveal(_) => None,
        }
    }

    /// Rebuild a prompt from its stored `prompt_type` / `prompt_config` pair.
    ///
    /// Missing config for a configurable variant is a validation error; a
    /// config stored alongside `none` is ignored.
    pub fn from_columns(
        prompt_type: &str,
        config: Option<serde_json::Value>,
    ) -> Result<Self, CoreError> {
        let kind = PromptKind::from_name(prompt_type)?;
        let config = config.filter(|c| !c.is_null());
        let parse_err =
            |e: serde_json::Error| CoreError::Validation(format!("Invalid {prompt_type} config: {e}"));

        match (kind, config) {
            (PromptKind::None, _) => Ok(Self::None),
            (_, None) => Err(CoreError::Validation(format!(
                "Prompt type '{prompt_type}' requires a config"
            ))),
            (PromptKind::MultipleChoice, Some(c)) => {
                serde_json::from_value(c).map(Self::MultipleChoice).map_err(parse_err)
            }
            (PromptKind::TextInput, Some(c)) => {
                serde_json::from_value(c).map(Self::TextInput).map_err(parse_err)
            }
            (PromptKind::AudioPlayback, Some(c)) => {
                serde_json::from_value(c).map(Self::AudioPlayback).map_err(parse_err)
            }
            (PromptKind::ImageReveal, Some(c)) => {
                serde_json::from_value(c).map(Self::ImageReveal).map_err(parse_err)
            }
        }
    }

    /// Split into the `prompt_type` / `prompt_config` column pair.
    pub fn to_columns(&self) -> (&'static str, Option<serde_json::Value>) {
        let config = match self {
            Self::None => None,
            Self::MultipleChoice(c) => serde_json::to_value(c).ok(),
            Self::TextInput(c) => serde_json::to_value(c).ok(),
            Self::AudioPlayback(c) => serde_json::to_value(c).ok(),
            Self::ImageReveal(c) => serde_json::to_value(c).ok(),
        };
        (self.kind().as_str(), config)
    }
}

impl Validate for Prompt {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::None => Ok(()),
            Self::MultipleChoice(c) => c.validate(),
            Self::TextInput(c) => c.validate(),
            Self::AudioPlayback(c) => c.validate(),
            Self::ImageReveal(c) => c.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::validation::flatten_errors;

    fn choice(options: &[&str]) -> Prompt {
        Prompt::MultipleChoice(MultipleChoiceConfig {
            question: "Where?".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            integration_template: String::new(),
        })
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            PromptKind::None,
            PromptKind::MultipleChoice,
            PromptKind::TextInput,
            PromptKind::AudioPlayback,
            PromptKind::ImageReveal,
        ] {
            assert_eq!(PromptKind::from_name(kind.as_str()).unwrap(), kind);
        }
        assert!(PromptKind::from_name("slider").is_err());
    }

    #[test]
    fn choice_option_count_bounds() {
        assert!(choice(&["A"]).validate().is_err());
        assert!(choice(&["A", "B"]).validate().is_ok());
        assert!(choice(&["A", "B", "C", "D"]).validate().is_ok());
        assert!(choice(&["A", "B", "C", "D", "E"]).validate().is_err());
    }

    #[test]
    fn choice_options_must_not_be_blank() {
        let errors = choice(&["A", "  "]).validate().unwrap_err();
        let flat = flatten_errors(&errors);
        assert_eq!(flat["options"], vec!["Option cannot be empty".to_string()]);
    }

    #[test]
    fn duplicate_options_are_allowed() {
        assert!(choice(&["Same", "Same"]).validate().is_ok());
    }

    #[test]
    fn text_input_defaults_and_range() {
        let cfg: TextInputConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg.max_length, DEFAULT_TEXT_MAX_LENGTH);
        assert!(cfg.validate().is_ok());

        let too_small = TextInputConfig { max_length: 2, ..cfg.clone() };
        assert!(too_small.validate().is_err());
        let too_large = TextInputConfig { max_length: 201, ..cfg };
        assert!(too_large.validate().is_err());
    }

    #[test]
    fn media_prompts_require_urls() {
        let audio = Prompt::AudioPlayback(AudioPlaybackConfig {
            button_text: "Play".into(),
            audio_url: "nope".into(),
        });
        assert!(audio.validate().is_err());

        let reveal: ImageRevealConfig =
            serde_json::from_value(json!({"image_url": "https://cdn.test/a.png"})).unwrap();
        assert_eq!(reveal.reveal_text, "Tap to reveal...");
        assert!(reveal.validate().is_ok());
    }

    #[test]
    fn serializes_as_tagged_union() {
        let value = serde_json::to_value(choice(&["A", "B"])).unwrap();
        assert_eq!(value["type"], "multiple_choice");
        assert_eq!(value["config"]["options"], json!(["A", "B"]));

        let none: Prompt = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert_eq!(none, Prompt::None);
    }

    #[test]
    fn columns_round_trip() {
        let prompt = choice(&["A", "B"]);
        let (name, config) = prompt.to_columns();
        assert_eq!(name, "multiple_choice");
        assert_eq!(Prompt::from_columns(name, config).unwrap(), prompt);

        assert_eq!(Prompt::None.to_columns(), ("none", None));
    }

    #[test]
    fn from_columns_ignores_config_for_none() {
        let prompt = Prompt::from_columns("none", Some(json!({"question": "left over"}))).unwrap();
        assert_eq!(prompt, Prompt::None);
    }

    #[test]
    fn from_columns_requires_config_for_configurable_variants() {
        assert_matches!(
            Prompt::from_columns("image_reveal", None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            Prompt::from_columns("text_input", Some(serde_json::Value::Null)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn integration_template_only_for_textual_variants() {
        assert_eq!(choice(&["A", "B"]).integration_template(), Some(""));
        assert_eq!(Prompt::None.integration_template(), None);
    }
}
