//! Line commands typed by the recipient.

use std::str::FromStr;

use storyline_core::export::SnapshotAspect;

use crate::config::parse_aspect;

pub const HELP: &str = "\
Commands:
  start                 open the story
  choose <n>            pick option n of the current question
  answer <text>         type and submit an answer
  edit <chapter> <text> change an earlier typed answer
  play | pause | ended  control the current audio clip
  reveal                uncover the current image
  next                  continue to the next chapter
  save                  save your answers
  export [aspect]       write chapter snapshots (portrait or square)
  reset                 forget progress and start over (asks first)
  show                  print the story so far
  help                  this list
  quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// 1-based option number.
    Choose(usize),
    Answer(String),
    /// Edit the typed answer of a 1-based chapter number.
    Edit { chapter: usize, text: String },
    Play,
    Pause,
    Ended,
    Reveal,
    Next,
    Save,
    Export(Option<SnapshotAspect>),
    Reset,
    Show,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Type a command, or 'help' for the list")]
    Empty,

    #[error("Unknown command '{0}', type 'help' for the list")]
    Unknown(String),

    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),

    #[error("'{0}' is not a number from 1 up")]
    InvalidNumber(String),

    #[error("{0}")]
    InvalidAspect(String),
}

fn number(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CommandError::InvalidNumber(raw.to_string())),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "start" | "begin" => Ok(Self::Start),
            "choose" | "c" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("choose", "an option number"));
                }
                number(rest).map(Self::Choose)
            }
            "answer" | "a" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("answer", "some text"));
                }
                Ok(Self::Answer(rest.to_string()))
            }
            "edit" => {
                let (chapter, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::MissingArgument("edit", "a chapter number and text"))?;
                Ok(Self::Edit {
                    chapter: number(chapter)?,
                    text: text.trim().to_string(),
                })
            }
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "ended" => Ok(Self::Ended),
            "reveal" | "tap" => Ok(Self::Reveal),
            "next" | "n" | "continue" => Ok(Self::Next),
            "save" => Ok(Self::Save),
            "export" => {
                if rest.is_empty() {
                    return Ok(Self::Export(None));
                }
                parse_aspect(rest)
                    .map(|aspect| Self::Export(Some(aspect)))
                    .map_err(CommandError::InvalidAspect)
            }
            "reset" => Ok(Self::Reset),
            "show" | "s" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Whether a line answers a y/N question with yes.
pub fn confirms(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
