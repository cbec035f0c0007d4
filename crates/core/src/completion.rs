//! Story completion: the saved set of a recipient's answers.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{CoreError, FieldErrors};
use crate::types::Answers;

/// Where a finished pass is saved.
///
/// Implementations must behave like an upsert keyed by story id: saving the
/// same answers twice is harmless and the last write wins.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn save_completion(&self, story_id: &str, answers: &Answers) -> Result<(), CoreError>;
}

/// Check that every answer belongs to a chapter of the story and is not
/// blank.
pub fn validate_answers<'a>(
    answers: &Answers,
    chapter_ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), CoreError> {
    let known: HashSet<&str> = chapter_ids.into_iter().collect();
    let mut errors = FieldErrors::new();
    for (chapter_id, answer) in answers {
        if !known.contains(chapter_id.as_str()) {
            errors
                .entry(format!("answers.{chapter_id}"))
                .or_default()
                .push("Unknown chapter".to_string());
        } else if answer.trim().is_empty() {
            errors
                .entry(format!("answers.{chapter_id}"))
                .or_default()
                .push("Answer cannot be blank".to_string());
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn accepts_answers_for_known_chapters() {
        let result = validate_answers(&answers(&[("1", "A"), ("2", "played")]), ["1", "2", "3"]);
        assert!(result.is_ok());
    }

    #[test]
    fn empty_answer_map_is_valid() {
        assert!(validate_answers(&Answers::new(), ["1"]).is_ok());
    }

    #[test]
    fn rejects_unknown_chapters_and_blank_answers() {
        let result = validate_answers(&answers(&[("1", " "), ("9", "A")]), ["1", "2"]);
        assert_matches!(result, Err(CoreError::InvalidFields(fields)) => {
            assert_eq!(fields["answers.1"], vec!["Answer cannot be blank".to_string()]);
            assert_eq!(fields["answers.9"], vec!["Unknown chapter".to_string()]);
        });
    }
}
