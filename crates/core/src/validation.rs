//! Shared field validators and error flattening for `validator` derives.
//!
//! The custom validators here are referenced from `#[validate(custom(...))]`
//! attributes on input DTOs in this crate and in `storyline-db`.

use std::borrow::Cow;

use validator::{ValidateUrl, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::FieldErrors;

/// Build a [`ValidationError`] with a fixed code and message.
pub fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Reject strings that are empty after trimming.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("blank", "Value cannot be blank"));
    }
    Ok(())
}

/// Every entry of a list must be non-blank.
pub fn entries_not_blank(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(field_error("blank_entry", "Option cannot be empty"));
    }
    Ok(())
}

/// Accept an empty string (treated as "cleared") or an absolute URL.
pub fn empty_or_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(field_error("url", "Must be a valid URL"))
    }
}

/// Flatten nested `validator` errors into `field.path -> messages`.
///
/// Struct nesting joins with `.`, list nesting uses `[index]`.
pub fn flatten_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect(None, errors, &mut out);
    out
}

fn collect(prefix: Option<&str>, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{p}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path).or_default();
                messages.extend(list.iter().map(message_for));
            }
            ValidationErrorsKind::Struct(inner) => collect(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect(Some(&format!("{path}[{idx}]")), inner, out);
                }
            }
        }
    }
}

fn message_for(err: &ValidationError) -> String {
    match &err.message {
        Some(msg) => msg.to_string(),
        None => format!("Invalid value ({})", err.code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(length(min = 2, message = "Too short"))]
        name: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(custom(function = "not_blank"))]
        title: String,
        #[validate(nested)]
        inner: Inner,
    }

    #[test]
    fn not_blank_rejects_whitespace() {
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
        assert!(not_blank(" a ").is_ok());
    }

    #[test]
    fn entries_not_blank_checks_each_entry() {
        assert!(entries_not_blank(&["a".into(), "b".into()]).is_ok());
        assert!(entries_not_blank(&["a".into(), " ".into()]).is_err());
    }

    #[test]
    fn empty_or_url_accepts_empty_and_urls() {
        assert!(empty_or_url("").is_ok());
        assert!(empty_or_url("https://example.com/a.png").is_ok());
        assert!(empty_or_url("not a url").is_err());
    }

    #[test]
    fn flatten_joins_nested_paths() {
        let value = Outer {
            title: " ".into(),
            inner: Inner { name: "x".into() },
        };
        let errors = value.validate().unwrap_err();
        let flat = flatten_errors(&errors);
        assert_eq!(flat["title"], vec!["Value cannot be blank".to_string()]);
        assert_eq!(flat["inner.name"], vec!["Too short".to_string()]);
    }
}
