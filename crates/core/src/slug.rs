//! Public slug generation for published stories.
//!
//! Slugs look like `our-anniversary-story-a3K9mzx`: the slugified title plus
//! a random alphanumeric suffix. Uniqueness is enforced by the caller
//! (retry on collision) and by the `uq_stories_slug` index.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Length of the random suffix appended to every slug.
pub const SLUG_SUFFIX_LEN: usize = 7;

/// How many fresh slugs the publisher tries before giving up on collisions.
pub const MAX_SLUG_ATTEMPTS: usize = 5;

/// Base used when the title contains nothing slug-safe.
const FALLBACK_BASE: &str = "story";

static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Lowercase the title, drop anything that is not `[a-z0-9]`, whitespace or
/// `-`, turn whitespace runs into single dashes and trim leading/trailing
/// dashes.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped = DISALLOWED_RE.replace_all(&lowered, "");
    let dashed = WHITESPACE_RE.replace_all(&stripped, "-");
    let collapsed = DASHES_RE.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

/// Random alphanumeric suffix of [`SLUG_SUFFIX_LEN`] characters.
pub fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(SLUG_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Generate a candidate public slug for `title`.
pub fn generate_slug(title: &str) -> String {
    let base = slugify(title);
    let base = if base.is_empty() { FALLBACK_BASE } else { &base };
    format!("{base}-{}", random_suffix())
}
