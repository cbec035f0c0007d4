use std::path::PathBuf;

use clap::Parser;
use storyline_core::export::SnapshotAspect;

/// Player configuration, from flags with environment fallbacks.
///
/// | Flag             | Env var                    | Default                  |
/// |------------------|----------------------------|--------------------------|
/// | `<SLUG>`         | (none)                     | required                 |
/// | `--api-url`      | `STORYLINE_API_URL`        | `http://localhost:3000`  |
/// | `--progress-dir` | `STORYLINE_PROGRESS_DIR`   | `.storyline/progress`    |
/// | `--export-dir`   | `STORYLINE_EXPORT_DIR`     | `.storyline/exports`     |
/// | `--aspect`       | `STORYLINE_EXPORT_ASPECT`  | `portrait`               |
/// | `--timeout-secs` | `STORYLINE_HTTP_TIMEOUT`   | `10`                     |
#[derive(Parser, Debug, Clone)]
#[command(name = "storyline-player", about = "Play a published story in the terminal", version)]
pub struct PlayerConfig {
    /// Public slug of the story to play.
    pub slug: String,

    /// Base URL of the storyline API.
    #[arg(long, env = "STORYLINE_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,

    /// Directory holding per-story progress records.
    #[arg(long, env = "STORYLINE_PROGRESS_DIR", default_value = ".storyline/progress")]
    pub progress_dir: PathBuf,

    /// Directory that snapshot exports are written under.
    #[arg(long, env = "STORYLINE_EXPORT_DIR", default_value = ".storyline/exports")]
    pub export_dir: PathBuf,

    /// Default snapshot format: `portrait` or `square`.
    #[arg(long, env = "STORYLINE_EXPORT_ASPECT", default_value = "portrait", value_parser = parse_aspect)]
    pub aspect: SnapshotAspect,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "STORYLINE_HTTP_TIMEOUT", default_value_t = 10)]
    pub timeout_secs: u64,
}

pub fn parse_aspect(name: &str) -> Result<SnapshotAspect, String> {
    SnapshotAspect::from_name(name)
        .ok_or_else(|| format!("unknown aspect '{name}', expected portrait or square"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let config = PlayerConfig::try_parse_from(["storyline-player", "our-story-abc1234"])
            .expect("parse");
        assert_eq!(config.slug, "our-story-abc1234");
        assert_eq!(config.aspect, SnapshotAspect::Portrait);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn aspect_flag_accepts_ratio_names() {
        let config = PlayerConfig::try_parse_from([
            "storyline-player",
            "--aspect",
            "1:1",
            "--api-url",
            "http://api.test",
            "slug",
        ])
        .expect("parse");
        assert_eq!(config.aspect, SnapshotAspect::Square);
        assert_eq!(config.api_url, "http://api.test");
    }

    #[test]
    fn unknown_aspect_is_rejected() {
        assert!(PlayerConfig::try_parse_from(["storyline-player", "--aspect", "wide", "slug"]).is_err());
    }

    #[test]
    fn slug_is_required() {
        assert!(PlayerConfig::try_parse_from(["storyline-player"]).is_err());
    }
}
