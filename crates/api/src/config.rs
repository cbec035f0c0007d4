use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Shared secret expected in `x-upload-token`. Uploads are refused
    /// while unset.
    pub upload_token: Option<String>,
    /// Directory uploaded media is written to (default: `storage/media`).
    pub media_root: PathBuf,
    /// Public URL prefix stored media is served under
    /// (default: `http://localhost:3000/media`).
    pub media_base_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                       |
    /// |------------------------|-------------------------------|
    /// | `HOST`                 | `0.0.0.0`                     |
    /// | `PORT`                 | `3000`                        |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                          |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                          |
    /// | `UPLOAD_TOKEN`         | unset                         |
    /// | `MEDIA_ROOT`           | `storage/media`               |
    /// | `MEDIA_BASE_URL`       | `http://localhost:3000/media` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let upload_token = std::env::var("UPLOAD_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if upload_token.is_none() {
            tracing::warn!("UPLOAD_TOKEN is not set; media uploads are disabled");
        }

        let media_root = std::env::var("MEDIA_ROOT")
            .unwrap_or_else(|_| "storage/media".into())
            .into();

        let media_base_url = std::env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/media"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_token,
            media_root,
            media_base_url,
        }
    }
}
