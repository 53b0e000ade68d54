use std::env;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_LOG_FILTER: &str = "lms_runtime=info,axum=info";
pub const DEFAULT_CONTENT_BASE_URL: &str = "/content";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 2 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub log_filter: String,
    /// Prefix for SCORM launch URLs handed to the player.
    pub content_base_url: String,
    pub max_upload_bytes: usize,
    /// Idle SCORM sessions older than this are dropped on the next install.
    pub session_idle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_filter: DEFAULT_LOG_FILTER.into(),
            content_base_url: DEFAULT_CONTENT_BASE_URL.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl Config {
    /// Reads `PORT`, `RUST_LOG`, `CONTENT_BASE_URL`, `MAX_UPLOAD_BYTES` and
    /// `SESSION_IDLE_SECS`.
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
            content_base_url: lookup("CONTENT_BASE_URL").unwrap_or(defaults.content_base_url),
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            session_idle_secs: lookup("SESSION_IDLE_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.session_idle_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn falls_back_to_defaults() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.port, 8081);
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("CONTENT_BASE_URL", "https://cdn.example.com/scorm"),
            ("MAX_UPLOAD_BYTES", "lots"),
            ("SESSION_IDLE_SECS", "600"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.content_base_url, "https://cdn.example.com/scorm");
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(cfg.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(cfg.session_idle_secs, 600);
    }
}
