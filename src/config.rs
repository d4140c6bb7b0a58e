//! Configuration file parser for ~/.config/govfeed/config.toml.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`; unknown keys are accepted but logged as warnings.
use crate::api::SourceId;
use crate::feed::SortMode;
use crate::theme::ThemeVariant;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "GOVFEED_API_URL";

/// Environment variable supplying the OpenAI key when the file has none.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

const MAX_PAGE_SIZE: usize = 25;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` masks `openai_api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL. `None` falls through to the default.
    pub api_base_url: Option<String>,

    /// Identity sent with every request.
    pub user_id: String,

    /// Items per feed page (1-25).
    pub page_size: usize,

    /// How long newly fetched items stay highlighted, in milliseconds.
    pub highlight_ms: u64,

    /// "dark" or "light".
    pub theme: String,

    /// Comma-separated source ids enabled at startup.
    pub default_sources: String,

    /// Sort mode at startup.
    pub default_sort: String,

    /// OpenAI key for AI ranking. `OPENAI_API_KEY` is used when unset.
    pub openai_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            user_id: "default".to_string(),
            page_size: 15,
            highlight_ms: 4000,
            theme: "dark".to_string(),
            default_sources: SourceId::join(&SourceId::ALL),
            default_sort: SortMode::Relevance.as_str().to_string(),
            openai_api_key: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("user_id", &self.user_id)
            .field("page_size", &self.page_size)
            .field("highlight_ms", &self.highlight_ms)
            .field("theme", &self.theme)
            .field("default_sources", &self.default_sources)
            .field("default_sort", &self.default_sort)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "api_base_url",
        "user_id",
        "page_size",
        "highlight_ms",
        "theme",
        "default_sources",
        "default_sort",
        "openai_api_key",
    ];

    /// `$HOME/.config/govfeed/config.toml`, if `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("govfeed")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            user_id = %config.user_id,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: format!("{} is outside 1..={}", self.page_size, MAX_PAGE_SIZE),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "user_id",
                reason: "must not be empty".to_string(),
            });
        }
        if ThemeVariant::from_str_name(&self.theme).is_none() {
            return Err(ConfigError::Invalid {
                key: "theme",
                reason: format!("'{}' is not dark or light", self.theme),
            });
        }
        self.sources()?;
        self.sort()?;
        Ok(())
    }

    // ========================================================================
    // Resolved Values
    // ========================================================================

    pub fn sources(&self) -> Result<Vec<SourceId>, ConfigError> {
        let sources =
            SourceId::parse_list(&self.default_sources).map_err(|e| ConfigError::Invalid {
                key: "default_sources",
                reason: e.to_string(),
            })?;
        if sources.is_empty() {
            return Err(ConfigError::Invalid {
                key: "default_sources",
                reason: "at least one source is required".to_string(),
            });
        }
        Ok(sources)
    }

    pub fn sort(&self) -> Result<SortMode, ConfigError> {
        self.default_sort
            .parse()
            .map_err(|e: crate::feed::UnknownSortMode| ConfigError::Invalid {
                key: "default_sort",
                reason: e.to_string(),
            })
    }

    /// Base URL after environment overrides. A CLI flag is applied by the
    /// caller on top of this.
    pub fn api_url(&self) -> String {
        self.api_url_with(|k| std::env::var(k).ok())
    }

    fn api_url_with(&self, env: impl Fn(&str) -> Option<String>) -> String {
        env(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// OpenAI key from the file, else from `OPENAI_API_KEY`.
    pub fn openai_key(&self) -> Option<SecretString> {
        self.openai_key_with(|k| std::env::var(k).ok())
    }

    fn openai_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
        self.openai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env(OPENAI_KEY_ENV).filter(|k| !k.trim().is_empty()))
            .map(SecretString::from)
    }

    pub fn theme(&self) -> ThemeVariant {
        ThemeVariant::from_str_name(&self.theme).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.user_id, "default");
        assert_eq!(config.page_size, 15);
        assert_eq!(config.highlight_ms, 4000);
        assert_eq!(config.theme, "dark");
        assert_eq!(config.sources().unwrap(), SourceId::ALL.to_vec());
        assert_eq!(config.sort().unwrap(), SortMode::Relevance);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/govfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_size, 15);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let dir = std::env::temp_dir().join("govfeed_config_test_whitespace");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme, "dark");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("govfeed_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
api_base_url = "http://feeds.internal:9000"
user_id = "analyst-7"
page_size = 10
highlight_ms = 2500
theme = "light"
default_sources = "grants, sam"
default_sort = "amount"
openai_api_key = "sk-test-123"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_url_with(no_env), "http://feeds.internal:9000");
        assert_eq!(config.user_id, "analyst-7");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.highlight_ms, 2500);
        assert_eq!(config.theme(), ThemeVariant::Light);
        assert_eq!(
            config.sources().unwrap(),
            vec![SourceId::Grants, SourceId::Sam]
        );
        assert_eq!(config.sort().unwrap(), SortMode::Amount);
        assert_eq!(
            config.openai_key_with(no_env).unwrap().expose_secret(),
            "sk-test-123"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("theme = \"dark\"\nrefresh_interval_minutes = 5\n").unwrap();
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn test_page_size_range() {
        assert!(matches!(
            Config::parse("page_size = 0").unwrap_err(),
            ConfigError::Invalid { key: "page_size", .. }
        ));
        assert!(Config::parse("page_size = 26").is_err());
        assert_eq!(Config::parse("page_size = 25").unwrap().page_size, 25);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let err = Config::parse("default_sources = \"sam,fpds\"").unwrap_err();
        assert!(err.to_string().contains("default_sources"));
    }

    #[test]
    fn test_unknown_theme_rejected() {
        assert!(matches!(
            Config::parse("theme = \"solarized\"").unwrap_err(),
            ConfigError::Invalid { key: "theme", .. }
        ));
    }

    #[test]
    fn test_bad_sort_rejected() {
        assert!(matches!(
            Config::parse("default_sort = \"newest\"").unwrap_err(),
            ConfigError::Invalid { key: "default_sort", .. }
        ));
    }

    #[test]
    fn test_api_url_precedence() {
        let mut config = Config::default();
        assert_eq!(config.api_url_with(no_env), DEFAULT_API_URL);

        config.api_base_url = Some("http://from-file:8000".into());
        assert_eq!(config.api_url_with(no_env), "http://from-file:8000");

        let env = |k: &str| (k == API_URL_ENV).then(|| "http://from-env:8000".to_string());
        assert_eq!(config.api_url_with(env), "http://from-env:8000");
    }

    #[test]
    fn test_openai_key_env_fallback() {
        let config = Config::default();
        assert!(config.openai_key_with(no_env).is_none());

        let env = |k: &str| (k == OPENAI_KEY_ENV).then(|| "sk-env".to_string());
        assert_eq!(config.openai_key_with(env).unwrap().expose_secret(), "sk-env");

        let config = Config {
            openai_api_key: Some("sk-file".into()),
            ..Config::default()
        };
        assert_eq!(config.openai_key_with(env).unwrap().expose_secret(), "sk-file");
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("govfeed_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            openai_api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
