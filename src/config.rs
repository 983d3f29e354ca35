use std::error::Error;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::snapshot::DEFAULT_STORAGE_KEY;

pub const DEFAULT_CONFIG_PATH: &str = ".qsheet/config.toml";
pub const DEFAULT_DB_PATH: &str = ".qsheet/state.sqlite";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub db_path: String,
    pub storage_key: String,
    pub source_url: Option<String>,
    pub source_file: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub log_filter: Option<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            source_url: None,
            source_file: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            log_filter: None,
        }
    }
}

impl SheetConfig {
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: SheetConfig = toml::from_str(raw)?;
        if config.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage_key must not be empty".to_string(),
            ));
        }
        if config.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn has_source(&self) -> bool {
        self.source_url.is_some() || self.source_file.is_some()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config: {}", err),
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SheetConfig, DEFAULT_DB_PATH, DEFAULT_HTTP_TIMEOUT_SECS};
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn missing_file_yields_defaults() {
        let config = SheetConfig::load(Path::new("/definitely/not/here/config.toml"))
            .expect("missing config should not fail");
        assert_eq!(config, SheetConfig::default());
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert_eq!(config.storage_key, "question-sheet-store");
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert!(!config.has_source());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = SheetConfig::from_toml(
            r#"
source_url = "https://example.test/api/questions"
http_timeout_secs = 3
"#,
        )
        .expect("config should parse");
        assert_eq!(
            config.source_url.as_deref(),
            Some("https://example.test/api/questions")
        );
        assert_eq!(config.http_timeout(), Duration::from_secs(3));
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert!(config.has_source());
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            SheetConfig::from_toml("colour = true"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            SheetConfig::from_toml("storage_key = \"  \""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SheetConfig::from_toml("http_timeout_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
