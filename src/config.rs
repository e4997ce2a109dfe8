//! # Configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables such as `GALGAME_SEARCH__NYAA__BASE_URL`, and finally
//! command-line overrides.

use crate::{Error, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "GALGAME_SEARCH";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub touchgal: TouchGalConfig,
    pub nyaa: NyaaConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

/// Shared HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: concat!("galgame-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// TouchGal JSON API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchGalConfig {
    pub enabled: bool,
    pub base_url: String,
    pub page_size: u32,
    /// Raw `Cookie` header value controlling the content-rating filter
    pub nsfw_cookie: String,
}

impl Default for TouchGalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.touchgal.us/api".to_string(),
            page_size: 15,
            nsfw_cookie: "kun-patch-setting-store|state|data|kunNsfwEnable=all".to_string(),
        }
    }
}

/// Nyaa RSS feed settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NyaaConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Feed category filter; `1_2` is Software - Games
    pub category: String,
}

impl Default for NyaaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nyaa.si".to_string(),
            category: "1_2".to_string(),
        }
    }
}

/// Aggregated search behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-source deadline; unset means every source is awaited indefinitely
    pub source_timeout_secs: Option<u64>,
}

impl SearchConfig {
    #[must_use]
    pub fn source_timeout(&self) -> Option<Duration> {
        self.source_timeout_secs.map(Duration::from_secs)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Values supplied on the command line, applied after every other layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub source_timeout_secs: Option<u64>,
    pub disable_touchgal: bool,
    pub disable_nyaa: bool,
}

impl Config {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// With no explicit `path`, `<config dir>/galgame-search/config.toml` is
    /// read when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                builder = builder
                    .add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.exists()) {
                    debug!("Loading configuration from {}", path.display());
                    builder = builder.add_source(File::from(path).format(FileFormat::Toml));
                }
            }
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Default location of the configuration file
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("galgame-search").join("config.toml"))
    }

    /// Apply command-line overrides and re-validate
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(level) = &overrides.log_level {
            self.logging.level.clone_from(level);
        }
        if let Some(format) = &overrides.log_format {
            self.logging.format.clone_from(format);
        }
        if let Some(secs) = overrides.source_timeout_secs {
            self.search.source_timeout_secs = Some(secs);
        }
        if overrides.disable_touchgal {
            self.touchgal.enabled = false;
        }
        if overrides.disable_nyaa {
            self.nyaa.enabled = false;
        }
        self.validate()
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs", "must be greater than zero"));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(invalid("http.connect_timeout_secs", "must be greater than zero"));
        }

        if !self.touchgal.enabled && !self.nyaa.enabled {
            return Err(invalid("sources", "at least one source must be enabled"));
        }

        if self.touchgal.enabled {
            validate_base_url("touchgal.base_url", &self.touchgal.base_url)?;
            if self.touchgal.page_size == 0 {
                return Err(invalid("touchgal.page_size", "must be greater than zero"));
            }
        }

        if self.nyaa.enabled {
            validate_base_url("nyaa.base_url", &self.nyaa.base_url)?;
        }

        if self.search.source_timeout_secs == Some(0) {
            return Err(invalid("search.source_timeout_secs", "must be greater than zero"));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid(
                "logging.format",
                &format!("unknown format '{}', expected 'pretty' or 'json'", self.logging.format),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidInput {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| invalid(field, &format!("invalid URL '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, &format!("unsupported scheme '{scheme}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.touchgal.page_size, 15);
        assert_eq!(config.nyaa.category, "1_2");
        assert_eq!(config.search.source_timeout(), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[nyaa]
base_url = "http://127.0.0.1:9000"

[search]
source_timeout_secs = 5

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.nyaa.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.nyaa.category, "1_2");
        assert_eq!(config.search.source_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.touchgal, TouchGalConfig::default());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.touchgal.base_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));

        let mut config = Config::default();
        config.touchgal.page_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));

        let mut config = Config::default();
        config.search.source_timeout_secs = Some(0);
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_disabled_source_url_is_not_checked() {
        let mut config = Config::default();
        config.nyaa.enabled = false;
        config.nyaa.base_url = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            log_level: Some("debug".to_string()),
            source_timeout_secs: Some(8),
            disable_nyaa: true,
            ..ConfigOverrides::default()
        };

        config.apply_overrides(&overrides).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.search.source_timeout_secs, Some(8));
        assert!(!config.nyaa.enabled);
        assert!(config.touchgal.enabled);

        let all_off = ConfigOverrides {
            disable_touchgal: true,
            ..ConfigOverrides::default()
        };
        assert!(config.apply_overrides(&all_off).is_err());
    }

    #[test]
    fn test_toml_rendering_round_trips() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
