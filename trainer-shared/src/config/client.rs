//! Loading, validation and rendering of [`ClientConfig`].

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use url::Url;

const DEFAULT_AUTH_URL: &str = "http://localhost:5000/auth";
const DEFAULT_CORE_URL: &str = "http://localhost:5001";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_AUTH_URL: &str = "TRAINER_AUTH_URL";
const ENV_CORE_URL: &str = "TRAINER_CORE_URL";
const ENV_LOG_LEVEL: &str = "TRAINER_LOG_LEVEL";
const ENV_TOKEN_PATH: &str = "TRAINER_TOKEN_PATH";
const ENV_REQUEST_TIMEOUT: &str = "TRAINER_REQUEST_TIMEOUT_SECS";

/// Errors raised while loading, validating or rendering configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file was read but is not valid for its format.
    #[error("failed to parse configuration file {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// Extension or requested format is not yaml, json or toml.
    #[error("unsupported configuration format '{0}'; use yaml, json or toml")]
    UnsupportedFormat(String),
    /// A value parsed but is not acceptable.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Configuration key or environment variable at fault.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
    /// Rendering the configuration failed.
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),
}

/// On-disk configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedFormat`] for unknown or missing extensions.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse()
    }

    /// Default file name used by `trainer config`.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Yaml => "trainer.yaml",
            Self::Json => "trainer.json",
            Self::Toml => "trainer.toml",
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        })
    }
}

/// Configuration for the trainer clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the identity service (register, login, me, is-admin).
    pub auth_url: String,

    /// Base URL of the core resource service (topics, assignments, admin).
    pub core_url: String,

    /// Logging level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// File holding the bearer credential between runs.
    pub token_path: PathBuf,

    /// Per-request timeout for outbound HTTP calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            core_url: DEFAULT_CORE_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            token_path: default_token_path(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Values from the file take precedence; environment variables only fill
    /// in fields the file left at their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load_config(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| env::var(key).ok())
    }

    fn load_with_env(
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::with_defaults(),
        };
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let config = match format {
            ConfigFormat::Yaml => {
                serde_yml::from_str(&content).map_err(|err| parse_error(err.to_string()))?
            }
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|err| parse_error(err.to_string()))?
            }
            ConfigFormat::Toml => {
                toml::from_str(&content).map_err(|err| parse_error(err.to_string()))?
            }
        };
        tracing::debug!(path = %path.display(), %format, "loaded configuration file");
        Ok(config)
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let defaults = Self::with_defaults();

        if self.auth_url == defaults.auth_url
            && let Some(value) = lookup(ENV_AUTH_URL)
        {
            self.auth_url = value;
        }
        if self.core_url == defaults.core_url
            && let Some(value) = lookup(ENV_CORE_URL)
        {
            self.core_url = value;
        }
        if self.log_level == defaults.log_level
            && let Some(value) = lookup(ENV_LOG_LEVEL)
        {
            self.log_level = value;
        }
        if self.token_path == defaults.token_path
            && let Some(value) = lookup(ENV_TOKEN_PATH)
        {
            self.token_path = PathBuf::from(value);
        }
        if self.request_timeout_secs == defaults.request_timeout_secs
            && let Some(value) = lookup(ENV_REQUEST_TIMEOUT)
        {
            self.request_timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_REQUEST_TIMEOUT,
                    message: format!("'{value}' is not a whole number of seconds"),
                })?;
        }
        Ok(())
    }

    /// Checks that both service URLs are absolute http(s) URLs and the timeout is positive.
    ///
    /// # Errors
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_service_url("auth_url", &self.auth_url)?;
        validate_service_url("core_url", &self.core_url)?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.token_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "token_path",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Serializes the configuration in the requested format.
    ///
    /// # Errors
    /// Returns [`ConfigError::Serialize`] if the serializer rejects the value.
    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Yaml => {
                serde_yml::to_string(self).map_err(|err| ConfigError::Serialize(err.to_string()))
            }
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|err| ConfigError::Serialize(err.to_string())),
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|err| ConfigError::Serialize(err.to_string())),
        }
    }
}

/// Location of the credential file when none is configured.
#[must_use]
pub fn default_token_path() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("mongo-trainer").join("token"))
        .unwrap_or_else(|| PathBuf::from("./trainer.token"))
}

fn validate_service_url(key: &'static str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidValue {
        key,
        message: format!("'{raw}' is not a valid URL: {err}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidValue {
            key,
            message: format!("unsupported scheme '{scheme}', expected http or https"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, fs};
    use tempfile::TempDir;

    /// Loads with `vars` standing in for the process environment.
    fn load(path: Option<PathBuf>, vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ClientConfig::load_with_env(path, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_load_config_with_defaults() {
        let config = load(None, &[]).unwrap();

        assert_eq!(config.auth_url, "http://localhost:5000/auth");
        assert_eq!(config.core_url, "http://localhost:5001");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.token_path, default_token_path());
    }

    #[test]
    fn test_load_config_with_environment_variables() {
        let config = load(
            None,
            &[
                (ENV_AUTH_URL, "https://trainer.example.com/auth"),
                (ENV_CORE_URL, "https://trainer.example.com/api"),
                (ENV_LOG_LEVEL, "debug"),
                (ENV_TOKEN_PATH, "/tmp/trainer-token"),
                (ENV_REQUEST_TIMEOUT, "5"),
            ],
        )
        .unwrap();
        assert_eq!(config.auth_url, "https://trainer.example.com/auth");
        assert_eq!(config.core_url, "https://trainer.example.com/api");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.token_path, PathBuf::from("/tmp/trainer-token"));
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_timeout_env_is_rejected() {
        let err = load(None, &[(ENV_REQUEST_TIMEOUT, "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_REQUEST_TIMEOUT,
                ..
            }
        ));
    }

    #[test]
    fn test_file_values_win_over_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trainer.yaml");
        fs::write(
            &path,
            "auth_url: http://identity.local/auth\nlog_level: warn\n",
        )
        .unwrap();

        let config = load(
            Some(path),
            &[
                (ENV_AUTH_URL, "http://ignored.local/auth"),
                (ENV_CORE_URL, "http://core.local"),
            ],
        )
        .unwrap();
        assert_eq!(config.auth_url, "http://identity.local/auth");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.core_url, "http://core.local");
    }

    #[test]
    fn test_load_json_and_toml_files() {
        let dir = TempDir::new().unwrap();

        let json_path = dir.path().join("trainer.json");
        fs::write(&json_path, r#"{"core_url":"http://json.local"}"#).unwrap();
        let json = load(Some(json_path), &[]).unwrap();
        assert_eq!(json.core_url, "http://json.local");
        assert_eq!(json.auth_url, DEFAULT_AUTH_URL);

        let toml_path = dir.path().join("trainer.toml");
        fs::write(&toml_path, "request_timeout_secs = 9\n").unwrap();
        let toml = load(Some(toml_path), &[]).unwrap();
        assert_eq!(toml.request_timeout_secs, 9);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trainer.ini");
        fs::write(&path, "auth_url=x").unwrap();
        let err = load(Some(path), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(Some(dir.path().join("absent.yaml")), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trainer.json");
        fs::write(&path, "{not json").unwrap();
        let err = load(Some(path), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_urls_and_timeout() {
        let mut config = ClientConfig::with_defaults();
        config.auth_url = "ftp://identity.local".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "auth_url", .. })
        ));

        let mut config = ClientConfig::with_defaults();
        config.core_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "core_url", .. })
        ));

        let mut config = ClientConfig::with_defaults();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_render_round_trips_through_each_format() {
        let config = ClientConfig::with_defaults();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let rendered = config.render(format).unwrap();
            assert!(rendered.contains("auth_url"), "{format} output: {rendered}");
        }
    }

    #[test]
    fn test_config_format_parsing() {
        assert_eq!("YML".parse::<ConfigFormat>().unwrap(), ConfigFormat::Yaml);
        assert_eq!("json".parse::<ConfigFormat>().unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::Toml.file_name(), "trainer.toml");
        assert!("xml".parse::<ConfigFormat>().is_err());
    }
}
