//! Configuration loading from disk and the environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs, io};

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::observability::logging::Logger;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot resolve home directory to expand {0}")]
    HomeDir(String),

    #[error("failed to read config file {}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse config file {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads configuration with injected environment lookup and logger.
pub struct ConfigLoader<E> {
    env: E,
    logger: Arc<dyn Logger>,
}

impl ConfigLoader<fn(&str) -> Option<String>> {
    /// Loader reading the process environment.
    pub fn from_process_env(logger: Arc<dyn Logger>) -> Self {
        fn lookup(key: &str) -> Option<String> {
            env::var(key).ok()
        }
        Self {
            env: lookup,
            logger,
        }
    }
}

impl<E> ConfigLoader<E>
where
    E: Fn(&str) -> Option<String>,
{
    pub fn new(env: E, logger: Arc<dyn Logger>) -> Self {
        Self { env, logger }
    }

    /// Defaults with environment overrides applied.
    pub fn defaults(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();
        self.apply_env_overrides(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Load a TOML file, apply environment overrides and validate.
    ///
    /// A leading `~` expands to the home directory. A missing file is not an
    /// error: defaults plus environment are used instead.
    pub fn load_from_file(&self, path: &Path) -> Result<AppConfig, ConfigError> {
        let path = self.expand_home(path)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.logger.info(
                    "Configuration file not found, using defaults and environment variables",
                    &[("path", &path.display())],
                );
                return self.defaults();
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        self.logger
            .info("Read configuration file", &[("path", &path.display())]);

        let mut config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        self.apply_env_overrides(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn expand_home(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        let Ok(rest) = path.strip_prefix("~") else {
            return Ok(path.to_path_buf());
        };
        let home = (self.env)("HOME")
            .filter(|home| !home.is_empty())
            .ok_or_else(|| ConfigError::HomeDir(path.display().to_string()))?;
        let expanded = Path::new(&home).join(rest);
        self.logger.debug(
            "Expanded config path",
            &[
                ("original_path", &path.display()),
                ("expanded_path", &expanded.display()),
            ],
        );
        Ok(expanded)
    }

    /// Apply overrides from environment variables.
    ///
    /// Invalid values are logged and ignored.
    pub fn apply_env_overrides(&self, config: &mut AppConfig) {
        if let Some(raw) = (self.env)("SERVER_PORT") {
            match raw.parse::<u16>() {
                Ok(port) if port > 0 => {
                    self.logger.debug(
                        "Overriding server port from environment",
                        &[("old_value", &config.server.port), ("new_value", &port)],
                    );
                    config.server.port = port;
                }
                _ => self.logger.warn(
                    "Invalid SERVER_PORT environment variable ignored",
                    &[("value", &raw)],
                ),
            }
        }

        if let Some(name) = (self.env)("SERVER_NAME").filter(|name| !name.is_empty()) {
            self.logger.debug(
                "Overriding server name from environment",
                &[("old_value", &config.server.name), ("new_value", &name)],
            );
            config.server.name = name;
        }

        if let Some(level) = (self.env)("LOG_LEVEL").filter(|level| !level.is_empty()) {
            config.observability.log_level = level;
        }

        let server = &mut config.server;
        for (var, slot) in [
            ("SERVER_READ_TIMEOUT", &mut server.read_timeout),
            ("SERVER_WRITE_TIMEOUT", &mut server.write_timeout),
            ("SERVER_GRACEFUL_TIMEOUT", &mut server.graceful_timeout),
        ] {
            let Some(raw) = (self.env)(var) else {
                continue;
            };
            match humantime::parse_duration(raw.trim()) {
                Ok(duration) if !duration.is_zero() => {
                    self.logger.debug(
                        "Overriding timeout from environment",
                        &[
                            ("env_var", &var),
                            ("old_value", &humantime::format_duration(*slot)),
                            ("new_value", &humantime::format_duration(duration)),
                        ],
                    );
                    *slot = duration;
                }
                Ok(_) => self.logger.warn(
                    "Zero timeout environment variable ignored",
                    &[("env_var", &var), ("value", &raw)],
                ),
                Err(error) => self.logger.warn(
                    "Invalid timeout environment variable ignored",
                    &[("env_var", &var), ("value", &raw), ("error", &error)],
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::recording::RecordingLogger;
    use crate::observability::logging::NoopLogger;
    use std::collections::HashMap;
    use std::time::Duration;
    use tracing::Level;

    fn loader(vars: &[(&str, &str)]) -> ConfigLoader<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ConfigLoader::new(move |key: &str| vars.get(key).cloned(), NoopLogger::shared())
    }

    #[test]
    fn timeout_overrides_accept_compound_durations() {
        let config = loader(&[
            ("SERVER_READ_TIMEOUT", "1m30s"),
            ("SERVER_WRITE_TIMEOUT", "500ms"),
            ("SERVER_GRACEFUL_TIMEOUT", "1h"),
        ])
        .defaults()
        .unwrap();
        assert_eq!(config.server.read_timeout, Duration::from_secs(90));
        assert_eq!(config.server.write_timeout, Duration::from_millis(500));
        assert_eq!(config.server.graceful_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn zero_and_bare_number_timeout_overrides_are_ignored() {
        let config = loader(&[
            ("SERVER_READ_TIMEOUT", "1s 250ms"),
            ("SERVER_WRITE_TIMEOUT", "0s"),
            ("SERVER_GRACEFUL_TIMEOUT", "15"),
        ])
        .defaults()
        .unwrap();
        assert_eq!(config.server.read_timeout, Duration::from_millis(1250));
        assert_eq!(config.server.graceful_timeout, Duration::from_secs(15));
        assert_eq!(config.server.write_timeout, Duration::from_secs(15));
    }

    #[test]
    fn env_overrides_apply() {
        let loader = loader(&[
            ("SERVER_PORT", "9000"),
            ("SERVER_NAME", "tools"),
            ("SERVER_WRITE_TIMEOUT", "30s"),
        ]);
        let config = loader.defaults().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.name, "tools");
        assert_eq!(config.server.write_timeout, Duration::from_secs(30));
        assert_eq!(config.server.read_timeout, Duration::from_secs(15));
    }

    #[test]
    fn invalid_env_values_are_ignored_with_warning() {
        let logger = RecordingLogger::new();
        let loader = ConfigLoader::new(
            |key: &str| match key {
                "SERVER_PORT" => Some("99999".to_owned()),
                "SERVER_READ_TIMEOUT" => Some("later".to_owned()),
                _ => None,
            },
            Arc::new(logger.clone()),
        );
        let config = loader.defaults().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.read_timeout, Duration::from_secs(15));

        let warnings = logger
            .records()
            .into_iter()
            .filter(|r| r.level == Level::WARN)
            .count();
        assert_eq!(warnings, 2);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = loader(&[])
            .load_from_file(&dir.path().join("absent.toml"))
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn file_values_then_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[server]\nname = \"from-file\"\nport = 7000\n\n[observability]\nerror_buffer_size = 5\n",
        )
        .unwrap();

        let config = loader(&[("SERVER_PORT", "7100")]).load_from_file(&path).unwrap();
        assert_eq!(config.server.name, "from-file");
        assert_eq!(config.server.port, 7100);
        assert_eq!(config.observability.error_buffer_size, 5);
    }

    #[test]
    fn tilde_expands_against_home() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tool.toml"), "[server]\nport = 7200\n").unwrap();
        let home = dir.path().to_string_lossy().into_owned();

        let config = loader(&[("HOME", home.as_str())])
            .load_from_file(Path::new("~/tool.toml"))
            .unwrap();
        assert_eq!(config.server.port, 7200);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[server\nport = ").unwrap();

        let err = loader(&[]).load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        fs::write(&path, "[server]\nmax_connections = 0\n").unwrap();

        let err = loader(&[]).load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }
}
