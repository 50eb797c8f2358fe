//! Layered configuration for the demo server.
//!
//! Precedence, lowest first: built-in defaults, YAML file (`--config`), environment
//! (`HTTPWRAP__SECTION__KEY`), CLI overrides.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, e.g. `HTTPWRAP__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "HTTPWRAP__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    #[error("invalid bind address {addr:?}")]
    BindAddr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("server.port must not be 0")]
    ZeroPort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub problems: ProblemsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_owned(),
            port: 8087,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// How problem responses are enriched with request context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProblemsConfig {
    /// Fill `instance` with the request path.
    pub instance_from_path: bool,
    /// Request header copied into the `trace-id` extension, if present.
    pub trace_header: Option<String>,
}

impl Default for ProblemsConfig {
    fn default() -> Self {
        Self {
            instance_from_path: true,
            trace_header: Some("x-request-id".to_owned()),
        }
    }
}

impl AppConfig {
    /// Load defaults, then the optional YAML file, then environment overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is missing or any layer fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `--port` and `-v` on top of the loaded layers.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// # Errors
    /// Returns [`ConfigError`] if the server section is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr().map(|_| ())
    }

    /// # Errors
    /// Returns [`ConfigError`] if `bind_addr` is not an IP address or the port is 0.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        let ip: IpAddr = self
            .server
            .bind_addr
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                addr: self.server.bind_addr.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        temp_env::with_vars_unset(["HTTPWRAP__SERVER__PORT", "HTTPWRAP__LOGGING__LEVEL"], || {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8087");
        });
    }

    #[test]
    fn yaml_overrides_defaults() {
        let file = yaml_file(
            "server:\n  port: 9100\nlogging:\n  format: json\nproblems:\n  trace_header: x-trace-id\n",
        );
        temp_env::with_var_unset("HTTPWRAP__SERVER__PORT", || {
            let config = AppConfig::load(Some(file.path())).unwrap();
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.server.bind_addr, "127.0.0.1");
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.problems.trace_header.as_deref(), Some("x-trace-id"));
            assert!(config.problems.instance_from_path);
        });
    }

    #[test]
    fn env_overrides_yaml() {
        let file = yaml_file("server:\n  port: 9100\n");
        temp_env::with_vars(
            [
                ("HTTPWRAP__SERVER__PORT", Some("9200")),
                ("HTTPWRAP__LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = AppConfig::load(Some(file.path())).unwrap();
                assert_eq!(config.server.port, 9200);
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some(7000), 2);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.logging.level, "debug");

        config.apply_cli_overrides(None, 0);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = yaml_file("server:\n  prot: 9100\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_bind_addr_fails_validation() {
        let file = yaml_file("server:\n  bind_addr: localhost\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::BindAddr { .. }));
    }
}
