//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `SQSLITE_*` environment variables, then flags given on the command line.

use std::path::Path;

use anyhow::bail;
use serde::Deserialize;

/// Default file looked up in the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "sqslite";
const ENV_PREFIX: &str = "SQSLITE";

/// Resolved broker configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_account_number")]
    pub account_number: String,

    /// Overrides the advertised endpoint derived from host and port
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            account_number: default_account_number(),
            endpoint: None,
            log_level: default_log_level(),
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub account_number: Option<String>,
    pub endpoint: Option<String>,
    pub log_level: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_account_number() -> String {
    "000000000000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; the default `sqslite.toml` is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }

    pub fn with_overrides(self, overrides: Overrides) -> Self {
        Self {
            host: overrides.host.unwrap_or(self.host),
            port: overrides.port.unwrap_or(self.port),
            account_number: overrides.account_number.unwrap_or(self.account_number),
            endpoint: overrides.endpoint.or(self.endpoint),
            log_level: overrides.log_level.unwrap_or(self.log_level),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            bail!("port must be between 1 and 65535");
        }
        if self.account_number.is_empty() {
            bail!("account number must not be empty");
        }
        Ok(())
    }

    /// Address to bind, bracketing IPv6 literals.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Base URL that queue URLs are built from
    ///
    /// A wildcard bind host is advertised as `localhost` so the URLs are
    /// reachable by clients.
    pub fn endpoint(&self) -> String {
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            return endpoint.trim_end_matches('/').to_string();
        }

        let host = match self.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "localhost".to_string(),
            host if host.contains(':') && !host.starts_with('[') => format!("[{host}]"),
            host => host.to_string(),
        };
        format!("http://{}:{}/{}", host, self.port, self.account_number)
    }
}
