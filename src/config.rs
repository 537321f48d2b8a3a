//! Configuration types for the queue broker.
//!
//! Settings are read from an optional TOML file and then overridden by
//! command-line flags. It includes:
//!
//! - [`Config`] - Root configuration struct
//! - [`ServerConfig`] - Listener addresses
//! - [`QueueSettings`] - Queue service limits
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! admin_port = 6060   # 0 disables the admin listener
//!
//! [queue]
//! max_wait_secs = 3600
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::constants;
use crate::daemon::services::queue::QueueConfig;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// queue-broker.toml configuration structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub queue: QueueSettings,
}

/// Listener configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Port of the admin listener; 0 disables it.
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_port: default_admin_port(),
        }
    }
}

/// Queue service configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSettings {
    /// Upper bound for the `timeout` of a long-polling get, in seconds.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

fn default_host() -> String {
    constants::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    constants::DEFAULT_PORT
}

fn default_admin_port() -> u16 {
    constants::DEFAULT_ADMIN_PORT
}

fn default_max_wait_secs() -> u64 {
    constants::DEFAULT_MAX_WAIT_SECS
}

impl Config {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types or are unknown
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `path` if given, else `queue-broker.toml` if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None if Path::new(constants::DEFAULT_CONFIG_FILE).exists() => {
                Self::load_from(constants::DEFAULT_CONFIG_FILE)
            },
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - `server.host` is not an IP address
    /// - `server.port` is 0
    /// - `server.admin_port` equals `server.port`
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let server = &self.server;

        // 1. Bind address
        if server.host.parse::<IpAddr>().is_err() {
            errors.push(format!(
                "server.host must be an IP address (got: '{}')\n  \
                 Use 0.0.0.0 for all interfaces or 127.0.0.1 for local only",
                server.host
            ));
        }

        // 2. Ports
        if server.port == 0 {
            errors.push(
                "server.port cannot be 0. Use a valid port number (1-65535)\n  \
                 Default: 8080"
                    .to_string(),
            );
        }

        if server.admin_port != 0 && server.admin_port == server.port {
            errors.push(format!(
                "server.admin_port must differ from server.port (both are {})\n  \
                 Set admin_port = 0 to disable the admin listener",
                server.port
            ));
        }

        for (name, port) in [("port", server.port), ("admin_port", server.admin_port)] {
            if port > 0 && port < 1024 {
                warnings.push(format!(
                    "server.{name} {port} is a system/privileged port (< 1024)\n  \
                     Recommendation: Use ports >= 1024 to avoid permission issues"
                ));
            }
        }

        // 3. Queue limits
        if self.queue.max_wait_secs == 0 {
            warnings.push(
                "queue.max_wait_secs is 0: long polling is disabled and every get \
                 returns immediately"
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }

    /// Address of the public queue API.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.host` is not an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.host_ip()?, self.server.port))
    }

    /// Address of the admin listener, or `None` when it is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.host` is not an IP address.
    pub fn admin_addr(&self) -> Result<Option<SocketAddr>> {
        if self.server.admin_port == 0 {
            return Ok(None);
        }
        Ok(Some(SocketAddr::new(self.host_ip()?, self.server.admin_port)))
    }

    /// Settings for the queue service.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_wait: Duration::from_secs(self.queue.max_wait_secs),
        }
    }

    fn host_ip(&self) -> Result<IpAddr> {
        self.server
            .host
            .parse()
            .with_context(|| format!("Invalid server.host: {}", self.server.host))
    }
}
