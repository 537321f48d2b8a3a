//! Default values shared by the CLI, the config file and the services.

/// Default port of the public queue API.
pub const DEFAULT_PORT: u16 = 8080;

/// Default port of the admin listener (health, metrics, queue stats).
pub const DEFAULT_ADMIN_PORT: u16 = 6060;

/// Default bind address for both listeners.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default upper bound for a long-polling `get`, in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 3600;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "queue-broker.toml";
