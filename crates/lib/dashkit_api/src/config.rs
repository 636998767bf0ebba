//! Server configuration.

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8888;

/// Bind address of the HTTP listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable       | Default     |
    /// |----------------|-------------|
    /// | `DASHKIT_HOST` | `127.0.0.1` |
    /// | `DASHKIT_PORT` | `8888`      |
    ///
    /// An unparsable port falls back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("DASHKIT_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port: lookup("DASHKIT_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    /// `host:port` string accepted by `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
