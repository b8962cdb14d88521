use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SessionError};

/// Address dialed when nothing else is configured
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:53788";

/// Default deadline for establishing the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach the build server
///
/// Send and receive have no deadline unless one is set, since a build can
/// legitimately run for a long time before replying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `host:port` to dial
    pub address: String,
    pub connect_timeout: Option<Duration>,
    pub send_timeout: Option<Duration>,
    pub receive_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            send_timeout: None,
            receive_timeout: None,
        }
    }
}

/// On-disk form; every key is optional and overlays the defaults
///
/// A timeout of `0` disables that deadline.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    address: Option<String>,
    connect_timeout_secs: Option<u64>,
    send_timeout_secs: Option<u64>,
    receive_timeout_secs: Option<u64>,
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

impl Config {
    /// Parse a TOML document over the defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(contents).map_err(|e| SessionError::Config(e.to_string()))?;

        let mut config = Self::default();
        if let Some(address) = file.address {
            config.address = address;
        }
        if let Some(value) = file.connect_timeout_secs {
            config.connect_timeout = secs(value);
        }
        if let Some(value) = file.send_timeout_secs {
            config.send_timeout = secs(value);
        }
        if let Some(value) = file.receive_timeout_secs {
            config.receive_timeout = secs(value);
        }
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents).map_err(|e| match e {
            SessionError::Config(msg) => {
                SessionError::Config(format!("failed to parse {}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Apply the same deadline to both the send and the receive phase
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self.receive_timeout = timeout;
        self
    }
}
