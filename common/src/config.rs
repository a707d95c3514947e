use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Board;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Variables pigpio's own clients read.
pub const ENV_ADDR: &str = "PIGPIO_ADDR";
pub const ENV_PORT: &str = "PIGPIO_PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {name}: {value:?}")]
    Env { name: &'static str, value: String },
}

/// Where pigpiod runs and how its Pi is wired.
///
/// In a TOML file every key is optional:
///
/// ```toml
/// host = "raspberrypi.local"
/// port = 8888
/// timeout = 10000   # milliseconds, 0 for none
/// board = "pi3"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub host: String,
    pub port: u16,
    /// connect and read timeout
    #[serde(with = "millis")]
    pub timeout: Duration,
    pub board: Board,
}

impl Default for Device {
    fn default() -> Self {
        Device {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            board: Board::default(),
        }
    }
}

impl Device {
    pub fn new(host: &str, port: u16) -> Self {
        Device {
            host: host.to_string(),
            port,
            ..Device::default()
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Defaults, overridden by `path` (if given), overridden by the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut device = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Device::from_toml(&text)?
            }
            None => Device::default(),
        };
        device.apply_env_with(|name| env::var(name).ok())?;
        Ok(device)
    }

    /// Apply `PIGPIO_ADDR` and `PIGPIO_PORT` as returned by `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_ADDR) {
            let addr = addr.trim();
            if addr.is_empty() {
                return Err(ConfigError::Env { name: ENV_ADDR, value: addr.to_string() });
            }
            self.host = addr.to_string();
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { name: ENV_PORT, value: port.clone() })?;
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
