//! Configuration management for formrelay.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::relay::Transport;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the user's config directory.
const APP_DIR_NAME: &str = "formrelay";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "FORMRELAY_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FORMRELAY_`, sections split by `__`)
/// 2. TOML config file at `~/.config/formrelay/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration.
    pub http: HttpConfig,
    /// Front door to decoder transport configuration.
    pub relay: RelayConfig,
    /// Store configuration.
    pub store: StoreConfig,
    /// Page and static file locations.
    pub assets: AssetsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address to listen on.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Which transport carries payloads.
    pub transport: Transport,
    /// Address the decoder listens on (UDP transport).
    pub host: String,
    /// Port the decoder listens on (UDP transport).
    pub port: u16,
    /// Maximum payload size; longer payloads are truncated.
    pub buffer_size: usize,
    /// Number of payloads the in-process queue holds.
    pub queue_capacity: usize,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the store document.
    pub data_dir: PathBuf,
    /// File name of the store document.
    pub file_name: String,
}

/// Asset directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory with `index.html`, `message.html` and `error.html`.
    pub templates_dir: PathBuf,
    /// Root for static files.
    pub static_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Udp,
            host: "127.0.0.1".to_string(),
            port: 5000,
            buffer_size: 1024,
            queue_capacity: 64,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_name: "data.json".to_string(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.http_addr()?;
        self.relay_addr()?;

        if self.relay.buffer_size == 0 {
            return Err(Error::validation("buffer_size must be greater than 0"));
        }

        if self.relay.queue_capacity == 0 {
            return Err(Error::validation("queue_capacity must be greater than 0"));
        }

        if self.relay.transport == Transport::Udp && self.relay.port == 0 {
            return Err(Error::validation(
                "relay port must be set when using the udp transport",
            ));
        }

        if self.store.file_name.trim().is_empty() {
            return Err(Error::validation("store file_name must not be empty"));
        }

        Ok(())
    }

    /// Socket address of the HTTP listener.
    ///
    /// # Errors
    ///
    /// Returns an error if `http.host` is not an IP address.
    pub fn http_addr(&self) -> Result<SocketAddr> {
        socket_addr("http.host", &self.http.host, self.http.port)
    }

    /// Socket address the decoder listens on.
    ///
    /// # Errors
    ///
    /// Returns an error if `relay.host` is not an IP address.
    pub fn relay_addr(&self) -> Result<SocketAddr> {
        socket_addr("relay.host", &self.relay.host, self.relay.port)
    }

    /// Full path of the store document.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.store.data_dir.join(&self.store.file_name)
    }
}

fn socket_addr(field: &str, host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .map_err(|_| Error::validation(format!("{field} is not an IP address: {host}")))?;
    Ok(SocketAddr::new(ip, port))
}
