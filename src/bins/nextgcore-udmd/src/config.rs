//! UDM Configuration
//!
//! The `udm:` section of the daemon's YAML file:
//!
//! ```yaml
//! udm:
//!   sbi:
//!     addr: 127.0.0.12
//!     port: 7777
//!     advertise: udm.5gc.local
//!   nrf:
//!     uri: http://127.0.0.10:7777
//!   udr:
//!     uri: http://127.0.0.20:7777
//!   notifier:
//!     workers: 4
//!     queue_depth: 1024
//!   max_ue: 1024
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use ogs_sbi::UriScheme;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SBI_ADDR: &str = "0.0.0.0";
pub const DEFAULT_SBI_PORT: u16 = 7777;
pub const DEFAULT_MAX_UE: usize = 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid SBI address {0}")]
    InvalidAddr(String),

    #[error("SBI address {0} is a wildcard; set udm.sbi.advertise")]
    NoAdvertiseAddr(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SbiConfig {
    pub addr: String,
    pub port: u16,
    /// Host placed in `Location` headers; defaults to `addr`
    pub advertise: Option<String>,
}

impl Default for SbiConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_SBI_ADDR.to_string(),
            port: DEFAULT_SBI_PORT,
            advertise: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub workers: usize,
    pub queue_depth: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_depth: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UdmConfig {
    pub sbi: SbiConfig,
    pub nrf: PeerConfig,
    pub udr: PeerConfig,
    pub notifier: NotifierConfig,
    pub max_ue: usize,
}

impl Default for UdmConfig {
    fn default() -> Self {
        Self {
            sbi: SbiConfig::default(),
            nrf: PeerConfig::default(),
            udr: PeerConfig::default(),
            notifier: NotifierConfig::default(),
            max_ue: DEFAULT_MAX_UE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    udm: Option<UdmConfig>,
}

impl UdmConfig {
    /// Parse the `udm:` section out of a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: Option<ConfigFile> = serde_yaml::from_str(content)?;
        match file.and_then(|f| f.udm) {
            Some(udm) => Ok(udm),
            None => {
                log::warn!("No 'udm' section in config file");
                Ok(Self::default())
            }
        }
    }

    /// Load `path`. A missing file keeps the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file '{}' not found. Using defaults.", path.display());
            return Ok(Self::default());
        }

        log::info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn sbi_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .sbi
            .addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(self.sbi.addr.clone()))?;
        Ok(SocketAddr::new(ip, self.sbi.port))
    }

    /// Advertised `http://host:port` of this UDM. A wildcard bind address
    /// cannot be advertised, so `advertise` is required with one.
    pub fn sbi_uri(&self) -> Result<String, ConfigError> {
        let host = match self.sbi.advertise.as_deref() {
            Some(host) => host,
            None => {
                let wildcard = self
                    .sbi
                    .addr
                    .parse::<IpAddr>()
                    .is_ok_and(|ip| ip.is_unspecified());
                if wildcard {
                    return Err(ConfigError::NoAdvertiseAddr(self.sbi.addr.clone()));
                }
                self.sbi.addr.as_str()
            }
        };

        if host.contains(':') {
            Ok(format!("{}://[{host}]:{}", UriScheme::Http, self.sbi.port))
        } else {
            Ok(format!("{}://{host}:{}", UriScheme::Http, self.sbi.port))
        }
    }
}
