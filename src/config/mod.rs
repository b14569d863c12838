//! Configuration module
//!
//! Settings are read from `config/default.{toml,yaml,json}` when present, an
//! optional explicit file, then `BFTC__*` environment variables:
//!
//! ```toml
//! [controller]
//! host = "192.168.1.20"
//! port = 49098
//! api_key = "..."
//! mixing_chamber_channel = 6
//!
//! [logging]
//! debug = false
//! file = "logs/bftc.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

use crate::error::ClientResult;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub controller: ControllerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Static connection parameters of one temperature controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControllerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub mixing_chamber_channel: Option<u32>,
    #[serde(default = "default_heater_device")]
    pub mixing_chamber_heater: String,
    #[serde(default = "default_channel_prefix")]
    pub channel_device_prefix: String,
    /// Request timeout; unset or 0 means the transport default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            file: None,
            max_files: default_max_files(),
        }
    }
}

fn default_port() -> u16 {
    49098
}

fn default_heater_device() -> String {
    "mapper.heater_mappings_bftc.device.sample".to_string()
}

fn default_channel_prefix() -> String {
    "mapper.heater_mappings_bftc.device".to_string()
}

fn default_max_files() -> usize {
    12
}

impl ControllerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            api_key: None,
            mixing_chamber_channel: None,
            mixing_chamber_heater: default_heater_device(),
            channel_device_prefix: default_channel_prefix(),
            timeout_ms: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_mixing_chamber_channel(mut self, channel: u32) -> Self {
        self.mixing_chamber_channel = Some(channel);
        self
    }

    pub fn with_mixing_chamber_heater(mut self, device: impl Into<String>) -> Self {
        self.mixing_chamber_heater = device.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        // Sub-millisecond remainders round up
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// `https://<host>:<port>/`
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/", self.host, self.port)
    }
}

impl Settings {
    /// Load from `config/default`, then `extra` if given, then the environment.
    pub fn load(extra: Option<&Path>) -> ClientResult<Self> {
        Self::from_builder(Self::sources(extra))
    }

    /// Sources in precedence order, for callers that layer overrides on top.
    pub fn sources(extra: Option<&Path>) -> ConfigBuilder<DefaultState> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder.add_source(Self::environment())
    }

    /// `BFTC__SECTION__KEY` variables. Values stay strings until serde types
    /// them, so keys like `0012345` keep their leading zeros.
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix("BFTC").separator("__")
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> ClientResult<Self> {
        Ok(builder.build()?.try_deserialize()?)
    }
}
