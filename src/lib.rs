//! bftc - Bluefors temperature controller client
//!
//! Reads thermometer channels and reads/writes the mixing chamber heater
//! through the controller's HTTPS values API. Every read reports whether the
//! value is synchronized with the hardware; every write is applied and then
//! verified by reading it back.
//!
//! ```no_run
//! use bftc::{ControllerConfig, ValueClient};
//!
//! let config = ControllerConfig::new("192.168.1.20")
//!     .with_api_key("0123456789abcdef")
//!     .with_mixing_chamber_channel(6);
//! let client = ValueClient::new(config)?;
//!
//! let temperature = client.mxc_temperature()?;
//! println!("MXC: {} K (synchronized: {})", temperature.value, temperature.is_synchronized());
//!
//! let status = client.set_mxc_heater_power(150.0)?;
//! println!("Heater power write: {}", status);
//! # Ok::<(), bftc::ClientError>(())
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod transport;
pub mod values;

pub use config::{ControllerConfig, LoggingConfig, Settings};
pub use controller::{HeaterSwitch, ValueClient};
pub use error::{ApiError, ClientError, ClientResult, TransportError};
pub use transport::{HttpTransport, Transport};
pub use values::{DeviceValue, Reading, SyncStatus, Target, ValueRef};
