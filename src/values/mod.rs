//! Value model of the controller's values API
//!
//! - `schema`: typed wire envelopes and the decode step

pub mod schema;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

// ============================================================================
// References
// ============================================================================

/// Named targets exposed by the temperature controller mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Temperature,
    Resistance,
    Active,
    Power,
    Setpoint,
    PidMode,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Temperature => "temperature",
            Target::Resistance => "resistance",
            Target::Active => "active",
            Target::Power => "power",
            Target::Setpoint => "setpoint",
            Target::PidMode => "pid_mode",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Target::Temperature),
            "resistance" => Ok(Target::Resistance),
            "active" => Ok(Target::Active),
            "power" => Ok(Target::Power),
            "setpoint" => Ok(Target::Setpoint),
            "pid_mode" => Ok(Target::PidMode),
            other => Err(ClientError::Config(format!("Unknown target: {}", other))),
        }
    }
}

/// One named scalar inside the controller's device tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueRef {
    pub device: String,
    pub target: String,
}

impl ValueRef {
    pub fn new(device: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            target: target.into(),
        }
    }

    /// Key used in request and response bodies: `<device>.<target>`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// URL path segments below `/values/`.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.device
            .split('.')
            .chain(std::iter::once(self.target.as_str()))
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.device, self.target)
    }
}

// ============================================================================
// Values
// ============================================================================

/// Content of a value slot as it travels on the wire.
///
/// Numeric targets (temperature, power, ...) are JSON numbers, switch-like
/// targets (`active`, `pid_mode`) are the strings `"1"` and `"0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceValue {
    Number(f64),
    Text(String),
}

impl DeviceValue {
    /// Placeholder carried by readings that never reached the controller.
    pub fn nan() -> Self {
        DeviceValue::Number(f64::NAN)
    }

    pub fn from_bool(value: bool) -> Self {
        DeviceValue::Text(if value { "1" } else { "0" }.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DeviceValue::Number(v) => Some(*v),
            DeviceValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DeviceValue::Text(s) => match s.trim() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            DeviceValue::Number(v) if *v == 1.0 => Some(true),
            DeviceValue::Number(v) if *v == 0.0 => Some(false),
            DeviceValue::Number(_) => None,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, DeviceValue::Number(v) if v.is_nan())
    }
}

impl From<f64> for DeviceValue {
    fn from(value: f64) -> Self {
        DeviceValue::Number(value)
    }
}

impl From<bool> for DeviceValue {
    fn from(value: bool) -> Self {
        DeviceValue::from_bool(value)
    }
}

impl From<&str> for DeviceValue {
    fn from(value: &str) -> Self {
        DeviceValue::Text(value.to_string())
    }
}

impl fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceValue::Number(v) => write!(f, "{}", v),
            DeviceValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

// ============================================================================
// Synchronization
// ============================================================================

/// Whether the controller firmware has applied a value to the hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synchronized,
    /// Any other status string the controller reports, kept verbatim.
    Pending(String),
    /// Reported by the controller, or the request never completed.
    Error,
    /// The response carried no status field.
    Unknown,
}

impl SyncStatus {
    pub const SYNCHRONIZED: &'static str = "SYNCHRONIZED";
    pub const ERROR: &'static str = "ERROR";

    pub fn from_wire(status: Option<&str>) -> Self {
        match status {
            Some(Self::SYNCHRONIZED) => SyncStatus::Synchronized,
            Some(Self::ERROR) => SyncStatus::Error,
            Some(other) => SyncStatus::Pending(other.to_string()),
            None => SyncStatus::Unknown,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        matches!(self, SyncStatus::Synchronized)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synchronized => f.write_str(Self::SYNCHRONIZED),
            SyncStatus::Pending(raw) => f.write_str(raw),
            SyncStatus::Error => f.write_str(Self::ERROR),
            SyncStatus::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A value together with the synchronization state it was read in.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub status: SyncStatus,
    pub received_at: DateTime<Utc>,
}

impl<T> Reading<T> {
    pub fn new(value: T, status: SyncStatus) -> Self {
        Self {
            value,
            status,
            received_at: Utc::now(),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.status.is_synchronized()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        Reading {
            value: f(self.value),
            status: self.status,
            received_at: self.received_at,
        }
    }
}

impl Reading<DeviceValue> {
    /// Sentinel for a read that could not reach the controller.
    pub fn unreachable() -> Self {
        Reading::new(DeviceValue::nan(), SyncStatus::Error)
    }

    /// Numeric view; the unreachable sentinel stays NaN.
    pub fn into_f64(self, value_ref: &ValueRef) -> ClientResult<Reading<f64>> {
        match self.value.as_f64() {
            Some(v) => Ok(self.map(|_| v)),
            None => Err(ClientError::UnexpectedValue {
                query: value_ref.key(),
                value: self.value.to_string(),
            }),
        }
    }

    /// Switch view; `None` when the controller could not be read.
    pub fn into_bool(self, value_ref: &ValueRef) -> ClientResult<Reading<Option<bool>>> {
        if self.status.is_error() && self.value.is_nan() {
            return Ok(self.map(|_| None));
        }
        match self.value.as_bool() {
            Some(v) => Ok(self.map(|_| Some(v))),
            None => Err(ClientError::UnexpectedValue {
                query: value_ref.key(),
                value: self.value.to_string(),
            }),
        }
    }
}
