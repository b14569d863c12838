//! Mixing chamber heater parameters
//!
//! The controller stores power in W and setpoint in K. Power is exposed in
//! µW, setpoint is written in mK and read back in K. `active` and `pid_mode`
//! are `"1"`/`"0"` strings on the wire.

use std::fmt;
use std::str::FromStr;

use super::ValueClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;
use crate::values::{DeviceValue, Reading, SyncStatus, Target, ValueRef};

pub const MIN_HEATER_POWER_UW: f64 = 0.0;
pub const MAX_HEATER_POWER_UW: f64 = 1000.0;

const MICROWATTS_PER_WATT: f64 = 1e6;
const MILLIKELVIN_PER_KELVIN: f64 = 1000.0;

/// Requested heater switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterSwitch {
    On,
    Off,
}

impl HeaterSwitch {
    pub fn is_on(&self) -> bool {
        matches!(self, HeaterSwitch::On)
    }
}

impl FromStr for HeaterSwitch {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" => Ok(HeaterSwitch::On),
            "off" => Ok(HeaterSwitch::Off),
            _ => Err(ClientError::Config(format!(
                "Invalid status '{}', must be 'on' or 'off'",
                s
            ))),
        }
    }
}

impl fmt::Display for HeaterSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_on() { "on" } else { "off" })
    }
}

impl<T: Transport> ValueClient<T> {
    fn heater_ref(&self, target: &str) -> ClientResult<ValueRef> {
        // Heater mapping is tied to the mixing chamber thermometer
        self.mxc_channel()?;
        Ok(ValueRef::new(
            self.config().mixing_chamber_heater.clone(),
            target,
        ))
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    pub fn mxc_heater_value(&self, target: &str) -> ClientResult<Reading<DeviceValue>> {
        let value_ref = self.heater_ref(target)?;
        let _enter = self.span().enter();
        self.read(&value_ref)
    }

    pub fn set_mxc_heater_value(
        &self,
        target: &str,
        value: impl Into<DeviceValue>,
    ) -> ClientResult<SyncStatus> {
        let value_ref = self.heater_ref(target)?;
        let value = value.into();
        let _enter = self.span().enter();
        tracing::info!("Mixing Chamber Heater: Setting {} to {}", target, value);
        self.write(&value_ref, value)
    }

    /// Whether a heater value is synchronized. Like every heater accessor this
    /// needs the mixing chamber channel configured, even though the heater
    /// device itself does not depend on it.
    pub fn mxc_heater_synced(&self, target: &str) -> ClientResult<bool> {
        Ok(self.mxc_heater_value(target)?.is_synchronized())
    }

    fn mxc_heater_number(&self, target: Target) -> ClientResult<Reading<f64>> {
        let value_ref = self.heater_ref(target.as_str())?;
        self.mxc_heater_value(target.as_str())?.into_f64(&value_ref)
    }

    fn mxc_heater_flag(&self, target: Target) -> ClientResult<Reading<Option<bool>>> {
        let value_ref = self.heater_ref(target.as_str())?;
        self.mxc_heater_value(target.as_str())?.into_bool(&value_ref)
    }

    // ========================================================================
    // Switch
    // ========================================================================

    /// Heater on/off; `None` when the controller could not be read.
    pub fn mxc_heater_status(&self) -> ClientResult<Reading<Option<bool>>> {
        self.mxc_heater_flag(Target::Active)
    }

    pub fn set_mxc_heater_status(&self, active: bool) -> ClientResult<SyncStatus> {
        self.set_mxc_heater_value(Target::Active.as_str(), DeviceValue::from_bool(active))
    }

    pub fn switch_mxc_heater(&self, switch: HeaterSwitch) -> ClientResult<SyncStatus> {
        self.set_mxc_heater_status(switch.is_on())
    }

    /// Read the current heater status and write its negation.
    pub fn toggle_mxc_heater(&self) -> ClientResult<SyncStatus> {
        let current = self.mxc_heater_status()?;
        match current.value {
            Some(active) => self.set_mxc_heater_status(!active),
            None => Err(ClientError::UnexpectedValue {
                query: self.heater_ref(Target::Active.as_str())?.key(),
                value: format!("unreadable (status {})", current.status),
            }),
        }
    }

    // ========================================================================
    // Power
    // ========================================================================

    /// Heater power in µW.
    pub fn mxc_heater_power(&self) -> ClientResult<Reading<f64>> {
        Ok(self
            .mxc_heater_number(Target::Power)?
            .map(|watts| watts * MICROWATTS_PER_WATT))
    }

    /// Set heater power in µW, limited to 0..=1000 µW.
    pub fn set_mxc_heater_power(&self, power_uw: f64) -> ClientResult<SyncStatus> {
        if !(MIN_HEATER_POWER_UW..=MAX_HEATER_POWER_UW).contains(&power_uw) {
            return Err(ClientError::OutOfRange {
                what: "heater power (uW)",
                value: power_uw,
                min: MIN_HEATER_POWER_UW,
                max: MAX_HEATER_POWER_UW,
            });
        }
        self.set_mxc_heater_value(Target::Power.as_str(), power_uw / MICROWATTS_PER_WATT)
    }

    // ========================================================================
    // Setpoint
    // ========================================================================

    /// Setpoint in K.
    pub fn mxc_heater_setpoint(&self) -> ClientResult<Reading<f64>> {
        self.mxc_heater_number(Target::Setpoint)
    }

    /// Set the setpoint, given in mK.
    pub fn set_mxc_heater_setpoint(&self, setpoint_mk: f64) -> ClientResult<SyncStatus> {
        self.set_mxc_heater_value(
            Target::Setpoint.as_str(),
            setpoint_mk / MILLIKELVIN_PER_KELVIN,
        )
    }

    // ========================================================================
    // PID mode
    // ========================================================================

    /// Whether closed-loop PID control is on; `None` when unreadable.
    pub fn mxc_heater_pid_mode(&self) -> ClientResult<Reading<Option<bool>>> {
        self.mxc_heater_flag(Target::PidMode)
    }

    pub fn set_mxc_heater_pid_mode(&self, enabled: bool) -> ClientResult<SyncStatus> {
        self.set_mxc_heater_value(Target::PidMode.as_str(), DeviceValue::from_bool(enabled))
    }
}
