//! Thermometer channel readings

use super::ValueClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;
use crate::values::{DeviceValue, Reading, Target, ValueRef};

impl<T: Transport> ValueClient<T> {
    /// Device identifier of a thermometer channel, e.g. `mapper.heater_mappings_bftc.device.c6`.
    pub fn channel_device(&self, channel: u32) -> String {
        format!("{}.c{}", self.config().channel_device_prefix, channel)
    }

    pub fn channel_value(&self, channel: u32, target: Target) -> ClientResult<Reading<DeviceValue>> {
        let _enter = self.span().enter();
        tracing::info!("Requesting value: {} from channel {}", target, channel);
        self.read(&ValueRef::new(self.channel_device(channel), target.as_str()))
    }

    /// Temperature in Kelvin.
    pub fn channel_temperature(&self, channel: u32) -> ClientResult<Reading<f64>> {
        self.channel_number(channel, Target::Temperature)
    }

    /// Resistance in Ohm.
    pub fn channel_resistance(&self, channel: u32) -> ClientResult<Reading<f64>> {
        self.channel_number(channel, Target::Resistance)
    }

    /// Configured mixing chamber channel.
    pub fn mxc_channel(&self) -> ClientResult<u32> {
        self.config()
            .mixing_chamber_channel
            .ok_or_else(|| ClientError::Config("Mixing chamber channel ID not configured".to_string()))
    }

    pub fn mxc_temperature(&self) -> ClientResult<Reading<f64>> {
        let channel = self.mxc_channel()?;
        self.channel_temperature(channel)
    }

    pub fn mxc_resistance(&self) -> ClientResult<Reading<f64>> {
        let channel = self.mxc_channel()?;
        self.channel_resistance(channel)
    }

    fn channel_number(&self, channel: u32, target: Target) -> ClientResult<Reading<f64>> {
        let value_ref = ValueRef::new(self.channel_device(channel), target.as_str());
        self.channel_value(channel, target)?.into_f64(&value_ref)
    }
}
