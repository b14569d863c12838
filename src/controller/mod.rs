//! Temperature controller integration module
//!
//! - `client`: value store access (read, pending write, apply, sync check)
//! - `channels`: thermometer channel readings
//! - `heater`: mixing chamber heater parameters and unit conversion

pub mod client;
mod channels;
mod heater;

pub use client::ValueClient;
pub use heater::{HeaterSwitch, MAX_HEATER_POWER_UW, MIN_HEATER_POWER_UW};
