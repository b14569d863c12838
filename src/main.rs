//! bftc - command line access to a Bluefors temperature controller
//!
//! Settings come from `config/default.toml`, `--config`, `BFTC__*`
//! environment variables and finally the flags below.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use bftc::{HeaterSwitch, Reading, Settings, SyncStatus, ValueClient};

#[derive(Parser, Debug)]
#[command(name = "bftc", version, about = "Bluefors temperature controller client")]
struct Cli {
    /// Extra configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller host or IP
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// API key
    #[arg(long, env = "BFTC_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Mixing chamber thermometer channel
    #[arg(long)]
    mxc_channel: Option<u32>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read temperature and resistance of channels
    Read {
        #[arg(default_values_t = [1u32, 2, 5, 6, 8])]
        channels: Vec<u32>,
    },
    /// Show mixing chamber heater status
    Heater,
    /// Set heater power in µW
    SetPower { microwatts: f64 },
    /// Set heater setpoint in mK
    SetSetpoint { millikelvin: f64 },
    /// Switch the heater on or off
    Switch { status: HeaterSwitch },
    /// Invert the heater switch
    Toggle,
    /// Switch PID mode on or off
    Pid { status: HeaterSwitch },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let builder = Settings::sources(cli.config.as_deref())
        .set_override_option("controller.host", cli.host)?
        .set_override_option("controller.port", cli.port.map(i64::from))?
        .set_override_option("controller.api_key", cli.key)?
        .set_override_option("controller.mixing_chamber_channel", cli.mxc_channel.map(i64::from))?
        .set_override_option("logging.debug", cli.debug.then_some(true))?;
    let settings = Settings::from_builder(builder).context("Loading settings")?;

    let _guard = bftc::logging::init(&settings.logging)?;
    tracing::debug!("Controller settings: {}:{}", settings.controller.host, settings.controller.port);

    let client = ValueClient::new(settings.controller)?;

    match cli.command {
        Command::Read { channels } => {
            for channel in channels {
                let temperature = client.channel_temperature(channel)?;
                let resistance = client.channel_resistance(channel)?;
                println!("Channel {} temp: {} Kelvin{}", channel, temperature.value, sync_note(&temperature));
                println!("Channel {} resistance: {} Ohm{}", channel, resistance.value, sync_note(&resistance));
            }
        }
        Command::Heater => {
            let status = client.mxc_heater_status()?;
            let power = client.mxc_heater_power()?;
            let pid = client.mxc_heater_pid_mode()?;
            let setpoint = client.mxc_heater_setpoint()?;
            println!("MXC heater status: {}{}", flag(status.value), sync_note(&status));
            println!("MXC heater power: {} uW{}", power.value, sync_note(&power));
            println!("MXC heater PID: {}{}", flag(pid.value), sync_note(&pid));
            println!("MXC heater setpoint: {} K{}", setpoint.value, sync_note(&setpoint));
        }
        Command::SetPower { microwatts } => report(client.set_mxc_heater_power(microwatts)?),
        Command::SetSetpoint { millikelvin } => {
            report(client.set_mxc_heater_setpoint(millikelvin)?)
        }
        Command::Switch { status } => report(client.switch_mxc_heater(status)?),
        Command::Toggle => report(client.toggle_mxc_heater()?),
        Command::Pid { status } => report(client.set_mxc_heater_pid_mode(status.is_on())?),
    }

    Ok(())
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "on",
        Some(false) => "off",
        None => "unknown",
    }
}

fn sync_note<T>(reading: &Reading<T>) -> String {
    if reading.is_synchronized() {
        String::new()
    } else {
        format!(" ({})", reading.status)
    }
}

fn report(status: SyncStatus) {
    if status.is_synchronized() {
        println!("Settings applied and synced");
    } else {
        println!("Settings applied, controller reports {}", status);
    }
}
