//! CLI subcommands — device listing and a one-shot power command.

mod control;
mod devices;

use std::process::ExitCode;

use clap::{Subcommand, ValueEnum};

pub(super) use govee_deck_lib::GoveeDeckError;
pub(super) use govee_deck_lib::client::{GoveeClient, HttpResponse, HttpTransport};
pub(super) use govee_deck_lib::config::Config;
pub(super) use govee_deck_lib::error::Result;
pub(super) use govee_deck_lib::settings::{ConfigError, Power};

/// Exit status for a missing credential.
pub const EXIT_MISSING_CREDENTIAL: u8 = 2;
/// Exit status for request, HTTP or parse failures.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PowerValue {
    On,
    Off,
}

impl From<PowerValue> for Power {
    fn from(v: PowerValue) -> Self {
        match v {
            PowerValue::On => Power::On,
            PowerValue::Off => Power::Off,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List the devices on a Govee account
    #[command(visible_alias = "fetch-devices")]
    Devices {
        /// Govee API key
        #[arg(long, env = "GOVEE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Print the response body as received
        #[arg(long, conflicts_with = "table")]
        raw: bool,
        /// Print one line per device instead of JSON
        #[arg(long)]
        table: bool,
    },

    /// Send a power command to one device
    #[command(visible_alias = "test-control")]
    Control {
        /// Govee API key
        #[arg(long, env = "GOVEE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Device id (MAC-like)
        #[arg(long, env = "GOVEE_DEVICE")]
        device: Option<String>,
        /// Device model code
        #[arg(long, env = "GOVEE_SKU")]
        sku: Option<String>,
        /// Power value to send
        #[arg(long, value_enum, default_value_t = PowerValue::On)]
        value: PowerValue,
        /// Print the response body as received
        #[arg(long)]
        raw: bool,
    },
}

/// First non-empty value of the flag/env value and the config file entry.
pub(super) fn resolve(
    from_args: Option<String>,
    from_config: &str,
    missing: ConfigError,
) -> Result<String> {
    from_args
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| Some(from_config.trim().to_string()).filter(|s| !s.is_empty()))
        .ok_or(GoveeDeckError::Config(missing))
}

pub(super) fn client(config: &Config) -> Result<GoveeClient<HttpTransport>> {
    Ok(GoveeClient::http(&config.base_url, config.timeout())?)
}

/// Print a response the way `--raw` or the default mode asks for.
///
/// Exit status follows the HTTP status; a body that is not JSON is printed
/// verbatim and counts as a failure unless `raw` was requested.
pub(super) fn print_response(response: &HttpResponse, raw: bool) -> ExitCode {
    let status = if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        log::warn!("HTTP {}", response.status);
        ExitCode::from(EXIT_FAILURE)
    };
    if raw {
        println!("{}", response.body);
        return status;
    }
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(body) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| response.body.clone())
            );
            status
        }
        Err(e) => {
            log::debug!("response is not JSON: {e}");
            println!("{}", response.body);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Exit status for an error returned by [`run`].
pub fn exit_status(e: &GoveeDeckError) -> u8 {
    match e {
        GoveeDeckError::Config(_) => EXIT_MISSING_CREDENTIAL,
        _ => EXIT_FAILURE,
    }
}

pub fn run(cmd: Command, config: &Config) -> Result<ExitCode> {
    match cmd {
        Command::Devices {
            api_key,
            raw,
            table,
        } => {
            let api_key = resolve(api_key, &config.api_key, ConfigError::MissingApiKey)?;
            devices::cmd_devices(config, &api_key, raw, table)
        }
        Command::Control {
            api_key,
            device,
            sku,
            value,
            raw,
        } => {
            let api_key = resolve(api_key, &config.api_key, ConfigError::MissingApiKey)?;
            let device = resolve(device, &config.device, ConfigError::MissingDevice)?;
            let sku = resolve(sku, &config.sku, ConfigError::MissingSku)?;
            control::cmd_control(config, &api_key, &device, &sku, value.into(), raw)
        }
    }
}
