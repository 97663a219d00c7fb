//! `control` subcommand — send one power command and show the reply.

use std::process::ExitCode;

use govee_deck_lib::client::{Capability, DeviceTarget};

use super::{Config, Power, Result, client, print_response};

pub(super) fn cmd_control(
    config: &Config,
    api_key: &str,
    device: &str,
    sku: &str,
    power: Power,
    raw: bool,
) -> Result<ExitCode> {
    let target = DeviceTarget {
        api_key,
        device,
        sku,
    };
    log::info!("setting {sku} {device} power {power}");
    let response = client(config)?.control_raw(&target, &Capability::power(power))?;
    log::debug!("POST /device/control -> HTTP {}", response.status);
    Ok(print_response(&response, raw))
}
