//! `devices` subcommand — list the devices on a Govee account.

use std::process::ExitCode;

use govee_deck_lib::client::{DeviceInfo, parse_device_list};

use super::{Config, Result, client, print_response};

pub(super) fn cmd_devices(config: &Config, api_key: &str, raw: bool, table: bool) -> Result<ExitCode> {
    let response = client(config)?.list_devices_raw(api_key)?;
    log::debug!("GET /user/devices -> HTTP {}", response.status);

    if !table {
        return Ok(print_response(&response, raw));
    }

    let devices = parse_device_list(&response)?;
    if devices.is_empty() {
        println!("No Govee devices found.");
        return Ok(ExitCode::SUCCESS);
    }
    print!("{}", format_table(&devices));
    Ok(ExitCode::SUCCESS)
}

/// One aligned row per device: name, SKU, device id and brightness support.
fn format_table(devices: &[DeviceInfo]) -> String {
    let name_w = devices
        .iter()
        .map(|d| d.device_name.chars().count())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(0);
    let sku_w = devices
        .iter()
        .map(|d| d.sku.len())
        .chain(std::iter::once("SKU".len()))
        .max()
        .unwrap_or(0);
    let device_w = devices
        .iter()
        .map(|d| d.device.len())
        .chain(std::iter::once("DEVICE".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:<name_w$}  {:<sku_w$}  {:<device_w$}  BRIGHTNESS\n",
        "NAME", "SKU", "DEVICE"
    );
    for d in devices {
        let brightness = if d.supports_brightness() { "yes" } else { "no" };
        out.push_str(&format!(
            "{:<name_w$}  {:<sku_w$}  {:<device_w$}  {brightness}\n",
            d.device_name, d.sku, d.device
        ));
    }
    out
}
