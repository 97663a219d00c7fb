//! Per-action settings — derived from the host's persisted settings object.
//!
//! The host stores each action's settings as an untyped JSON object. Actions
//! never cache a typed view of it: every callback re-derives a
//! [`DeviceSettings`] from the current object, and successful changes are
//! written back by merging into that object.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::DeviceTarget;

/// Settings object as persisted by the host.
pub type SettingsMap = serde_json::Map<String, Value>;

/// Values starting with this prefix are template placeholders, not real ids.
pub const PLACEHOLDER_PREFIX: &str = "YOUR_";

pub const MIN_BRIGHTNESS: u8 = 1;
pub const MAX_BRIGHTNESS: u8 = 100;
pub const DEFAULT_BRIGHTNESS: u8 = 50;
pub const DEFAULT_STEP: u8 = 5;

/// Govee reports device groups under this SKU; groups have no brightness range.
const GROUP_SKU: &str = "SameModeGroup";

// Settings keys, as written by the property inspector.
pub const KEY_API_KEY: &str = "api_key";
pub const KEY_DEVICE: &str = "device";
pub const KEY_SKU: &str = "sku";
pub const KEY_DEVICE_NAME: &str = "device_name";
pub const KEY_POWER: &str = "power";
pub const KEY_BRIGHTNESS: &str = "brightness";
pub const KEY_STEP: &str = "step";
pub const KEY_SUPPORTS_BRIGHTNESS: &str = "supports_brightness";

// ── Power ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    Off,
}

impl Power {
    /// Parse the persisted `"on"` / `"off"` strings. Anything else is `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "on" => Some(Power::On),
            "off" => Some(Power::Off),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Power::On => Power::Off,
            Power::Off => Power::On,
        }
    }

    pub fn is_on(self) -> bool {
        self == Power::On
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Power::On => "on",
            Power::Off => "off",
        }
    }

    /// Title word shown on the key.
    pub fn label(self) -> &'static str {
        match self {
            Power::On => "On",
            Power::Off => "Off",
        }
    }

    /// Host visual state index: 1 = on, 0 = off.
    pub fn state_index(self) -> u8 {
        if self.is_on() { 1 } else { 0 }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Power> for Value {
    fn from(p: Power) -> Self {
        Value::String(p.as_str().to_string())
    }
}

// ── Configuration errors ──

/// Reasons an action cannot talk to the API with its current settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    /// Device id is empty or still a placeholder.
    MissingDevice,
    /// SKU is empty or still a placeholder.
    MissingSku,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => write!(f, "Missing API key"),
            ConfigError::MissingDevice => write!(f, "Missing device id (device MAC)"),
            ConfigError::MissingSku => write!(f, "Missing device sku"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn is_unset(value: &str) -> bool {
    value.is_empty() || value.starts_with(PLACEHOLDER_PREFIX)
}

// ── DeviceSettings ──

/// Typed view of one action's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub api_key: String,
    pub device: String,
    pub sku: String,
    pub device_name: String,
    pub power: Power,
    /// Always within `MIN_BRIGHTNESS..=MAX_BRIGHTNESS`.
    pub brightness: u8,
    /// Always within `1..=MAX_BRIGHTNESS`.
    pub step: u8,
    pub supports_brightness: bool,
}

impl DeviceSettings {
    /// Derive settings from the host object. `default_power` is used when
    /// `power` is missing or not one of `"on"` / `"off"`.
    pub fn from_map(map: &SettingsMap, default_power: Power) -> Self {
        let sku = string_field(map, KEY_SKU);
        let supports_brightness = match map.get(KEY_SUPPORTS_BRIGHTNESS) {
            None | Some(Value::Null) => sku != GROUP_SKU,
            Some(v) => truthy(v),
        };
        DeviceSettings {
            api_key: string_field(map, KEY_API_KEY),
            device: string_field(map, KEY_DEVICE),
            device_name: string_field(map, KEY_DEVICE_NAME),
            power: map
                .get(KEY_POWER)
                .and_then(Power::from_value)
                .unwrap_or(default_power),
            brightness: clamp_brightness(
                int_field(map, KEY_BRIGHTNESS).unwrap_or(DEFAULT_BRIGHTNESS.into()),
            ),
            step: int_field(map, KEY_STEP)
                .unwrap_or(DEFAULT_STEP.into())
                .clamp(1, MAX_BRIGHTNESS.into()) as u8,
            sku,
            supports_brightness,
        }
    }

    /// Check that the API key, device id and SKU are all usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if is_unset(&self.device) {
            return Err(ConfigError::MissingDevice);
        }
        if is_unset(&self.sku) {
            return Err(ConfigError::MissingSku);
        }
        Ok(())
    }

    /// Address this device for a control call.
    pub fn target(&self) -> DeviceTarget<'_> {
        DeviceTarget {
            api_key: &self.api_key,
            device: &self.device,
            sku: &self.sku,
        }
    }

    /// Key title: the device name (first space turned into a line break)
    /// above `status`, or `status` alone when no name is configured.
    pub fn title(&self, status: &str) -> String {
        format_title(&self.device_name, status)
    }
}

/// Clamp an arbitrary integer into the valid brightness range.
pub fn clamp_brightness(value: i64) -> u8 {
    value.clamp(MIN_BRIGHTNESS.into(), MAX_BRIGHTNESS.into()) as u8
}

pub fn format_title(device_name: &str, status: &str) -> String {
    if device_name.is_empty() {
        return status.to_string();
    }
    let name = device_name.replacen(' ', "\n", 1);
    format!("{name}\n{status}")
}

/// Copy `current` and overwrite the given keys, preserving everything else.
pub fn merge_settings<I>(current: &SettingsMap, updates: I) -> SettingsMap
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    let mut merged = current.clone();
    for (key, value) in updates {
        merged.insert(key.to_string(), value);
    }
    merged
}

fn string_field(map: &SettingsMap, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Lenient integer read: integers, floats (truncated), integer strings and
/// booleans. `None` for anything else so the caller can apply its default.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn int_field(map: &SettingsMap, key: &str) -> Option<i64> {
    map.get(key).and_then(coerce_int)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "y"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}
