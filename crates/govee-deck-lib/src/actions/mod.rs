//! Stream Deck actions — a power toggle key and a brightness dial.
//!
//! Each action owns only its host settings object. Every callback derives a
//! fresh [`DeviceSettings`] from it, talks to the device through
//! [`DeviceControl`], and reports back through [`ActionHost`]. The settings
//! object is only rewritten after the device confirmed the change.

mod brightness;
mod power;

pub use brightness::BrightnessDialAction;
pub use power::PowerToggleAction;

use crate::client::{Capability, DeviceControl};
use crate::dial::PressSuppression;
use crate::host::ActionHost;
use crate::settings::{ConfigError, DeviceSettings, KEY_POWER, Power, SettingsMap, merge_settings};

/// What a callback ended up doing. Returned for logging and tests; the host
/// has already been updated by the time the caller sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Nothing to do (zero rotation, value already at the limit).
    NoOp,
    /// A dial press that was really part of a rotation.
    Suppressed(PressSuppression),
    /// Rotation on a device without a brightness range.
    Unsupported,
    Misconfigured(ConfigError),
    PowerSet(Power),
    BrightnessSet(u8),
    /// Remote call failed; local state untouched.
    Failed(String),
}

/// Validate, send `target` power, and persist it on success.
///
/// Returns the merged settings object to store when the device confirmed the
/// change. The caller refreshes its display and shows the indicator.
pub(crate) fn toggle_power(
    label: &str,
    stored: &SettingsMap,
    current: &DeviceSettings,
    control: &impl DeviceControl,
    host: &mut impl ActionHost,
) -> (ActionOutcome, Option<SettingsMap>) {
    let target = current.power.toggled();
    if let Err(e) = current.validate() {
        log::error!("{label}: {e}");
        host.show_alert();
        return (ActionOutcome::Misconfigured(e), None);
    }
    match control.set_capability(&current.target(), &Capability::power(target)) {
        Ok(()) => {
            log::info!("{label}: power set to {target}");
            let merged = merge_settings(stored, [(KEY_POWER, target.into())]);
            host.set_settings(&merged);
            (ActionOutcome::PowerSet(target), Some(merged))
        }
        Err(e) => {
            log::error!("{label}: power request failed: {e}");
            host.show_alert();
            (ActionOutcome::Failed(e.to_string()), None)
        }
    }
}
