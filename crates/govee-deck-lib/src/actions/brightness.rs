//! Brightness dial: rotate to dim/brighten, press to toggle power.

use std::time::Instant;

use serde_json::Value;

use super::{ActionOutcome, toggle_power};
use crate::client::{Capability, DeviceControl};
use crate::dial::{DialGesture, extract_delta};
use crate::host::ActionHost;
use crate::settings::{DeviceSettings, KEY_BRIGHTNESS, Power, SettingsMap, clamp_brightness, merge_settings};

const LABEL: &str = "brightness";

#[derive(Debug, Clone)]
pub struct BrightnessDialAction {
    context: String,
    settings: SettingsMap,
    gesture: DialGesture,
    /// Set after the first "no brightness support" warning for this settings snapshot.
    warned_unsupported: bool,
}

impl BrightnessDialAction {
    /// Assumed power when nothing has been persisted yet.
    pub const DEFAULT_POWER: Power = Power::On;

    pub fn new(context: impl Into<String>, settings: SettingsMap, host: &mut impl ActionHost) -> Self {
        let action = BrightnessDialAction {
            context: context.into(),
            settings,
            gesture: DialGesture::new(),
            warned_unsupported: false,
        };
        action.sync_display(host);
        log::info!("{LABEL}: initialized with context {}", action.context);
        action
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn settings(&self) -> &SettingsMap {
        &self.settings
    }

    pub fn current(&self) -> DeviceSettings {
        DeviceSettings::from_map(&self.settings, Self::DEFAULT_POWER)
    }

    /// Replace the settings object without touching the display.
    pub fn replace_settings(&mut self, settings: SettingsMap) {
        self.settings = settings;
    }

    pub fn on_did_receive_settings(&mut self, settings: SettingsMap, host: &mut impl ActionHost) {
        self.replace_settings(settings);
        self.warned_unsupported = false;
        self.sync_display(host);
    }

    pub fn on_dial_rotate(
        &mut self,
        payload: &Value,
        control: &impl DeviceControl,
        host: &mut impl ActionHost,
    ) -> ActionOutcome {
        self.on_dial_rotate_at(payload, Instant::now(), control, host)
    }

    /// [`on_dial_rotate`](Self::on_dial_rotate) with an explicit event time.
    pub fn on_dial_rotate_at(
        &mut self,
        payload: &Value,
        now: Instant,
        control: &impl DeviceControl,
        host: &mut impl ActionHost,
    ) -> ActionOutcome {
        self.gesture.record_rotation(now);
        log::info!("{LABEL}: dialRotate payload: {payload}");

        let delta = extract_delta(payload);
        if delta == 0 {
            return ActionOutcome::NoOp;
        }

        let current = self.current();
        if !current.supports_brightness {
            if !self.warned_unsupported {
                log::warn!("{LABEL}: device does not support brightness control");
                self.warned_unsupported = true;
            }
            host.show_alert();
            return ActionOutcome::Unsupported;
        }
        if let Err(e) = current.validate() {
            log::error!("{LABEL}: {e}");
            host.show_alert();
            return ActionOutcome::Misconfigured(e);
        }

        let step = i64::from(current.step).saturating_mul(delta);
        let new_value = clamp_brightness(i64::from(current.brightness).saturating_add(step));
        if new_value == current.brightness {
            return ActionOutcome::NoOp;
        }

        match control.set_capability(&current.target(), &Capability::brightness(new_value)) {
            Ok(()) => {
                log::info!("{LABEL}: brightness set to {new_value}");
                self.settings = merge_settings(&self.settings, [(KEY_BRIGHTNESS, new_value.into())]);
                host.set_settings(&self.settings);
                self.sync_display(host);
                host.show_ok();
                ActionOutcome::BrightnessSet(new_value)
            }
            Err(e) => {
                log::error!("{LABEL}: {e}");
                host.show_alert();
                ActionOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn on_dial_down(
        &mut self,
        payload: &Value,
        control: &impl DeviceControl,
        host: &mut impl ActionHost,
    ) -> ActionOutcome {
        self.on_dial_down_at(payload, Instant::now(), control, host)
    }

    /// [`on_dial_down`](Self::on_dial_down) with an explicit event time.
    pub fn on_dial_down_at(
        &mut self,
        payload: &Value,
        now: Instant,
        control: &impl DeviceControl,
        host: &mut impl ActionHost,
    ) -> ActionOutcome {
        if let Some(reason) = self.gesture.classify_press(payload, now) {
            log::info!("{LABEL}: ignoring dialDown ({reason:?}): {payload}");
            return ActionOutcome::Suppressed(reason);
        }
        log::info!("{LABEL}: dialDown payload: {payload}");

        let current = self.current();
        let (outcome, merged) = toggle_power(LABEL, &self.settings, &current, control, host);
        if let Some(merged) = merged {
            self.settings = merged;
            self.sync_display(host);
            host.show_ok();
        }
        outcome
    }

    fn sync_display(&self, host: &mut impl ActionHost) {
        let current = self.current();
        host.set_state(current.power.state_index());
        host.set_title(&current.title(&format!("{}%", current.brightness)));
    }
}
