//! Power toggle key.

use super::{ActionOutcome, toggle_power};
use crate::client::DeviceControl;
use crate::host::ActionHost;
use crate::settings::{DeviceSettings, KEY_POWER, Power, SettingsMap};

const LABEL: &str = "power";

/// A key that flips device power on every press.
#[derive(Debug, Clone)]
pub struct PowerToggleAction {
    context: String,
    settings: SettingsMap,
}

impl PowerToggleAction {
    /// Assumed power when nothing has been persisted yet.
    pub const DEFAULT_POWER: Power = Power::Off;

    pub fn new(context: impl Into<String>, settings: SettingsMap, host: &mut impl ActionHost) -> Self {
        let action = PowerToggleAction {
            context: context.into(),
            settings,
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

    /// Typed view of the current settings object.
    pub fn current(&self) -> DeviceSettings {
        DeviceSettings::from_map(&self.settings, Self::DEFAULT_POWER)
    }

    /// Replace the settings object without touching the display. A snapshot
    /// without `power` keeps the last known power.
    pub fn replace_settings(&mut self, mut settings: SettingsMap) {
        if !settings.contains_key(KEY_POWER) {
            settings.insert(KEY_POWER.to_string(), self.current().power.into());
        }
        self.settings = settings;
    }

    pub fn on_did_receive_settings(&mut self, settings: SettingsMap, host: &mut impl ActionHost) {
        self.replace_settings(settings);
        self.sync_display(host);
    }

    pub fn on_key_up(
        &mut self,
        control: &impl DeviceControl,
        host: &mut impl ActionHost,
    ) -> ActionOutcome {
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
        host.set_title(&current.title(current.power.label()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockControl;
    use crate::client::{ApiError, POWER_INSTANCE, POWER_TYPE};
    use crate::host::mock::{HostCall, RecordingHost};
    use crate::settings::ConfigError;
    use serde_json::json;

    fn configured(extra: serde_json::Value) -> SettingsMap {
        let mut m = json!({
            "api_key": "key-1",
            "device": "AA:BB:CC:DD:EE:FF:00:11",
            "sku": "H6008",
        })
        .as_object()
        .cloned()
        .unwrap();
        if let Some(extra) = extra.as_object() {
            m.extend(extra.clone());
        }
        m
    }

    #[test]
    fn construction_syncs_display() {
        let mut host = RecordingHost::new();
        PowerToggleAction::new("ctx", configured(json!({"power": "on"})), &mut host);
        assert_eq!(
            host.calls,
            vec![HostCall::SetState(1), HostCall::SetTitle("On".into())]
        );
    }

    #[test]
    fn default_power_is_off() {
        let mut host = RecordingHost::new();
        let action = PowerToggleAction::new("ctx", SettingsMap::new(), &mut host);
        assert_eq!(action.current().power, Power::Off);
        assert_eq!(host.last_title(), Some("Off"));
    }

    #[test]
    fn key_up_turns_device_on() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        let mut action = PowerToggleAction::new("ctx", configured(json!({"power": "off"})), &mut host);
        host.clear();

        let outcome = action.on_key_up(&control, &mut host);

        assert_eq!(outcome, ActionOutcome::PowerSet(Power::On));
        let call = control.last_call().unwrap();
        assert_eq!(call.capability.kind, POWER_TYPE);
        assert_eq!(call.capability.instance, POWER_INSTANCE);
        assert_eq!(call.capability.value, 1);
        assert_eq!(call.sku, "H6008");
        assert_eq!(host.last_settings().unwrap()["power"], "on");
        assert_eq!(host.last_state(), Some(1));
        assert_eq!(host.last_title(), Some("On"));
        assert_eq!(host.oks(), 1);
        assert_eq!(action.current().power, Power::On);
    }

    #[test]
    fn key_up_twice_turns_back_off() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        let mut action = PowerToggleAction::new("ctx", configured(json!({})), &mut host);
        action.on_key_up(&control, &mut host);
        let outcome = action.on_key_up(&control, &mut host);
        assert_eq!(outcome, ActionOutcome::PowerSet(Power::Off));
        assert_eq!(control.last_call().unwrap().capability.value, 0);
    }

    #[test]
    fn title_includes_device_name() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        let mut action = PowerToggleAction::new(
            "ctx",
            configured(json!({"device_name": "Desk Lamp"})),
            &mut host,
        );
        action.on_key_up(&control, &mut host);
        assert_eq!(host.last_title(), Some("Desk\nLamp\nOn"));
    }

    #[test]
    fn missing_api_key_alerts_without_request() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        let mut settings = configured(json!({}));
        settings.insert("api_key".into(), json!(""));
        let mut action = PowerToggleAction::new("ctx", settings, &mut host);
        host.clear();

        let outcome = action.on_key_up(&control, &mut host);

        assert_eq!(outcome, ActionOutcome::Misconfigured(ConfigError::MissingApiKey));
        assert_eq!(control.call_count(), 0);
        assert_eq!(host.calls, vec![HostCall::ShowAlert]);
    }

    #[test]
    fn placeholder_device_alerts_without_request() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        let mut action = PowerToggleAction::new(
            "ctx",
            configured(json!({"device": "YOUR_DEVICE_MAC"})),
            &mut host,
        );
        let outcome = action.on_key_up(&control, &mut host);
        assert_eq!(outcome, ActionOutcome::Misconfigured(ConfigError::MissingDevice));
        assert_eq!(control.call_count(), 0);
    }

    #[test]
    fn failed_request_leaves_state_unchanged() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        control.push_failure(ApiError::Status {
            status: 500,
            body: "oops".into(),
        });
        let mut action = PowerToggleAction::new("ctx", configured(json!({"power": "off"})), &mut host);
        host.clear();

        let outcome = action.on_key_up(&control, &mut host);

        assert!(matches!(outcome, ActionOutcome::Failed(_)));
        assert_eq!(host.calls, vec![HostCall::ShowAlert]);
        assert_eq!(action.current().power, Power::Off);
        assert_eq!(action.settings()["power"], "off");
    }

    #[test]
    fn settings_without_power_keep_previous_power() {
        let mut host = RecordingHost::new();
        let mut action = PowerToggleAction::new("ctx", configured(json!({"power": "on"})), &mut host);
        action.on_did_receive_settings(configured(json!({"device_name": "Lamp"})), &mut host);
        assert_eq!(action.current().power, Power::On);
        assert_eq!(host.last_title(), Some("Lamp\nOn"));
    }

    #[test]
    fn settings_with_power_override() {
        let mut host = RecordingHost::new();
        let mut action = PowerToggleAction::new("ctx", configured(json!({"power": "on"})), &mut host);
        action.on_did_receive_settings(configured(json!({"power": "off"})), &mut host);
        assert_eq!(action.current().power, Power::Off);
        assert_eq!(host.last_state(), Some(0));
    }

    #[test]
    fn persisted_settings_keep_other_keys() {
        let mut host = RecordingHost::new();
        let control = MockControl::new();
        let mut action = PowerToggleAction::new(
            "ctx",
            configured(json!({"custom": "kept"})),
            &mut host,
        );
        action.on_key_up(&control, &mut host);
        let saved = host.last_settings().unwrap();
        assert_eq!(saved["custom"], "kept");
        assert_eq!(saved["api_key"], "key-1");
    }
}
