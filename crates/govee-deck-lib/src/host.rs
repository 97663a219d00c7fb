//! Host callback surface — what an action may ask the Stream Deck host to do.

use crate::settings::SettingsMap;

/// Commands an action sends back to the host for its own key or dial.
pub trait ActionHost {
    /// Select the visual state (0 = off image, 1 = on image).
    fn set_state(&mut self, state: u8);
    fn set_title(&mut self, title: &str);
    /// Persist the full settings object for this action instance.
    fn set_settings(&mut self, settings: &SettingsMap);
    /// Flash the success indicator.
    fn show_ok(&mut self);
    /// Flash the failure indicator.
    fn show_alert(&mut self);
}

/// In-memory host for unit and integration tests.
///
/// Always compiled, hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;

    /// One host command, in call order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum HostCall {
        SetState(u8),
        SetTitle(String),
        SetSettings(SettingsMap),
        ShowOk,
        ShowAlert,
    }

    /// Records every host command.
    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub calls: Vec<HostCall>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn clear(&mut self) {
            self.calls.clear();
        }

        pub fn alerts(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, HostCall::ShowAlert))
                .count()
        }

        pub fn oks(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, HostCall::ShowOk))
                .count()
        }

        pub fn last_title(&self) -> Option<&str> {
            self.calls.iter().rev().find_map(|c| match c {
                HostCall::SetTitle(t) => Some(t.as_str()),
                _ => None,
            })
        }

        pub fn last_state(&self) -> Option<u8> {
            self.calls.iter().rev().find_map(|c| match c {
                HostCall::SetState(s) => Some(*s),
                _ => None,
            })
        }

        pub fn last_settings(&self) -> Option<&SettingsMap> {
            self.calls.iter().rev().find_map(|c| match c {
                HostCall::SetSettings(s) => Some(s),
                _ => None,
            })
        }

        pub fn settings_writes(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, HostCall::SetSettings(_)))
                .count()
        }
    }

    impl ActionHost for RecordingHost {
        fn set_state(&mut self, state: u8) {
            self.calls.push(HostCall::SetState(state));
        }

        fn set_title(&mut self, title: &str) {
            self.calls.push(HostCall::SetTitle(title.to_string()));
        }

        fn set_settings(&mut self, settings: &SettingsMap) {
            self.calls.push(HostCall::SetSettings(settings.clone()));
        }

        fn show_ok(&mut self) {
            self.calls.push(HostCall::ShowOk);
        }

        fn show_alert(&mut self) {
            self.calls.push(HostCall::ShowAlert);
        }
    }
}
