//! Plugin dispatcher — routes host events to per-context action instances.
//!
//! The host transport (WebSocket, registration) lives outside this crate.
//! Feed each received message to [`Plugin::handle_message`] and send the
//! returned commands back in order.

use std::collections::HashMap;

use crate::actions::{ActionOutcome, BrightnessDialAction, PowerToggleAction};
use crate::client::DeviceControl;
use crate::protocol::{ContextHost, HostEvent, OutboundMessage, payload_settings};
use crate::settings::SettingsMap;

/// Action UUID suffix selecting the brightness dial; anything else is a power key.
pub const BRIGHTNESS_ACTION_SUFFIX: &str = ".brightness";

pub const POWER_ACTION_UUID: &str = "com.mirabox.streamdock.goveelightcontrol.govee";
pub const BRIGHTNESS_ACTION_UUID: &str = "com.mirabox.streamdock.goveelightcontrol.brightness";

/// One placed action instance.
#[derive(Debug, Clone)]
pub enum DeckAction {
    Power(PowerToggleAction),
    Brightness(BrightnessDialAction),
}

impl DeckAction {
    pub fn settings(&self) -> &SettingsMap {
        match self {
            DeckAction::Power(a) => a.settings(),
            DeckAction::Brightness(a) => a.settings(),
        }
    }

    fn replace_settings(&mut self, settings: SettingsMap) {
        match self {
            DeckAction::Power(a) => a.replace_settings(settings),
            DeckAction::Brightness(a) => a.replace_settings(settings),
        }
    }
}

pub struct Plugin<C> {
    control: C,
    actions: HashMap<String, DeckAction>,
}

impl<C: DeviceControl> Plugin<C> {
    pub fn new(control: C) -> Self {
        Plugin {
            control,
            actions: HashMap::new(),
        }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn action(&self, context: &str) -> Option<&DeckAction> {
        self.actions.get(context)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Decode one raw host message and handle it.
    pub fn handle_message(&mut self, raw: &str) -> crate::error::Result<Vec<OutboundMessage>> {
        let event = HostEvent::parse(raw)?;
        Ok(self.handle_event(event))
    }

    /// Handle one event, returning the commands to send back.
    pub fn handle_event(&mut self, event: HostEvent) -> Vec<OutboundMessage> {
        let mut outbox = Vec::new();
        match event {
            HostEvent::WillAppear {
                action,
                context,
                payload,
            } => {
                let settings = payload_settings(&payload).unwrap_or_default();
                let mut host = ContextHost::new(&context, &mut outbox);
                let instance = if action.ends_with(BRIGHTNESS_ACTION_SUFFIX) {
                    DeckAction::Brightness(BrightnessDialAction::new(
                        context.as_str(),
                        settings,
                        &mut host,
                    ))
                } else {
                    DeckAction::Power(PowerToggleAction::new(context.as_str(), settings, &mut host))
                };
                self.actions.insert(context, instance);
            }
            HostEvent::WillDisappear { context } => {
                if self.actions.remove(&context).is_some() {
                    log::debug!("removed action {context}");
                }
            }
            HostEvent::DidReceiveSettings { context, payload } => {
                let Some(instance) = self.actions.get_mut(&context) else {
                    log::debug!("didReceiveSettings for unknown context {context}");
                    return outbox;
                };
                let settings = payload_settings(&payload).unwrap_or_default();
                let mut host = ContextHost::new(&context, &mut outbox);
                match instance {
                    DeckAction::Power(a) => a.on_did_receive_settings(settings, &mut host),
                    DeckAction::Brightness(a) => a.on_did_receive_settings(settings, &mut host),
                }
            }
            HostEvent::KeyUp { context, payload } => {
                self.dispatch_input(&context, &payload, &mut outbox, |instance, control, host| {
                    match instance {
                        DeckAction::Power(a) => Some(a.on_key_up(control, host)),
                        DeckAction::Brightness(_) => None,
                    }
                });
            }
            HostEvent::DialRotate { context, payload } => {
                self.dispatch_input(&context, &payload, &mut outbox, |instance, control, host| {
                    match instance {
                        DeckAction::Brightness(a) => Some(a.on_dial_rotate(&payload, control, host)),
                        DeckAction::Power(_) => None,
                    }
                });
            }
            HostEvent::DialDown { context, payload } => {
                self.dispatch_input(&context, &payload, &mut outbox, |instance, control, host| {
                    match instance {
                        DeckAction::Brightness(a) => Some(a.on_dial_down(&payload, control, host)),
                        DeckAction::Power(_) => None,
                    }
                });
            }
            HostEvent::Unhandled => log::debug!("ignoring unhandled host event"),
        }
        outbox
    }

    /// Run a key/dial handler for `context`, refreshing its settings from the
    /// event payload first.
    fn dispatch_input<F>(
        &mut self,
        context: &str,
        payload: &serde_json::Value,
        outbox: &mut Vec<OutboundMessage>,
        handler: F,
    ) where
        F: FnOnce(&mut DeckAction, &C, &mut ContextHost<'_>) -> Option<ActionOutcome>,
    {
        let Some(instance) = self.actions.get_mut(context) else {
            log::debug!("input event for unknown context {context}");
            return;
        };
        if let Some(settings) = payload_settings(payload) {
            instance.replace_settings(settings);
        }
        let mut host = ContextHost::new(context, outbox);
        if let Some(outcome) = handler(instance, &self.control, &mut host) {
            log::debug!("{context}: {outcome:?}");
        }
    }
}
