//! Stream Deck host messages — inbound events and outbound commands.
//!
//! Only the subset the actions use is modeled. Messages are JSON objects
//! tagged by `event` and addressed by the action instance `context`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::ActionHost;
use crate::settings::SettingsMap;

/// Host → plugin events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    WillAppear {
        action: String,
        context: String,
        #[serde(default)]
        payload: Value,
    },
    WillDisappear {
        context: String,
    },
    DidReceiveSettings {
        context: String,
        #[serde(default)]
        payload: Value,
    },
    KeyUp {
        context: String,
        #[serde(default)]
        payload: Value,
    },
    DialRotate {
        context: String,
        #[serde(default)]
        payload: Value,
    },
    DialDown {
        context: String,
        #[serde(default)]
        payload: Value,
    },
    /// Any event the actions do not handle.
    #[serde(other)]
    Unhandled,
}

impl HostEvent {
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            HostEvent::WillAppear { context, .. }
            | HostEvent::WillDisappear { context }
            | HostEvent::DidReceiveSettings { context, .. }
            | HostEvent::KeyUp { context, .. }
            | HostEvent::DialRotate { context, .. }
            | HostEvent::DialDown { context, .. } => Some(context),
            HostEvent::Unhandled => None,
        }
    }
}

/// `payload.settings` of an event, when it is an object.
pub fn payload_settings(payload: &Value) -> Option<SettingsMap> {
    payload.get("settings").and_then(Value::as_object).cloned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitlePayload {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatePayload {
    pub state: u8,
}

/// Plugin → host commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundMessage {
    SetTitle {
        context: String,
        payload: TitlePayload,
    },
    SetState {
        context: String,
        payload: StatePayload,
    },
    SetSettings {
        context: String,
        payload: SettingsMap,
    },
    ShowOk {
        context: String,
    },
    ShowAlert {
        context: String,
    },
}

impl OutboundMessage {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// [`ActionHost`] that queues commands for one context.
pub struct ContextHost<'a> {
    context: &'a str,
    outbox: &'a mut Vec<OutboundMessage>,
}

impl<'a> ContextHost<'a> {
    pub fn new(context: &'a str, outbox: &'a mut Vec<OutboundMessage>) -> Self {
        ContextHost { context, outbox }
    }

    fn ctx(&self) -> String {
        self.context.to_string()
    }
}

impl ActionHost for ContextHost<'_> {
    fn set_state(&mut self, state: u8) {
        let context = self.ctx();
        self.outbox.push(OutboundMessage::SetState {
            context,
            payload: StatePayload { state },
        });
    }

    fn set_title(&mut self, title: &str) {
        let context = self.ctx();
        self.outbox.push(OutboundMessage::SetTitle {
            context,
            payload: TitlePayload {
                title: title.to_string(),
            },
        });
    }

    fn set_settings(&mut self, settings: &SettingsMap) {
        let context = self.ctx();
        self.outbox.push(OutboundMessage::SetSettings {
            context,
            payload: settings.clone(),
        });
    }

    fn show_ok(&mut self) {
        let context = self.ctx();
        self.outbox.push(OutboundMessage::ShowOk { context });
    }

    fn show_alert(&mut self) {
        let context = self.ctx();
        self.outbox.push(OutboundMessage::ShowAlert { context });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_will_appear() {
        let ev = HostEvent::parse(
            r#"{"event":"willAppear","action":"com.example.govee","context":"abc",
                "device":"dev1","payload":{"settings":{"api_key":"k"},"coordinates":{"column":0,"row":0}}}"#,
        )
        .unwrap();
        match &ev {
            HostEvent::WillAppear {
                action,
                context,
                payload,
            } => {
                assert_eq!(action, "com.example.govee");
                assert_eq!(context, "abc");
                assert_eq!(payload_settings(payload).unwrap()["api_key"], "k");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ev.context(), Some("abc"));
    }

    #[test]
    fn parse_dial_rotate_keeps_payload() {
        let ev = HostEvent::parse(
            r#"{"event":"dialRotate","context":"c1","payload":{"ticks":-2,"pressed":false}}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            HostEvent::DialRotate {
                context: "c1".into(),
                payload: json!({"ticks": -2, "pressed": false}),
            }
        );
    }

    #[test]
    fn parse_unknown_event() {
        let ev = HostEvent::parse(r#"{"event":"deviceDidConnect","device":"x"}"#).unwrap();
        assert_eq!(ev, HostEvent::Unhandled);
        assert_eq!(ev.context(), None);
    }

    #[test]
    fn parse_missing_payload_defaults_to_null() {
        let ev = HostEvent::parse(r#"{"event":"keyUp","context":"k"}"#).unwrap();
        assert_eq!(
            ev,
            HostEvent::KeyUp {
                context: "k".into(),
                payload: Value::Null
            }
        );
    }

    #[test]
    fn parse_garbage_is_protocol_error() {
        assert!(matches!(
            HostEvent::parse("not json"),
            Err(crate::GoveeDeckError::Protocol(_))
        ));
    }

    #[test]
    fn payload_settings_requires_object() {
        assert!(payload_settings(&json!({"settings": "nope"})).is_none());
        assert!(payload_settings(&Value::Null).is_none());
    }

    #[test]
    fn outbound_wire_format() {
        let msg = OutboundMessage::SetTitle {
            context: "c".into(),
            payload: TitlePayload {
                title: "On".into(),
            },
        };
        let v: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"event": "setTitle", "context": "c", "payload": {"title": "On"}}));

        let v = serde_json::to_value(OutboundMessage::ShowAlert { context: "c".into() }).unwrap();
        assert_eq!(v, json!({"event": "showAlert", "context": "c"}));

        let v = serde_json::to_value(OutboundMessage::SetState {
            context: "c".into(),
            payload: StatePayload { state: 1 },
        })
        .unwrap();
        assert_eq!(v["payload"]["state"], 1);
    }

    #[test]
    fn context_host_addresses_every_command() {
        let mut outbox = Vec::new();
        {
            let mut host = ContextHost::new("ctx-9", &mut outbox);
            host.set_state(0);
            host.set_title("Off");
            host.show_ok();
        }
        assert_eq!(outbox.len(), 3);
        for msg in &outbox {
            let v = serde_json::to_value(msg).unwrap();
            assert_eq!(v["context"], "ctx-9");
        }
    }
}
