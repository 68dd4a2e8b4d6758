//! Event-notification channel messages.
//!
//! The service pushes device events over one shared channel. Each message
//! names the listener surface it targets (`api` member) plus a numeric
//! event code and an optional payload object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The listener surface an event targets.
///
/// The wire discriminators are the legacy registration call names; the set
/// is closed, and messages with an unrecognized discriminator are dropped
/// by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Peripheral communication events.
    #[serde(rename = "startCommunication")]
    Communication,
    /// Keypad events.
    #[serde(rename = "startKeypadListen")]
    Keypad,
    /// Network status change events.
    #[serde(rename = "startEventListen")]
    Network,
}

/// One pushed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Target listener surface.
    pub api: EventKind,
    /// Numeric event code; meaning depends on the surface.
    pub event_code: i32,
    /// Optional payload object accompanying the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_object: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_uses_legacy_discriminators() {
        let wire: Value = serde_json::to_value(EventKind::Network).unwrap();
        assert_eq!(wire, json!("startEventListen"));
        let kind: EventKind = serde_json::from_value(json!("startKeypadListen")).unwrap();
        assert_eq!(kind, EventKind::Keypad);
    }

    #[test]
    fn unrecognized_discriminator_is_an_error() {
        let parsed: Result<EventKind, _> = serde_json::from_value(json!("stopEverything"));
        assert!(parsed.is_err());
    }

    #[test]
    fn message_payload_is_optional() {
        let msg: EventMessage =
            serde_json::from_str(r#"{"api":"startEventListen","eventCode":2}"#).unwrap();
        assert_eq!(msg.api, EventKind::Network);
        assert_eq!(msg.event_code, 2);
        assert!(msg.response_object.is_none());
    }

    #[test]
    fn message_round_trips_with_payload() {
        let msg = EventMessage {
            api: EventKind::Communication,
            event_code: 1,
            response_object: Some(json!({"port": "COM1"})),
        };
        let wire = serde_json::to_string(&msg).unwrap();
        let back: EventMessage = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, msg);
    }
}
