//! Event dispatch.
//!
//! Pushed events arrive on one shared channel; the dispatcher routes each
//! to the handler registered for its kind. The kind set is closed
//! ([`EventKind`]); at most one handler per kind, registering replaces.
//! Network events additionally update the tracked [`NetworkStatus`] before
//! the handler runs.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use websql_protocol::{EventKind, EventMessage};

/// Registered event handler: receives the event code and the optional
/// payload object.
pub type EventHandler = Box<dyn Fn(i32, Option<&Value>) + Send + Sync>;

/// Connectivity reported by the service through network events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// No connectivity.
    Disconnected,
    /// Mobile data link.
    Mobile,
    /// Wired LAN link.
    Lan,
    /// Wireless LAN link.
    Wlan,
}

impl NetworkStatus {
    /// Maps a network event code onto a status. Unrecognized codes are
    /// not a status change.
    fn from_event_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(NetworkStatus::Disconnected),
            1 => Some(NetworkStatus::Mobile),
            2 => Some(NetworkStatus::Lan),
            6 => Some(NetworkStatus::Wlan),
            _ => None,
        }
    }
}

/// Routes pushed events to per-kind handlers and tracks network status.
pub struct EventDispatcher {
    handlers: RwLock<HashMap<EventKind, EventHandler>>,
    network: RwLock<NetworkStatus>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// Creates a dispatcher with no handlers. The network starts as LAN,
    /// the terminal's wired boot state.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: RwLock::new(HashMap::new()),
            network: RwLock::new(NetworkStatus::Lan),
        }
    }

    /// Registers (replacing) the handler for `kind`.
    pub fn set_handler(&self, kind: EventKind, handler: EventHandler) {
        self.handlers.write().insert(kind, handler);
    }

    /// Removes the handler for `kind`, if any.
    pub fn clear_handler(&self, kind: EventKind) {
        self.handlers.write().remove(&kind);
    }

    /// The last network status pushed by the service.
    pub fn network_status(&self) -> NetworkStatus {
        *self.network.read()
    }

    /// Decodes one pushed message and routes it. Undecodable input is
    /// dropped silently; events without a registered handler still update
    /// the network status.
    pub fn dispatch(&self, text: &str) {
        let message: EventMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "dropping undecodable event");
                return;
            }
        };

        if message.api == EventKind::Network {
            if let Some(status) = NetworkStatus::from_event_code(message.event_code) {
                *self.network.write() = status;
            }
        }

        let handlers = self.handlers.read();
        if let Some(handler) = handlers.get(&message.api) {
            handler(message.event_code, message.response_object.as_ref());
        }
    }
}
