//! # WebSQL Bridge Device Surface
//!
//! The collaborators the legacy terminal exposed next to its database
//! API: device capability calls (mostly canned on this side of the
//! bridge), a file read/write proxy, and the shared event-notification
//! channel with its dispatcher and auto-reconnecting listener.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod capabilities;
mod dispatch;
mod files;
mod listener;

pub use capabilities::{DeviceService, KeypadDisplay};
pub use dispatch::{EventDispatcher, EventHandler, NetworkStatus};
pub use files::FileStore;
pub use listener::{
    EventConnector, EventListener, EventSource, ReconnectPolicy, WsEventConnector, WsEventSource,
};

pub use websql_protocol::EventKind;
