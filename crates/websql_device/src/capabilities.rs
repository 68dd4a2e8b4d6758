//! Device capability surface.
//!
//! The legacy terminal exposed a bag of device calls next to the database
//! API. Most of them are canned on this side of the bridge: the values
//! below are the ones the terminal firmware reported, kept so callers of
//! the legacy surface keep working. Only database removal and network
//! status reach outside this struct.

use std::sync::Arc;

use websql_client::{ClientError, ClientResult, ControlEndpoint};
use websql_protocol::{routes, EventKind};

use crate::dispatch::{EventDispatcher, EventHandler, NetworkStatus};

/// Canned keypad LED pattern.
const KEYPAD_LED_PATTERN: &str = "000000";
/// Canned sound playback id.
const SOUND_ID: u32 = 9999;
/// Canned terminal identifier.
const TERMINAL_ID: &str = "00000000";
/// Canned firmware version.
const FIRMWARE_VERSION: &str = "5.00r000000";
/// Canned contents-set version.
const CONTENTS_SET_VERSION: &str = "000";

/// Two-line keypad display contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypadDisplay {
    /// Upper line.
    pub first_line: String,
    /// Lower line.
    pub second_line: String,
}

/// Device capability stubs plus the few calls that reach the service.
pub struct DeviceService {
    endpoint: Arc<dyn ControlEndpoint>,
    dispatcher: Arc<EventDispatcher>,
}

impl DeviceService {
    /// Creates the service over the given control endpoint and event
    /// dispatcher.
    pub fn new(endpoint: Arc<dyn ControlEndpoint>, dispatcher: Arc<EventDispatcher>) -> Self {
        DeviceService {
            endpoint,
            dispatcher,
        }
    }

    /// Whether a keypad is attached. Always true on this bridge.
    pub fn is_keypad_connected(&self) -> bool {
        true
    }

    /// Current keypad LED pattern.
    pub fn keypad_led(&self) -> &'static str {
        KEYPAD_LED_PATTERN
    }

    /// Sets the keypad LED pattern. Accepted and ignored.
    pub fn set_keypad_led(&self, pattern: &str) {
        tracing::debug!(pattern, "keypad led update ignored");
    }

    /// Shows `text` on the keypad display. Accepted and ignored.
    pub fn set_keypad_display(&self, text: &str) {
        tracing::debug!(text, "keypad display update ignored");
    }

    /// Current keypad display contents. Always two empty lines.
    pub fn keypad_display(&self) -> KeypadDisplay {
        KeypadDisplay::default()
    }

    /// Starts sound playback; returns the playback id.
    pub fn play_sound(&self, _sound: &str) -> u32 {
        SOUND_ID
    }

    /// Stops a playback started by [`DeviceService::play_sound`].
    pub fn stop_sound(&self, playback_id: u32) {
        tracing::debug!(playback_id, "sound stop ignored");
    }

    /// Last network status pushed over the event channel.
    pub fn network_status(&self) -> NetworkStatus {
        self.dispatcher.network_status()
    }

    /// Terminal identifier.
    pub fn terminal_id(&self) -> &'static str {
        TERMINAL_ID
    }

    /// Firmware version string.
    pub fn firmware_version(&self) -> &'static str {
        FIRMWARE_VERSION
    }

    /// Contents-set version string.
    pub fn contents_set_version(&self) -> &'static str {
        CONTENTS_SET_VERSION
    }

    /// Sets the terminal date. Accepted and ignored.
    pub fn set_date(&self, date: &str) {
        tracing::debug!(date, "date update ignored");
    }

    /// Requests a reboot. Accepted and ignored.
    pub fn reboot(&self) {
        tracing::debug!("reboot request ignored");
    }

    /// Requests a shutdown. Accepted and ignored.
    pub fn shutdown(&self) {
        tracing::debug!("shutdown request ignored");
    }

    /// Sets display brightness. Accepted and ignored.
    pub fn set_display_brightness(&self, level: u8) {
        tracing::debug!(level, "brightness update ignored");
    }

    /// Current display brightness. Always zero.
    pub fn display_brightness(&self) -> u8 {
        0
    }

    /// Starts listening for terminal-bound HTTP requests. Accepted and
    /// ignored.
    pub fn start_http_request_listen(&self) {
        tracing::debug!("http request listen ignored");
    }

    /// Stops the HTTP request listener. Accepted and ignored.
    pub fn stop_http_request_listen(&self) {
        tracing::debug!("http request listen stop ignored");
    }

    /// Answers a terminal-bound HTTP request. Accepted and ignored.
    pub fn send_http_response(&self, body: &str) {
        tracing::debug!(body, "http response ignored");
    }

    /// Clears the settings password. Accepted and ignored.
    pub fn clear_settings_password(&self) {
        tracing::debug!("settings password clear ignored");
    }

    /// Registers the handler for one listener surface. Replaces any
    /// previous handler of the same kind.
    pub fn start_listen(&self, kind: EventKind, handler: EventHandler) {
        self.dispatcher.set_handler(kind, handler);
    }

    /// Unregisters the handler for one listener surface.
    pub fn stop_listen(&self, kind: EventKind) {
        self.dispatcher.clear_handler(kind);
    }

    /// Asks the service to delete every database it holds. One blocking
    /// round trip.
    pub fn remove_all_databases(&self) -> ClientResult<()> {
        let reply = self.endpoint.get(routes::REMOVE_ALL_DATABASES)?;
        websql_protocol::decode_reply(&reply)
            .map(|_| ())
            .map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use websql_protocol::success_envelope;

    struct CannedEndpoint {
        reply: String,
    }

    impl ControlEndpoint for CannedEndpoint {
        fn post(&self, _path: &str, _body: &str) -> ClientResult<String> {
            Ok(self.reply.clone())
        }

        fn get(&self, _path: &str) -> ClientResult<String> {
            Ok(self.reply.clone())
        }
    }

    fn service(reply: String) -> DeviceService {
        DeviceService::new(
            Arc::new(CannedEndpoint { reply }),
            Arc::new(EventDispatcher::new()),
        )
    }

    #[test]
    fn canned_values_match_the_terminal_firmware() {
        let service = service(success_envelope(serde_json::Value::Null));
        assert!(service.is_keypad_connected());
        assert_eq!(service.keypad_led(), "000000");
        assert_eq!(service.keypad_display(), KeypadDisplay::default());
        assert_eq!(service.play_sound("beep"), 9999);
        assert_eq!(service.terminal_id(), "00000000");
        assert_eq!(service.firmware_version(), "5.00r000000");
        assert_eq!(service.contents_set_version(), "000");
        assert_eq!(service.display_brightness(), 0);
    }

    #[test]
    fn network_status_comes_from_the_dispatcher() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let service = DeviceService::new(
            Arc::new(CannedEndpoint {
                reply: String::new(),
            }),
            Arc::clone(&dispatcher),
        );
        assert_eq!(service.network_status(), NetworkStatus::Lan);
        dispatcher.dispatch(r#"{"api":"startEventListen","eventCode":1}"#);
        assert_eq!(service.network_status(), NetworkStatus::Mobile);
    }

    #[test]
    fn remove_all_databases_surfaces_faults() {
        let failing = service(websql_protocol::error_envelope("", "disk error"));
        assert!(failing.remove_all_databases().is_err());
        let succeeding = service(success_envelope(serde_json::Value::Null));
        assert!(succeeding.remove_all_databases().is_ok());
    }
}
