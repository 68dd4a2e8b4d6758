//! Event-notification listener.
//!
//! One background thread holds the shared event channel open: connect,
//! pump messages into the dispatcher, and on any failure or disconnect
//! retry on a fixed backoff, indefinitely, until a deliberate shutdown.
//! The channel is connected lazily and survives service restarts.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use websql_client::{ClientError, ClientResult};
use websql_protocol::routes;

use crate::dispatch::EventDispatcher;

/// Reconnect behavior of the listener.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay between a disconnect (or failed connect) and the next
    /// attempt.
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        // The legacy client retried on a fixed half-second cadence.
        ReconnectPolicy {
            interval: Duration::from_millis(500),
        }
    }
}

/// One established event channel.
pub trait EventSource: Send {
    /// Blocks for the next pushed text message. An error means the
    /// channel is gone and the listener should reconnect.
    fn next_message(&mut self) -> ClientResult<String>;
}

/// Establishes event channels for the listener.
pub trait EventConnector: Send {
    /// Opens the shared event channel.
    fn connect(&self) -> ClientResult<Box<dyn EventSource>>;
}

/// Background listener pumping the event channel into a dispatcher.
pub struct EventListener {
    shutdown: Arc<AtomicBool>,
}

impl EventListener {
    /// Spawns the listener thread.
    pub fn spawn(
        connector: Box<dyn EventConnector>,
        dispatcher: Arc<EventDispatcher>,
        policy: ReconnectPolicy,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        thread::spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                match connector.connect() {
                    Ok(mut source) => {
                        tracing::debug!("event channel established");
                        loop {
                            match source.next_message() {
                                Ok(text) => dispatcher.dispatch(&text),
                                Err(err) => {
                                    tracing::warn!(error = %err, "event channel lost");
                                    break;
                                }
                            }
                            if flag.load(Ordering::SeqCst) {
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "event channel connect failed");
                    }
                }
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                thread::sleep(policy.interval);
            }
        });
        EventListener { shutdown }
    }

    /// Stops reconnecting. Takes effect at the next connect or disconnect
    /// boundary; a listener blocked in a read is released when its socket
    /// closes.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// WebSocket event source.
pub struct WsEventSource {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl EventSource for WsEventSource {
    fn next_message(&mut self) -> ClientResult<String> {
        loop {
            let frame = self
                .socket
                .read()
                .map_err(|err| ClientError::Transport(err.to_string()))?;
            match frame {
                Message::Text(text) => return Ok(text),
                Message::Close(_) => {
                    return Err(ClientError::Transport("channel closed by service".into()))
                }
                _ => continue,
            }
        }
    }
}

/// WebSocket event connector for the service's notification route.
pub struct WsEventConnector {
    base_url: String,
}

impl WsEventConnector {
    /// Creates a connector for the service at `base_url`
    /// (e.g. `ws://127.0.0.1:9030`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl EventConnector for WsEventConnector {
    fn connect(&self) -> ClientResult<Box<dyn EventSource>> {
        let url = format!("{}{}", self.base_url, routes::EVENT_NOTIFICATION);
        let (socket, _response) =
            tungstenite::connect(url).map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Box::new(WsEventSource { socket }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use websql_protocol::EventKind;

    struct ScriptedSource {
        messages: VecDeque<String>,
    }

    impl EventSource for ScriptedSource {
        fn next_message(&mut self) -> ClientResult<String> {
            self.messages
                .pop_front()
                .ok_or_else(|| ClientError::Transport("disconnected".into()))
        }
    }

    struct ScriptedConnector {
        batches: Mutex<VecDeque<Vec<String>>>,
        attempts: Arc<Mutex<usize>>,
    }

    impl EventConnector for ScriptedConnector {
        fn connect(&self) -> ClientResult<Box<dyn EventSource>> {
            *self.attempts.lock() += 1;
            match self.batches.lock().pop_front() {
                Some(batch) => Ok(Box::new(ScriptedSource {
                    messages: batch.into(),
                })),
                None => Err(ClientError::Transport("service down".into())),
            }
        }
    }

    #[test]
    fn pumps_messages_and_reconnects_after_disconnect() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let (seen_tx, seen_rx) = mpsc::channel();
        dispatcher.set_handler(
            EventKind::Keypad,
            Box::new(move |code, _payload| {
                let _ = seen_tx.send(code);
            }),
        );

        let attempts = Arc::new(Mutex::new(0));
        let connector = ScriptedConnector {
            // Two connections, one message each; the disconnect in between
            // exercises the retry path.
            batches: Mutex::new(
                vec![
                    vec![r#"{"api":"startKeypadListen","eventCode":1}"#.to_string()],
                    vec![r#"{"api":"startKeypadListen","eventCode":2}"#.to_string()],
                ]
                .into(),
            ),
            attempts: Arc::clone(&attempts),
        };

        let listener = EventListener::spawn(
            Box::new(connector),
            Arc::clone(&dispatcher),
            ReconnectPolicy {
                interval: Duration::from_millis(1),
            },
        );

        let timeout = Duration::from_secs(5);
        assert_eq!(seen_rx.recv_timeout(timeout).unwrap(), 1);
        assert_eq!(seen_rx.recv_timeout(timeout).unwrap(), 2);
        listener.shutdown();
        assert!(*attempts.lock() >= 2);
    }

    #[test]
    fn shutdown_stops_reconnecting() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let attempts = Arc::new(Mutex::new(0));
        let connector = ScriptedConnector {
            batches: Mutex::new(VecDeque::new()),
            attempts: Arc::clone(&attempts),
        };
        let listener = EventListener::spawn(
            Box::new(connector),
            dispatcher,
            ReconnectPolicy {
                interval: Duration::from_millis(1),
            },
        );
        listener.shutdown();
        thread::sleep(Duration::from_millis(50));
        let settled = *attempts.lock();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(*attempts.lock(), settled);
    }
}
