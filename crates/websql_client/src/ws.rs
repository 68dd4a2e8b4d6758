//! WebSocket session transport.
//!
//! One socket per database handle, opened against the service's
//! transaction route with the database id as a query parameter. The
//! send-then-wait discipline of [`SessionTransport`] maps directly onto
//! the socket: write one text frame, read frames until the next text
//! frame arrives, normalize it.

use std::net::TcpStream;

use serde_json::Value;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use websql_protocol::{decode_reply, routes, Command};

use crate::error::{ClientError, ClientResult};
use crate::transport::{SessionConnector, SessionTransport};

/// Session transport over one tungstenite WebSocket.
pub struct WsTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    connected: bool,
}

impl WsTransport {
    /// Wraps an already-established socket.
    pub fn new(socket: WebSocket<MaybeTlsStream<TcpStream>>) -> Self {
        Self {
            socket,
            connected: true,
        }
    }

    fn read_text(&mut self) -> ClientResult<String> {
        loop {
            let frame = self.socket.read().map_err(|err| {
                self.connected = false;
                ClientError::Transport(err.to_string())
            })?;
            match frame {
                Message::Text(text) => return Ok(text),
                Message::Close(_) => {
                    self.connected = false;
                    return Err(ClientError::Transport("channel closed by service".into()));
                }
                // Control frames are answered by tungstenite itself.
                _ => continue,
            }
        }
    }
}

impl SessionTransport for WsTransport {
    fn send(&mut self, command: &Command) -> ClientResult<Value> {
        if !self.connected {
            return Err(ClientError::Transport("channel is closed".into()));
        }
        let text = serde_json::to_string(command)
            .map_err(|err| ClientError::Transport(format!("failed to encode command: {err}")))?;
        self.socket.send(Message::Text(text)).map_err(|err| {
            self.connected = false;
            ClientError::Transport(err.to_string())
        })?;
        let reply = self.read_text()?;
        Ok(decode_reply(&reply)?)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close(&mut self) {
        if self.connected {
            if let Err(err) = self.socket.close(None) {
                tracing::debug!(error = %err, "session channel close failed");
            }
            self.connected = false;
        }
    }
}

/// Connector building one WebSocket session per database id.
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    /// Creates a connector for the service at `base_url`
    /// (e.g. `ws://127.0.0.1:9030`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl SessionConnector for WsConnector {
    fn connect(&self, db_id: u32) -> ClientResult<Box<dyn SessionTransport>> {
        let url = format!("{}{}?dbId={db_id}", self.base_url, routes::TRANSACTION);
        let (socket, _response) =
            tungstenite::connect(url).map_err(|err| ClientError::Transport(err.to_string()))?;
        tracing::debug!(db_id, "session channel established");
        Ok(Box::new(WsTransport::new(socket)))
    }
}
