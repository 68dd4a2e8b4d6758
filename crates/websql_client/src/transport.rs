//! Session transport abstraction.
//!
//! A session transport is the persistent command channel of exactly one
//! database handle. The conversation is strictly half-duplex: one command
//! out, one enveloped reply back, nothing pipelined. The trait exists so
//! the session logic can be driven against a scripted transport in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use websql_protocol::Command;

use crate::error::{ClientError, ClientResult};

/// Persistent transaction channel for one database.
pub trait SessionTransport: Send {
    /// Sends one command and blocks until its reply arrives, normalized
    /// into the success payload.
    fn send(&mut self, command: &Command) -> ClientResult<Value>;

    /// Whether the channel is still usable.
    fn is_connected(&self) -> bool;

    /// Closes the channel. Subsequent sends fail.
    fn close(&mut self);
}

/// Establishes session transports for database handles.
pub trait SessionConnector: Send + Sync {
    /// Opens the persistent channel for the given database id.
    fn connect(&self, db_id: u32) -> ClientResult<Box<dyn SessionTransport>>;
}

/// Scripted reply for one [`ScriptedTransport`] send.
pub enum ScriptedReply {
    /// Send succeeds with this payload.
    Ok(Value),
    /// Send fails with this error.
    Err(ClientError),
}

/// Test transport: records every command and answers from a script.
///
/// Commands past the end of the script succeed with a null payload, so
/// tests only script the interesting replies.
pub struct ScriptedTransport {
    log: Arc<Mutex<Vec<Command>>>,
    script: VecDeque<ScriptedReply>,
    connected: bool,
}

impl ScriptedTransport {
    /// Creates a transport answering from `script`, recording commands
    /// into `log`.
    pub fn new(log: Arc<Mutex<Vec<Command>>>, script: Vec<ScriptedReply>) -> Self {
        Self {
            log,
            script: script.into(),
            connected: true,
        }
    }
}

impl SessionTransport for ScriptedTransport {
    fn send(&mut self, command: &Command) -> ClientResult<Value> {
        if !self.connected {
            return Err(ClientError::Transport("channel is closed".into()));
        }
        self.log.lock().push(command.clone());
        match self.script.pop_front() {
            Some(ScriptedReply::Ok(payload)) => Ok(payload),
            Some(ScriptedReply::Err(err)) => Err(err),
            None => Ok(Value::Null),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close(&mut self) {
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_commands_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut transport = ScriptedTransport::new(Arc::clone(&log), Vec::new());
        transport.send(&Command::Begin).unwrap();
        transport.send(&Command::Commit).unwrap();
        assert_eq!(*log.lock(), vec![Command::Begin, Command::Commit]);
    }

    #[test]
    fn replies_follow_the_script_then_default_to_null() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut transport = ScriptedTransport::new(
            Arc::clone(&log),
            vec![ScriptedReply::Ok(serde_json::json!({"rowsAffected": 1}))],
        );
        let first = transport.send(&Command::Begin).unwrap();
        assert_eq!(first["rowsAffected"], 1);
        let second = transport.send(&Command::Commit).unwrap();
        assert!(second.is_null());
    }

    #[test]
    fn closed_transport_rejects_sends() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut transport = ScriptedTransport::new(Arc::clone(&log), Vec::new());
        transport.close();
        assert!(!transport.is_connected());
        assert!(transport.send(&Command::Begin).is_err());
        assert!(log.lock().is_empty());
    }
}
