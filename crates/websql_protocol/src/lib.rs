//! # WebSQL Bridge Protocol
//!
//! Wire protocol types for the WebSQL bridge.
//!
//! This crate provides:
//! - The transaction channel commands (`begin`, `changeVersion`, `exec`,
//!   `commit`, `abort`)
//! - Control messages (open, version read, close, file proxy)
//! - The shared response envelope and its normalizer
//! - The SQL error taxonomy (`SqlError`, `SqlErrorCode`)
//! - Event-notification channel messages
//!
//! This is a pure protocol crate with no I/O operations. Every message is
//! JSON text on the wire; the legacy service speaks camelCase member names.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod envelope;
mod error;
mod event;

pub use command::{
    CloseRequest, Command, ExecReply, FileReadRequest, FileWriteRequest, OpenReply, OpenRequest,
    VersionReply, VersionRequest,
};
pub use envelope::{
    decode_reply, error_envelope, exception_envelope, sqlerror_envelope, success_envelope,
    ProtocolError,
};
pub use error::{SqlError, SqlErrorCode};
pub use event::{EventKind, EventMessage};

/// Service route constants shared by the client and the remote service.
pub mod routes {
    /// Blocking open request (locates or creates a database).
    pub const OPEN: &str = "/api/websql/open";
    /// Blocking version read.
    pub const DB_VERSION: &str = "/api/websql/dbversion";
    /// Best-effort close notice.
    pub const CLOSE: &str = "/api/websql/close";
    /// Persistent transaction channel (WebSocket upgrade, `?dbId=N`).
    pub const TRANSACTION: &str = "/api/websql/transaction";
    /// Shared event-notification channel (WebSocket upgrade).
    pub const EVENT_NOTIFICATION: &str = "/api/eventNotification";
    /// File proxy: read one file.
    pub const READ_FILE: &str = "/api/readFile";
    /// File proxy: write or append one file.
    pub const WRITE_FILE: &str = "/api/writeFile";
    /// Remove every database the service holds.
    pub const REMOVE_ALL_DATABASES: &str = "/api/removeAllDatabases";
}
