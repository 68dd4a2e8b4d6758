//! # WebSQL Bridge Client
//!
//! Client-side compatibility layer for the legacy openDatabase /
//! transaction / executeSql surface. SQL never executes locally: every
//! statement is delegated to a remote service over one persistent channel
//! per database, and the legacy callback contract (FIFO scheduling, the
//! per-statement error policy, single rollback on fatal failure) is
//! reproduced faithfully on top of it.
//!
//! ## Architecture
//!
//! ```text
//! Database (handle)
//!     │  enqueue            blocking control calls
//!     ▼                     (open / version / close)
//! Scheduler ── worker ──► ControlEndpoint ──► service
//!     │ owns
//!     ▼
//! TransactionSession ──► SessionTransport ──► service
//!   (state machine)        (one WebSocket per database)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use websql_client::{Database, HttpEndpoint, OpenParams, WsConnector};
//!
//! # fn main() -> Result<(), websql_client::ClientError> {
//! let endpoint = Arc::new(HttpEndpoint::new(
//!     "http://127.0.0.1:9030",
//!     Duration::from_secs(30),
//! )?);
//! let connector = WsConnector::new("ws://127.0.0.1:9030");
//!
//! let db = Database::open(
//!     endpoint,
//!     &connector,
//!     OpenParams {
//!         name: "notes".into(),
//!         version: "1.0".into(),
//!         display_name: "Notes".into(),
//!         estimated_size: 5_000_000,
//!     },
//!     None,
//! )?;
//!
//! db.transaction(
//!     Box::new(|tx| {
//!         tx.execute_sql("CREATE TABLE IF NOT EXISTS notes (body)", vec![], None, None);
//!         Ok(())
//!     }),
//!     None,
//!     None,
//! );
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod database;
mod endpoint;
mod error;
mod result;
mod scheduler;
mod session;
mod transport;
mod ws;

pub use context::{
    StatementErrorCallback, StatementSuccessCallback, Transaction, TxCallback, TxErrorCallback,
    TxSuccessCallback,
};
pub use database::{CreationCallback, Database, OpenParams};
pub use endpoint::{call, ControlEndpoint, HttpEndpoint};
pub use error::{ClientError, ClientResult};
pub use result::{ResultSet, Rows};
pub use session::SessionState;
pub use transport::{ScriptedReply, ScriptedTransport, SessionConnector, SessionTransport};
pub use ws::{WsConnector, WsTransport};

pub use websql_protocol::{SqlError, SqlErrorCode};
