//! Database handle: the public face of the legacy surface.
//!
//! A handle is obtained through one blocking open round trip, owns one
//! persistent session (established once, at open), and schedules all its
//! transactions through one FIFO. Dropping the last clone of the handle
//! stops the worker and closes the session channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use websql_protocol::{
    routes, CloseRequest, OpenReply, OpenRequest, SqlError, VersionReply, VersionRequest,
};

use crate::context::{TxCallback, TxErrorCallback, TxSuccessCallback};
use crate::endpoint::{call, ControlEndpoint};
use crate::error::{ClientError, ClientResult};
use crate::scheduler::{Scheduler, Task};
use crate::session::TransactionTask;
use crate::transport::SessionConnector;

/// Creation callback: runs once, on the scheduler, when an open created
/// the database. Receives the handle so it can queue initial transactions.
pub type CreationCallback = Box<dyn FnOnce(&Arc<Database>) + Send>;

/// Parameters of a database open.
#[derive(Debug, Clone)]
pub struct OpenParams {
    /// Database name. Must be non-empty.
    pub name: String,
    /// Version the caller expects, or empty to accept any.
    pub version: String,
    /// Display name; the service ignores it.
    pub display_name: String,
    /// Size hint in bytes; the service ignores it.
    pub estimated_size: u64,
}

/// Handle to one remote database.
///
/// `Debug` shows the identity fields only; the endpoint and scheduler are
/// opaque.
pub struct Database {
    db_id: u32,
    name: String,
    endpoint: Arc<dyn ControlEndpoint>,
    scheduler: Scheduler,
    creation_guard: AtomicBool,
    closed: AtomicBool,
}

impl Database {
    /// Opens (locating or creating) the named database.
    ///
    /// Blocks for one control round trip, then establishes the persistent
    /// session and starts the scheduler. An empty name is rejected
    /// synchronously as a [`ClientError::BadArgument`]; a version mismatch
    /// surfaces as the service's `InvalidStateError` fault and yields no
    /// handle.
    ///
    /// When the open creates the database and `creation_callback` is
    /// supplied, the callback is scheduled as the handle's first task.
    /// While the callback itself runs, [`Database::change_version`] fails
    /// fast with a version error; a change submitted before it runs
    /// simply queues behind it.
    pub fn open(
        endpoint: Arc<dyn ControlEndpoint>,
        connector: &dyn SessionConnector,
        params: OpenParams,
        creation_callback: Option<CreationCallback>,
    ) -> ClientResult<Arc<Database>> {
        if params.name.is_empty() {
            return Err(ClientError::BadArgument(
                "database name must not be empty".into(),
            ));
        }

        let request = OpenRequest {
            name: params.name.clone(),
            version: params.version,
            display_name: params.display_name,
            estimated_size: params.estimated_size,
            has_creation_callback: creation_callback.is_some(),
        };
        let reply: OpenReply = call(endpoint.as_ref(), routes::OPEN, &request)?;
        tracing::debug!(name = %params.name, db_id = reply.db_id, created = reply.created,
            "database opened");

        let transport = connector.connect(reply.db_id)?;
        let scheduler = Scheduler::spawn(reply.db_id, transport)?;
        let db = Arc::new(Database {
            db_id: reply.db_id,
            name: params.name,
            endpoint,
            scheduler,
            creation_guard: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });

        if reply.created {
            if let Some(callback) = creation_callback {
                db.scheduler.enqueue(Task::Creation {
                    callback,
                    handle: Arc::downgrade(&db),
                });
            }
        }
        Ok(db)
    }

    /// The database name this handle was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service-assigned database id.
    pub fn id(&self) -> u32 {
        self.db_id
    }

    /// Reads the stored version. Blocking, never cached: two reads
    /// without an intervening version change return the same value.
    pub fn version(&self) -> ClientResult<String> {
        let reply: VersionReply = call(
            self.endpoint.as_ref(),
            routes::DB_VERSION,
            &VersionRequest { db_id: self.db_id },
        )?;
        Ok(reply.version)
    }

    /// Schedules one transaction. Returns before the transaction runs;
    /// outcomes are reported through the callbacks, exactly one of which
    /// fires.
    pub fn transaction(
        &self,
        callback: TxCallback,
        on_error: Option<TxErrorCallback>,
        on_success: Option<TxSuccessCallback>,
    ) {
        self.scheduler.enqueue(Task::Transaction(TransactionTask {
            change_version: None,
            callback: Some(callback),
            on_error,
            on_success,
        }));
    }

    /// Alias of [`Database::transaction`]. Writes are not rejected; the
    /// legacy surface never enforced read-only here and callers depend on
    /// that.
    pub fn read_transaction(
        &self,
        callback: TxCallback,
        on_error: Option<TxErrorCallback>,
        on_success: Option<TxSuccessCallback>,
    ) {
        self.transaction(callback, on_error, on_success);
    }

    /// Schedules a version-change transaction: the service verifies
    /// `old_version` against the stored version inside the transaction,
    /// stages `new_version`, runs the optional callback's statements, and
    /// makes the new version durable at commit.
    ///
    /// While the creation callback of a fresh database is running, this
    /// fails fast with a version error without contacting the service.
    pub fn change_version(
        &self,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        callback: Option<TxCallback>,
        on_error: Option<TxErrorCallback>,
        on_success: Option<TxSuccessCallback>,
    ) {
        if self.creation_guard.load(Ordering::SeqCst) {
            self.scheduler.enqueue(Task::FailFast {
                error: SqlError::version_mismatch(),
                on_error,
            });
            return;
        }
        self.scheduler.enqueue(Task::Transaction(TransactionTask {
            change_version: Some((old_version.into(), new_version.into())),
            callback,
            on_error,
            on_success,
        }));
    }

    /// Sends a best-effort close notice on a detached thread. Failures
    /// are logged, never raised; the session itself shuts down when the
    /// handle is dropped.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let endpoint = Arc::clone(&self.endpoint);
        let db_id = self.db_id;
        thread::spawn(move || {
            let request = CloseRequest { db_id };
            if let Err(err) =
                call::<_, serde_json::Value>(endpoint.as_ref(), routes::CLOSE, &request)
            {
                tracing::warn!(db_id, error = %err, "close notice failed");
            }
        });
    }

    pub(crate) fn creation_guard(&self) -> &AtomicBool {
        &self.creation_guard
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("db_id", &self.db_id)
            .field("name", &self.name)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
