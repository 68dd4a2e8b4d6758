//! Per-handle task scheduler.
//!
//! Each database handle owns one scheduler: an unbounded FIFO drained by a
//! dedicated worker thread that owns the transaction session. Enqueueing
//! always appends and returns immediately, so callers are never run
//! synchronously re-entrant, and a task fully settles before the next one
//! is dequeued. The worker exits when the handle (and with it the sender)
//! is dropped, closing the session channel on the way out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{mpsc, Weak};
use std::thread;

use websql_protocol::SqlError;

use crate::context::TxErrorCallback;
use crate::database::{CreationCallback, Database};
use crate::error::{ClientError, ClientResult};
use crate::session::{TransactionSession, TransactionTask};
use crate::transport::SessionTransport;

/// One unit of scheduled work.
pub(crate) enum Task {
    /// An ordinary or version-change transaction.
    Transaction(TransactionTask),
    /// The one-shot creation callback for a freshly created database.
    /// While it runs, `change_version` on the handle fails fast.
    Creation {
        /// User callback, handed the database handle.
        callback: CreationCallback,
        /// The owning handle; weak to keep the handle's drop in charge of
        /// shutdown.
        handle: Weak<Database>,
    },
    /// Delivers a pre-computed error without contacting the service.
    FailFast {
        /// The error to deliver.
        error: SqlError,
        /// Receiver of the error.
        on_error: Option<TxErrorCallback>,
    },
}

/// FIFO scheduler owning the session worker for one handle.
pub(crate) struct Scheduler {
    sender: mpsc::Sender<Task>,
}

impl Scheduler {
    /// Spawns the worker thread around `transport`.
    pub fn spawn(db_id: u32, transport: Box<dyn SessionTransport>) -> ClientResult<Self> {
        let (sender, receiver) = mpsc::channel::<Task>();
        thread::Builder::new()
            .name(format!("websql-session-{db_id}"))
            .spawn(move || {
                let mut session = TransactionSession::new(transport);
                // Ends when the handle drops its sender.
                while let Ok(task) = receiver.recv() {
                    run_task(&mut session, task);
                }
                session.close();
                tracing::debug!(db_id, "session worker stopped");
            })
            .map_err(|err| ClientError::Transport(format!("failed to start worker: {err}")))?;
        Ok(Scheduler { sender })
    }

    /// Appends a task. The task runs after everything enqueued before it
    /// has settled.
    pub fn enqueue(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("task dropped: session worker already stopped");
        }
    }
}

fn run_task(session: &mut TransactionSession, task: Task) {
    match task {
        Task::Transaction(task) => session.run(task),
        Task::Creation { callback, handle } => {
            let Some(db) = handle.upgrade() else {
                // Handle dropped before the creation callback ran.
                return;
            };
            db.creation_guard().store(true, Ordering::SeqCst);
            if catch_unwind(AssertUnwindSafe(|| callback(&db))).is_err() {
                tracing::warn!("creation callback panicked");
            }
            db.creation_guard().store(false, Ordering::SeqCst);
        }
        Task::FailFast { error, on_error } => {
            if let Some(on_error) = on_error {
                if catch_unwind(AssertUnwindSafe(|| on_error(error))).is_err() {
                    tracing::warn!("transaction error callback panicked");
                }
            }
        }
    }
}
