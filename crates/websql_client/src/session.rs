//! Transaction session: the command conversation for one task.
//!
//! Every transaction task is the same strictly sequential conversation on
//! the persistent channel: `begin`, optionally `changeVersion`, one `exec`
//! per queued statement, `commit`. The session tracks an explicit state so
//! each step has exactly one legal next command, and funnels every fatal
//! outcome through a single rollback-then-report path.

use std::panic::{catch_unwind, AssertUnwindSafe};

use websql_protocol::{Command, ExecReply, SqlError, SqlErrorCode};

use crate::context::{QueuedStatement, Transaction, TxCallback, TxErrorCallback, TxSuccessCallback};
use crate::error::ClientError;
use crate::transport::SessionTransport;

/// Position of a session within its transaction conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transaction open.
    Idle,
    /// `begin` acknowledged.
    Begun,
    /// `changeVersion` acknowledged.
    VersionChanged,
    /// Replaying the statement queue; holds the index of the statement in
    /// flight.
    Executing(usize),
    /// `commit` acknowledged; terminal.
    Committed,
    /// Rolled back; terminal.
    Aborted,
}

impl SessionState {
    /// Whether `command` is the legal next command in this state.
    fn permits(self, command: &Command) -> bool {
        match (self, command) {
            (SessionState::Idle, Command::Begin) => true,
            (SessionState::Begun, Command::ChangeVersion { .. }) => true,
            (SessionState::Begun, Command::Exec { .. }) => true,
            (SessionState::Begun, Command::Commit) => true,
            (SessionState::VersionChanged, Command::Exec { .. }) => true,
            (SessionState::VersionChanged, Command::Commit) => true,
            (SessionState::Executing(_), Command::Exec { .. }) => true,
            (SessionState::Executing(_), Command::Commit) => true,
            // Rollback is legal from anywhere; the service treats a stray
            // abort as a no-op.
            (_, Command::Abort) => true,
            _ => false,
        }
    }
}

/// One transaction's worth of work for the session.
pub(crate) struct TransactionTask {
    /// `(old, new)` pair for version-change transactions.
    pub change_version: Option<(String, String)>,
    /// Builds the statement queue. Version-change tasks may omit it.
    pub callback: Option<TxCallback>,
    /// Runs once after rollback when the transaction turns fatal.
    pub on_error: Option<TxErrorCallback>,
    /// Runs once after commit.
    pub on_success: Option<TxSuccessCallback>,
}

/// Drives transaction tasks over one session transport.
pub(crate) struct TransactionSession {
    transport: Box<dyn SessionTransport>,
    state: SessionState,
}

impl TransactionSession {
    pub fn new(transport: Box<dyn SessionTransport>) -> Self {
        TransactionSession {
            transport,
            state: SessionState::Idle,
        }
    }

    /// Runs one task to completion: exactly one terminal callback fires,
    /// and the session returns to a terminal state. Panics from user
    /// callbacks are contained here and reported as Unknown-coded errors;
    /// they never unwind into the scheduler.
    pub fn run(&mut self, task: TransactionTask) {
        let TransactionTask {
            change_version,
            callback,
            on_error,
            on_success,
        } = task;

        let tx = Transaction::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.drive(&tx, change_version, callback)
        }))
        .unwrap_or_else(|_| {
            tracing::warn!("transaction callback panicked");
            Err(SqlError::new(
                SqlErrorCode::Unknown,
                "a transaction callback panicked",
            ))
        });

        match outcome {
            Ok(()) => {
                if let Some(on_success) = on_success {
                    if catch_unwind(AssertUnwindSafe(on_success)).is_err() {
                        tracing::warn!("transaction success callback panicked");
                    }
                }
            }
            Err(error) => {
                self.rollback();
                tracing::debug!(code = u8::from(error.code), message = %error.message,
                    "transaction failed");
                if let Some(on_error) = on_error {
                    if catch_unwind(AssertUnwindSafe(|| on_error(error))).is_err() {
                        tracing::warn!("transaction error callback panicked");
                    }
                }
            }
        }
    }

    fn drive(
        &mut self,
        tx: &Transaction,
        change_version: Option<(String, String)>,
        callback: Option<TxCallback>,
    ) -> Result<(), SqlError> {
        self.state = SessionState::Idle;
        self.issue(&Command::Begin)
            .map_err(ClientError::into_sql_error)?;
        self.state = SessionState::Begun;

        if let Some((old_version, new_version)) = change_version {
            self.issue(&Command::ChangeVersion {
                old_version,
                new_version,
            })
            .map_err(ClientError::into_sql_error)?;
            self.state = SessionState::VersionChanged;
        }

        if let Some(callback) = callback {
            callback(tx)?;
        }

        // The queue may grow while it drains: statement callbacks receive
        // the context and can append further statements.
        let mut index = 0;
        while let Some(queued) = tx.pop_statement() {
            self.state = SessionState::Executing(index);
            self.execute(tx, queued)?;
            index += 1;
        }

        self.issue(&Command::Commit)
            .map_err(ClientError::into_sql_error)?;
        self.state = SessionState::Committed;
        Ok(())
    }

    /// Sends one statement and applies the per-statement error policy.
    fn execute(&mut self, tx: &Transaction, queued: QueuedStatement) -> Result<(), SqlError> {
        let QueuedStatement {
            statement,
            args,
            mut on_success,
            mut on_error,
        } = queued;

        let sent = self.issue(&Command::Exec { statement, args });
        let result = sent.and_then(|payload| {
            // A null payload is a bare acknowledgement: no rows, nothing
            // inserted.
            if payload.is_null() {
                return Ok(ExecReply::default());
            }
            serde_json::from_value(payload)
                .map_err(|err| ClientError::Transport(format!("bad exec reply: {err}")))
        });

        match result {
            Ok(reply) => {
                if let Some(on_success) = on_success.as_mut() {
                    // An error from the statement success callback is fatal
                    // to the whole transaction.
                    on_success(tx, reply.into())?;
                }
                Ok(())
            }
            Err(failure) => match on_error.as_mut() {
                Some(handler) => {
                    let sql = match failure {
                        ClientError::Sql(sql) => sql,
                        // Non-SQL failures reach the handler with an empty
                        // Unknown error, matching the legacy surface.
                        _ => SqlError::new(SqlErrorCode::Unknown, ""),
                    };
                    if handler(tx, &sql) {
                        Err(SqlError::callback_failure())
                    } else {
                        Ok(())
                    }
                }
                None => Err(failure.into_sql_error()),
            },
        }
    }

    fn issue(&mut self, command: &Command) -> Result<serde_json::Value, ClientError> {
        if !self.state.permits(command) {
            return Err(ClientError::Transport(format!(
                "command illegal in session state {:?}",
                self.state
            )));
        }
        self.transport.send(command)
    }

    /// Sends `abort` and moves to the terminal state. Failures are
    /// swallowed and logged: the service rolls back an open transaction
    /// itself when the channel closes, so scheduler liveness wins over a
    /// confirmed rollback.
    fn rollback(&mut self) {
        if let Err(err) = self.transport.send(&Command::Abort) {
            tracing::warn!(error = %err, "rollback notice failed");
        }
        self.state = SessionState::Aborted;
    }

    /// Closes the underlying channel.
    pub fn close(&mut self) {
        self.transport.close();
    }
}
