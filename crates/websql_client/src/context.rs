//! Transaction context and statement queue.
//!
//! The [`Transaction`] context is what a transaction callback receives.
//! `execute_sql` only queues; nothing reaches the service until the
//! callback returns and the session starts replaying the queue. The queue
//! is shared so statement callbacks, which also receive the context, can
//! append further statements while replay is in progress.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use websql_protocol::SqlError;

use crate::result::ResultSet;

/// Transaction callback: builds the statement queue.
pub type TxCallback = Box<dyn FnOnce(&Transaction) -> Result<(), SqlError> + Send>;

/// Transaction-level error callback. Receives the single error that made
/// the transaction fatal, after rollback.
pub type TxErrorCallback = Box<dyn FnOnce(SqlError) + Send>;

/// Transaction-level success callback. Runs after commit.
pub type TxSuccessCallback = Box<dyn FnOnce() + Send>;

/// Statement success callback. Receives the context (so it may queue more
/// statements) and the statement's result. An `Err` is fatal to the whole
/// transaction.
pub type StatementSuccessCallback =
    Box<dyn FnMut(&Transaction, ResultSet) -> Result<(), SqlError> + Send>;

/// Statement error callback. Returns `true` to make the failure fatal,
/// `false` to swallow it and continue with the next statement.
pub type StatementErrorCallback = Box<dyn FnMut(&Transaction, &SqlError) -> bool + Send>;

/// One statement waiting to be sent.
pub(crate) struct QueuedStatement {
    pub statement: String,
    pub args: Vec<Value>,
    pub on_success: Option<StatementSuccessCallback>,
    pub on_error: Option<StatementErrorCallback>,
}

/// Per-invocation transaction context.
///
/// Valid only for the duration of the callbacks it is handed to; the
/// session discards it once the transaction settles.
pub struct Transaction {
    queue: Arc<Mutex<VecDeque<QueuedStatement>>>,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Transaction {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queues one parameterized statement.
    ///
    /// `args` values substitute the statement's `?` placeholders in order.
    /// The statement is sent after the current callback returns, in queue
    /// order.
    pub fn execute_sql(
        &self,
        statement: impl Into<String>,
        args: Vec<Value>,
        on_success: Option<StatementSuccessCallback>,
        on_error: Option<StatementErrorCallback>,
    ) {
        self.queue.lock().push_back(QueuedStatement {
            statement: statement.into(),
            args,
            on_success,
            on_error,
        });
    }

    /// Pops the next queued statement; replay consumes the queue front to
    /// back so callbacks can keep appending behind it.
    pub(crate) fn pop_statement(&self) -> Option<QueuedStatement> {
        self.queue.lock().pop_front()
    }

    #[cfg(test)]
    pub(crate) fn queued_len(&self) -> usize {
        self.queue.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statements_queue_in_order() {
        let tx = Transaction::new();
        tx.execute_sql("CREATE TABLE t (id)", Vec::new(), None, None);
        tx.execute_sql("INSERT INTO t VALUES (?)", vec![json!(1)], None, None);
        assert_eq!(tx.queued_len(), 2);

        let first = tx.pop_statement().unwrap();
        assert_eq!(first.statement, "CREATE TABLE t (id)");
        let second = tx.pop_statement().unwrap();
        assert_eq!(second.args, vec![json!(1)]);
        assert!(tx.pop_statement().is_none());
    }

    #[test]
    fn queue_can_grow_while_draining() {
        let tx = Transaction::new();
        tx.execute_sql("SELECT 1", Vec::new(), None, None);
        let _ = tx.pop_statement().unwrap();
        tx.execute_sql("SELECT 2", Vec::new(), None, None);
        assert_eq!(tx.pop_statement().unwrap().statement, "SELECT 2");
    }
}
