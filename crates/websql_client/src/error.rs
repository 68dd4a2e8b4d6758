//! Error types for the client.

use thiserror::Error;
use websql_protocol::{ProtocolError, SqlError, SqlErrorCode};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur on the client surface.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A caller-supplied argument was rejected before any work started.
    /// Raised synchronously from the calling thread, never via callbacks.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The request could not be delivered, or the reply could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service raised a fatal fault (exception or unclassified error
    /// envelope).
    #[error("service fault {name}: {message}")]
    Fault {
        /// Fault name, e.g. `InvalidStateError`; possibly empty.
        name: String,
        /// Human-readable detail.
        message: String,
    },

    /// A statement or transaction failed with a SQL error.
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// `insert_id` was read from a result set whose statement inserted no
    /// row.
    #[error("no row was inserted by this statement")]
    NoInsertId,

    /// A row index past the end of the result set.
    #[error("row index {index} out of range (result set has {len} rows)")]
    RowIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of rows in the set.
        len: usize,
    },
}

impl ClientError {
    /// Collapses this error into the `SqlError` shape expected by
    /// transaction-level error callbacks. Non-SQL failures become
    /// Unknown-coded errors carrying their display text.
    pub fn into_sql_error(self) -> SqlError {
        match self {
            ClientError::Sql(sql) => sql,
            other => SqlError::new(SqlErrorCode::Unknown, other.to_string()),
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Sql(sql) => ClientError::Sql(sql),
            ProtocolError::Exception { name, message, .. } => ClientError::Fault { name, message },
            ProtocolError::Fault { name, message } => ClientError::Fault { name, message },
            ProtocolError::InvalidResponse(detail) => ClientError::Transport(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_errors_pass_through_the_funnel() {
        let sql = SqlError::new(SqlErrorCode::Constraint, "UNIQUE failed");
        let err = ClientError::Sql(sql.clone());
        assert_eq!(err.into_sql_error(), sql);
    }

    #[test]
    fn non_sql_errors_collapse_to_unknown() {
        let err = ClientError::Transport("connection reset".into());
        let sql = err.into_sql_error();
        assert_eq!(sql.code, SqlErrorCode::Unknown);
        assert!(sql.message.contains("connection reset"));
    }

    #[test]
    fn protocol_faults_map_onto_client_faults() {
        let err: ClientError = ProtocolError::Exception {
            name: "InvalidStateError".into(),
            message: "version mismatch".into(),
            code: None,
        }
        .into();
        match err {
            ClientError::Fault { name, .. } => assert_eq!(name, "InvalidStateError"),
            other => panic!("expected Fault, got {other:?}"),
        }
    }
}
