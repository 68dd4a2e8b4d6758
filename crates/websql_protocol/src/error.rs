//! SQL error taxonomy.
//!
//! The legacy surface reports statement and transaction failures through a
//! small closed set of numeric codes. The codes are part of the wire
//! contract (the service sends them inside `sqlerror` envelopes) and part of
//! the public API (error callbacks receive them), so they are modeled as a
//! closed enum rather than a bare integer.

use serde::{Deserialize, Serialize};

/// Numeric failure class of a [`SqlError`].
///
/// The numeric values are fixed by the wire contract and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum SqlErrorCode {
    /// The failure does not fit any other class, or a callback misbehaved.
    Unknown,
    /// The statement failed for database-level reasons (I/O, corruption).
    Database,
    /// The database version does not match the expected version.
    Version,
    /// A result set or statement was too large.
    TooLarge,
    /// The database ran out of allotted storage.
    Quota,
    /// The statement could not be parsed or planned.
    Syntax,
    /// The statement violated a constraint.
    Constraint,
    /// A lock could not be obtained in time.
    Timeout,
}

impl From<u8> for SqlErrorCode {
    fn from(raw: u8) -> Self {
        match raw {
            1 => SqlErrorCode::Database,
            2 => SqlErrorCode::Version,
            3 => SqlErrorCode::TooLarge,
            4 => SqlErrorCode::Quota,
            5 => SqlErrorCode::Syntax,
            6 => SqlErrorCode::Constraint,
            7 => SqlErrorCode::Timeout,
            _ => SqlErrorCode::Unknown,
        }
    }
}

impl From<SqlErrorCode> for u8 {
    fn from(code: SqlErrorCode) -> Self {
        match code {
            SqlErrorCode::Unknown => 0,
            SqlErrorCode::Database => 1,
            SqlErrorCode::Version => 2,
            SqlErrorCode::TooLarge => 3,
            SqlErrorCode::Quota => 4,
            SqlErrorCode::Syntax => 5,
            SqlErrorCode::Constraint => 6,
            SqlErrorCode::Timeout => 7,
        }
    }
}

/// A statement or transaction failure reported through the legacy surface.
///
/// This is what statement error callbacks and transaction error callbacks
/// receive. On the wire it travels as the `sqlerror` member of a response
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("sql error {}: {message}", u8::from(*.code))]
pub struct SqlError {
    /// Failure class.
    pub code: SqlErrorCode,
    /// Human-readable detail, possibly empty.
    pub message: String,
}

impl SqlError {
    /// Creates an error with the given code and message.
    pub fn new(code: SqlErrorCode, message: impl Into<String>) -> Self {
        SqlError {
            code,
            message: message.into(),
        }
    }

    /// The error raised when a statement callback itself fails: either it
    /// raised, or its error callback returned a non-false verdict.
    pub fn callback_failure() -> Self {
        SqlError::new(
            SqlErrorCode::Unknown,
            "the statement callback raised an exception or statement error callback did not return false",
        )
    }

    /// The error raised when a version precondition does not hold.
    pub fn version_mismatch() -> Self {
        SqlError::new(
            SqlErrorCode::Version,
            "current version of the database and `oldVersion` argument do not match",
        )
    }
}
