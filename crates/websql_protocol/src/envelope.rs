//! Response envelope and its normalizer.
//!
//! Every reply from the service, on every surface, is one JSON object with
//! exactly one of four members set:
//!
//! - `data` — success; the member holds the operation's payload
//! - `sqlerror` — a [`SqlError`] scoped to the current statement or
//!   transaction
//! - `exception` — a named fault raised while handling the request
//! - `error` — an unclassified service fault
//!
//! [`decode_reply`] collapses the four shapes into a single
//! `Result<Value, ProtocolError>`. The members are checked in a fixed
//! order (`sqlerror`, `exception`, `error`, then `data`) so that a
//! malformed reply carrying several members resolves deterministically.

use serde_json::{json, Value};

use crate::error::SqlError;

/// Failure produced while decoding a reply envelope.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    /// The reply was not a JSON object, or carried none of the four
    /// envelope members.
    #[error("malformed reply envelope: {0}")]
    InvalidResponse(String),

    /// The service raised a named fault (`exception` member).
    #[error("service exception {name}: {message}")]
    Exception {
        /// Fault name, e.g. `InvalidStateError`.
        name: String,
        /// Human-readable detail.
        message: String,
        /// Optional numeric code carried alongside the fault.
        code: Option<i64>,
    },

    /// The service reported an unclassified fault (`error` member).
    #[error("service fault {name}: {message}")]
    Fault {
        /// Fault name, possibly empty.
        name: String,
        /// Human-readable detail.
        message: String,
    },

    /// The operation failed with a statement-scoped SQL error.
    #[error(transparent)]
    Sql(#[from] SqlError),
}

fn fault_parts(member: &Value) -> (String, String, Option<i64>) {
    let name = member
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let message = member
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let code = member.get("code").and_then(Value::as_i64);
    (name, message, code)
}

/// Normalizes one reply envelope into the operation's payload.
///
/// Returns the `data` member (JSON null when the service sent a bare
/// `{"data":null}` acknowledgement) or the first failure member found, in
/// the fixed `sqlerror` → `exception` → `error` order.
pub fn decode_reply(text: &str) -> Result<Value, ProtocolError> {
    let envelope: Value = serde_json::from_str(text)
        .map_err(|err| ProtocolError::InvalidResponse(err.to_string()))?;
    let object = envelope
        .as_object()
        .ok_or_else(|| ProtocolError::InvalidResponse("reply is not a JSON object".into()))?;

    if let Some(member) = object.get("sqlerror") {
        let sql: SqlError = serde_json::from_value(member.clone())
            .map_err(|err| ProtocolError::InvalidResponse(format!("bad sqlerror member: {err}")))?;
        return Err(ProtocolError::Sql(sql));
    }
    if let Some(member) = object.get("exception") {
        let (name, message, code) = fault_parts(member);
        tracing::error!(%name, %message, "service raised an exception");
        return Err(ProtocolError::Exception {
            name,
            message,
            code,
        });
    }
    if let Some(member) = object.get("error") {
        let (name, message, _) = fault_parts(member);
        tracing::error!(%name, %message, "service reported a fault");
        return Err(ProtocolError::Fault { name, message });
    }
    match object.get("data") {
        Some(data) => Ok(data.clone()),
        None => Err(ProtocolError::InvalidResponse(
            "reply carries no envelope member".into(),
        )),
    }
}

/// Builds a success envelope around `data`.
pub fn success_envelope(data: Value) -> String {
    json!({ "data": data }).to_string()
}

/// Builds a `sqlerror` envelope.
pub fn sqlerror_envelope(error: &SqlError) -> String {
    json!({ "sqlerror": error }).to_string()
}

/// Builds an `exception` envelope with the given fault name.
pub fn exception_envelope(name: &str, message: &str) -> String {
    json!({ "exception": { "name": name, "message": message } }).to_string()
}

/// Builds an unclassified `error` envelope.
pub fn error_envelope(name: &str, message: &str) -> String {
    json!({ "error": { "name": name, "message": message } }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlErrorCode;
    use proptest::prelude::*;

    #[test]
    fn data_member_is_returned_as_payload() {
        let payload = decode_reply(r#"{"data":{"version":"1.0"}}"#).unwrap();
        assert_eq!(payload["version"], "1.0");
    }

    #[test]
    fn null_data_is_a_bare_acknowledgement() {
        let payload = decode_reply(r#"{"data":null}"#).unwrap();
        assert!(payload.is_null());
    }

    #[test]
    fn sqlerror_member_becomes_sql_error() {
        let err = decode_reply(r#"{"sqlerror":{"code":5,"message":"syntax"}}"#).unwrap_err();
        match err {
            ProtocolError::Sql(sql) => {
                assert_eq!(sql.code, SqlErrorCode::Syntax);
                assert_eq!(sql.message, "syntax");
            }
            other => panic!("expected Sql, got {other:?}"),
        }
    }

    #[test]
    fn exception_member_keeps_its_name() {
        let err =
            decode_reply(r#"{"exception":{"name":"InvalidStateError","message":"version"}}"#)
                .unwrap_err();
        match err {
            ProtocolError::Exception { name, .. } => assert_eq!(name, "InvalidStateError"),
            other => panic!("expected Exception, got {other:?}"),
        }
    }

    #[test]
    fn sqlerror_wins_when_several_members_are_set() {
        let err = decode_reply(
            r#"{"data":1,"error":{"name":"x","message":"y"},"sqlerror":{"code":0,"message":""}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::Sql(_)));
    }

    #[test]
    fn empty_object_is_invalid() {
        let err = decode_reply("{}").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidResponse(_)));
    }

    #[test]
    fn non_object_is_invalid() {
        assert!(matches!(
            decode_reply("[1,2,3]").unwrap_err(),
            ProtocolError::InvalidResponse(_)
        ));
        assert!(matches!(
            decode_reply("not json").unwrap_err(),
            ProtocolError::InvalidResponse(_)
        ));
    }

    #[test]
    fn builders_round_trip_through_decode() {
        let ok = success_envelope(json!({"rowsAffected": 2}));
        assert_eq!(decode_reply(&ok).unwrap()["rowsAffected"], 2);

        let sql = SqlError::new(SqlErrorCode::Quota, "full");
        let err = decode_reply(&sqlerror_envelope(&sql)).unwrap_err();
        assert_eq!(err, ProtocolError::Sql(sql));

        let err = decode_reply(&exception_envelope("InvalidStateError", "bad")).unwrap_err();
        assert!(matches!(err, ProtocolError::Exception { .. }));

        let err = decode_reply(&error_envelope("", "boom")).unwrap_err();
        assert!(matches!(err, ProtocolError::Fault { .. }));
    }

    proptest! {
        #[test]
        fn decode_never_panics_on_arbitrary_input(text in ".{0,256}") {
            let _ = decode_reply(&text);
        }

        #[test]
        fn decode_never_panics_on_arbitrary_objects(
            keys in proptest::collection::vec("[a-z]{1,10}", 0..5),
        ) {
            let mut object = serde_json::Map::new();
            for key in keys {
                object.insert(key, Value::Null);
            }
            let _ = decode_reply(&Value::Object(object).to_string());
        }
    }
}
