//! Transaction channel commands and control messages.
//!
//! A transaction session is a strict command/reply conversation over the
//! persistent channel: the client sends one [`Command`] as a JSON text
//! message and waits for exactly one envelope reply before sending the
//! next. Control messages (open, version read, close, file proxy) travel
//! over plain request/response calls instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One command on the transaction channel.
///
/// The wire form carries the variant name in the `cmd` member, e.g.
/// `{"cmd":"exec","statement":"SELECT 1","args":[]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Command {
    /// Opens a transaction on the session's database.
    Begin,
    /// Verifies `old_version` against the stored version and stages
    /// `new_version`, inside the open transaction.
    #[serde(rename_all = "camelCase")]
    ChangeVersion {
        /// Version the database is expected to hold.
        old_version: String,
        /// Version to store if the check passes.
        new_version: String,
    },
    /// Executes one parameterized statement inside the open transaction.
    Exec {
        /// SQL text with `?` placeholders.
        statement: String,
        /// Positional arguments, one JSON scalar per placeholder.
        args: Vec<Value>,
    },
    /// Commits the open transaction.
    Commit,
    /// Rolls back the open transaction. Also sent as a harmless no-op
    /// during teardown when nothing is open.
    Abort,
}

/// Blocking open request: locate a database by name, creating it if absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    /// Database name. Must be non-empty.
    pub name: String,
    /// Version the caller expects, or empty to accept any.
    pub version: String,
    /// Display name, kept for the legacy signature; the service ignores it.
    pub display_name: String,
    /// Size hint in bytes; the service ignores it.
    pub estimated_size: u64,
    /// Whether the caller supplied a creation callback. When true and the
    /// database is created, the service stores an empty version so the
    /// callback can set the real one.
    pub has_creation_callback: bool,
}

/// Reply to [`OpenRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenReply {
    /// Service-assigned database id, stable for the life of the service.
    pub db_id: u32,
    /// True when this open created the database.
    #[serde(default)]
    pub created: bool,
}

/// Blocking version read for one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRequest {
    /// Target database id.
    pub db_id: u32,
}

/// Reply to [`VersionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionReply {
    /// Stored version string, possibly empty.
    pub version: String,
}

/// Best-effort notice that the client is done with a database handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    /// Target database id.
    pub db_id: u32,
}

/// Reply to [`Command::Exec`], carried in the `data` member of the envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecReply {
    /// Result rows as column-name → value objects. Empty for statements
    /// that produce no rows.
    #[serde(default)]
    pub rows: Vec<serde_json::Map<String, Value>>,
    /// Rowid of the last insert. Omitted when the last statement on the
    /// session was not an INSERT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<i64>,
    /// Number of rows changed by the statement.
    #[serde(default)]
    pub rows_affected: i64,
}

/// File proxy: write or append `data` to the named file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWriteRequest {
    /// Target file name on the service host.
    pub file_name: String,
    /// Content to write.
    pub data: String,
    /// Append instead of truncate.
    pub is_append: bool,
}

/// File proxy: read the named file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReadRequest {
    /// Source file name on the service host.
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn begin_has_only_the_tag() {
        let wire = serde_json::to_string(&Command::Begin).unwrap();
        assert_eq!(wire, r#"{"cmd":"begin"}"#);
    }

    #[test]
    fn change_version_uses_camel_case_members() {
        let cmd = Command::ChangeVersion {
            old_version: "1.0".into(),
            new_version: "2.0".into(),
        };
        let wire: Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            wire,
            json!({"cmd":"changeVersion","oldVersion":"1.0","newVersion":"2.0"})
        );
    }

    #[test]
    fn exec_carries_statement_and_args() {
        let cmd = Command::Exec {
            statement: "INSERT INTO t VALUES (?, ?)".into(),
            args: vec![json!(1), json!("two")],
        };
        let wire: Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(wire["cmd"], "exec");
        assert_eq!(wire["statement"], "INSERT INTO t VALUES (?, ?)");
        assert_eq!(wire["args"], json!([1, "two"]));
    }

    #[test]
    fn commands_parse_back_from_wire_text() {
        let cmd: Command = serde_json::from_str(r#"{"cmd":"abort"}"#).unwrap();
        assert_eq!(cmd, Command::Abort);
        let cmd: Command =
            serde_json::from_str(r#"{"cmd":"exec","statement":"SELECT 1","args":[]}"#).unwrap();
        assert!(matches!(cmd, Command::Exec { .. }));
    }

    #[test]
    fn exec_reply_defaults_missing_members() {
        let reply: ExecReply = serde_json::from_str(r#"{"rowsAffected":3}"#).unwrap();
        assert!(reply.rows.is_empty());
        assert_eq!(reply.insert_id, None);
        assert_eq!(reply.rows_affected, 3);
    }

    #[test]
    fn exec_reply_omits_absent_insert_id() {
        let reply = ExecReply {
            rows: Vec::new(),
            insert_id: None,
            rows_affected: 0,
        };
        let wire: Value = serde_json::to_value(&reply).unwrap();
        assert!(wire.get("insertId").is_none());
    }

    #[test]
    fn open_request_wire_members() {
        let req = OpenRequest {
            name: "notes".into(),
            version: "1.0".into(),
            display_name: "Notes".into(),
            estimated_size: 5_000_000,
            has_creation_callback: false,
        };
        let wire: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(wire["displayName"], "Notes");
        assert_eq!(wire["estimatedSize"], 5_000_000);
        assert_eq!(wire["hasCreationCallback"], false);
    }

    #[test]
    fn open_reply_created_defaults_false() {
        let reply: OpenReply = serde_json::from_str(r#"{"dbId":7}"#).unwrap();
        assert_eq!(reply.db_id, 7);
        assert!(!reply.created);
    }
}
