//! Statement result sets.

use serde_json::{Map, Value};
use websql_protocol::ExecReply;

use crate::error::{ClientError, ClientResult};

/// Ordered rows of one statement's result, each a column-name → value
/// object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows(Vec<Map<String, Value>>);

impl Rows {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the row at `index`, or a range error past the end.
    pub fn item(&self, index: usize) -> ClientResult<&Map<String, Value>> {
        self.0.get(index).ok_or(ClientError::RowIndexOutOfRange {
            index,
            len: self.0.len(),
        })
    }

    /// Iterates over the rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.0.iter()
    }
}

/// Outcome of one executed statement, handed to its success callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    insert_id: Option<i64>,
    rows_affected: i64,
    rows: Rows,
}

impl ResultSet {
    /// Rowid of the row this statement inserted, or [`ClientError::NoInsertId`]
    /// when the statement inserted nothing.
    pub fn insert_id(&self) -> ClientResult<i64> {
        self.insert_id.ok_or(ClientError::NoInsertId)
    }

    /// Number of rows the statement changed.
    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }

    /// The statement's rows.
    pub fn rows(&self) -> &Rows {
        &self.rows
    }
}

impl From<ExecReply> for ResultSet {
    fn from(reply: ExecReply) -> Self {
        ResultSet {
            insert_id: reply.insert_id,
            rows_affected: reply.rows_affected,
            rows: Rows(reply.rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with_rows() -> ResultSet {
        let reply: ExecReply = serde_json::from_value(json!({
            "rows": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}],
            "rowsAffected": 0
        }))
        .unwrap();
        reply.into()
    }

    #[test]
    fn item_returns_rows_in_order() {
        let result = result_with_rows();
        assert_eq!(result.rows().len(), 2);
        assert_eq!(result.rows().item(0).unwrap()["name"], "a");
        assert_eq!(result.rows().item(1).unwrap()["id"], 2);
    }

    #[test]
    fn item_past_the_end_is_a_range_error() {
        let result = result_with_rows();
        match result.rows().item(2).unwrap_err() {
            ClientError::RowIndexOutOfRange { index, len } => {
                assert_eq!(index, 2);
                assert_eq!(len, 2);
            }
            other => panic!("expected RowIndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn insert_id_fails_when_nothing_was_inserted() {
        let result = result_with_rows();
        assert!(matches!(
            result.insert_id().unwrap_err(),
            ClientError::NoInsertId
        ));
    }

    #[test]
    fn insert_id_returns_the_inserted_rowid() {
        let reply: ExecReply =
            serde_json::from_value(json!({"insertId": 41, "rowsAffected": 1})).unwrap();
        let result = ResultSet::from(reply);
        assert_eq!(result.insert_id().unwrap(), 41);
        assert_eq!(result.rows_affected(), 1);
        assert!(result.rows().is_empty());
    }
}
