//! File proxy.
//!
//! Reads and writes files on the service host, one round trip each. The
//! read contract is the legacy one: a missing file (or any failure) reads
//! as the empty string.

use std::sync::Arc;

use websql_client::{call, ClientResult, ControlEndpoint};
use websql_protocol::{routes, FileReadRequest, FileWriteRequest};

/// File read/write proxy over the control endpoint.
pub struct FileStore {
    endpoint: Arc<dyn ControlEndpoint>,
}

impl FileStore {
    /// Creates the store over the given endpoint.
    pub fn new(endpoint: Arc<dyn ControlEndpoint>) -> Self {
        FileStore { endpoint }
    }

    /// Writes (or, with `append`, appends) `data` to the named file.
    pub fn write(&self, file_name: &str, data: &str, append: bool) -> ClientResult<()> {
        let request = FileWriteRequest {
            file_name: file_name.into(),
            data: data.into(),
            is_append: append,
        };
        let _: serde_json::Value = call(self.endpoint.as_ref(), routes::WRITE_FILE, &request)?;
        Ok(())
    }

    /// Reads the named file. Failures read as the empty string.
    pub fn read(&self, file_name: &str) -> String {
        let request = FileReadRequest {
            file_name: file_name.into(),
        };
        match call::<_, String>(self.endpoint.as_ref(), routes::READ_FILE, &request) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(file_name, error = %err, "file read failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use websql_protocol::{error_envelope, success_envelope};

    struct CannedEndpoint {
        reply: String,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ControlEndpoint for CannedEndpoint {
        fn post(&self, path: &str, body: &str) -> ClientResult<String> {
            self.seen.lock().push((path.into(), body.into()));
            Ok(self.reply.clone())
        }

        fn get(&self, _path: &str) -> ClientResult<String> {
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn write_sends_one_round_trip() {
        let endpoint = Arc::new(CannedEndpoint {
            reply: success_envelope(serde_json::Value::Null),
            seen: Mutex::new(Vec::new()),
        });
        let store = FileStore::new(Arc::clone(&endpoint) as Arc<dyn ControlEndpoint>);
        store.write("log.txt", "entry", true).unwrap();

        let seen = endpoint.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, routes::WRITE_FILE);
        assert!(seen[0].1.contains("\"isAppend\":true"));
    }

    #[test]
    fn read_returns_the_content() {
        let endpoint = Arc::new(CannedEndpoint {
            reply: success_envelope(serde_json::json!("file body")),
            seen: Mutex::new(Vec::new()),
        });
        let store = FileStore::new(endpoint);
        assert_eq!(store.read("log.txt"), "file body");
    }

    #[test]
    fn failed_read_is_the_empty_string() {
        let endpoint = Arc::new(CannedEndpoint {
            reply: error_envelope("", "no such file"),
            seen: Mutex::new(Vec::new()),
        });
        let store = FileStore::new(endpoint);
        assert_eq!(store.read("missing.txt"), "");
    }
}
