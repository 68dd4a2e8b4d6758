//! In-memory service state and its two protocol faces.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use websql_client::{
    ClientError, ClientResult, ControlEndpoint, SessionConnector, SessionTransport,
};
use websql_protocol::{
    decode_reply, error_envelope, exception_envelope, routes, sqlerror_envelope, success_envelope,
    CloseRequest, Command, ExecReply, FileReadRequest, FileWriteRequest, OpenReply, OpenRequest,
    SqlError, VersionReply, VersionRequest,
};

/// Scripted outcome for one `exec` command.
pub enum ExecOutcome {
    /// The statement succeeds with this reply.
    Ok(ExecReply),
    /// The statement fails with this SQL error.
    Sql(SqlError),
}

struct DbRecord {
    name: String,
    id: u32,
    version: String,
}

struct ServiceState {
    databases: Mutex<Vec<DbRecord>>,
    next_id: AtomicU32,
    command_log: Mutex<Vec<Command>>,
    exec_script: Mutex<VecDeque<ExecOutcome>>,
    files: Mutex<HashMap<String, String>>,
    fail_next_begin: AtomicBool,
    fail_next_commit: AtomicBool,
}

/// In-memory service: implements [`ControlEndpoint`] and
/// [`SessionConnector`] against one shared state.
///
/// Clones share the state, so a test can keep one clone for assertions
/// while handing another to the client.
#[derive(Clone)]
pub struct MemoryService {
    state: Arc<ServiceState>,
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryService {
    /// Creates an empty service.
    pub fn new() -> Self {
        MemoryService {
            state: Arc::new(ServiceState {
                databases: Mutex::new(Vec::new()),
                next_id: AtomicU32::new(1),
                command_log: Mutex::new(Vec::new()),
                exec_script: Mutex::new(VecDeque::new()),
                files: Mutex::new(HashMap::new()),
                fail_next_begin: AtomicBool::new(false),
                fail_next_commit: AtomicBool::new(false),
            }),
        }
    }

    /// Every session command received so far, across all sessions, in
    /// channel order.
    pub fn command_log(&self) -> Vec<Command> {
        self.state.command_log.lock().clone()
    }

    /// Scripts the outcome of the next unscripted `exec`. Outcomes are
    /// consumed in script order; `exec` past the end of the script
    /// succeeds with an empty reply.
    pub fn script_exec(&self, outcome: ExecOutcome) {
        self.state.exec_script.lock().push_back(outcome);
    }

    /// Makes the next `begin` fail with a service fault.
    pub fn fail_next_begin(&self) {
        self.state.fail_next_begin.store(true, Ordering::SeqCst);
    }

    /// Makes the next `commit` fail with a service fault.
    pub fn fail_next_commit(&self) {
        self.state.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Stored version of the named database, if it exists.
    pub fn version_of(&self, name: &str) -> Option<String> {
        self.state
            .databases
            .lock()
            .iter()
            .find(|record| record.name == name)
            .map(|record| record.version.clone())
    }

    /// Content of the named proxied file, if it exists.
    pub fn file_content(&self, file_name: &str) -> Option<String> {
        self.state.files.lock().get(file_name).cloned()
    }

    /// Number of databases currently held.
    pub fn database_count(&self) -> usize {
        self.state.databases.lock().len()
    }

    fn handle_open(&self, body: &str) -> String {
        let request: OpenRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => return error_envelope("", &format!("bad open request: {err}")),
        };

        let mut databases = self.state.databases.lock();
        if let Some(record) = databases.iter().find(|record| record.name == request.name) {
            if !request.version.is_empty() && request.version != record.version {
                return exception_envelope(
                    "InvalidStateError",
                    "requested version does not match the stored version",
                );
            }
            return reply(&OpenReply {
                db_id: record.id,
                created: false,
            });
        }

        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        // With a creation callback pending, the stored version starts
        // empty so the callback can set the real one.
        let version = if request.has_creation_callback {
            String::new()
        } else {
            request.version.clone()
        };
        databases.push(DbRecord {
            name: request.name,
            id,
            version,
        });
        reply(&OpenReply {
            db_id: id,
            created: true,
        })
    }

    fn handle_version(&self, body: &str) -> String {
        let request: VersionRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => return error_envelope("", &format!("bad version request: {err}")),
        };
        let databases = self.state.databases.lock();
        match databases.iter().find(|record| record.id == request.db_id) {
            Some(record) => reply(&VersionReply {
                version: record.version.clone(),
            }),
            None => error_envelope("", "no such database"),
        }
    }

    fn handle_close(&self, body: &str) -> String {
        match serde_json::from_str::<CloseRequest>(body) {
            Ok(_) => success_envelope(Value::Null),
            Err(err) => error_envelope("", &format!("bad close request: {err}")),
        }
    }

    fn handle_write_file(&self, body: &str) -> String {
        let request: FileWriteRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => return error_envelope("", &format!("bad write request: {err}")),
        };
        let mut files = self.state.files.lock();
        if request.is_append {
            files
                .entry(request.file_name)
                .or_default()
                .push_str(&request.data);
        } else {
            files.insert(request.file_name, request.data);
        }
        success_envelope(Value::Null)
    }

    fn handle_read_file(&self, body: &str) -> String {
        let request: FileReadRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => return error_envelope("", &format!("bad read request: {err}")),
        };
        match self.state.files.lock().get(&request.file_name) {
            Some(content) => success_envelope(Value::String(content.clone())),
            None => error_envelope("", "no such file"),
        }
    }
}

fn reply<T: serde::Serialize>(payload: &T) -> String {
    match serde_json::to_value(payload) {
        Ok(value) => success_envelope(value),
        Err(err) => error_envelope("", &format!("encode failure: {err}")),
    }
}

impl ControlEndpoint for MemoryService {
    fn post(&self, path: &str, body: &str) -> ClientResult<String> {
        let envelope = match path {
            routes::OPEN => self.handle_open(body),
            routes::DB_VERSION => self.handle_version(body),
            routes::CLOSE => self.handle_close(body),
            routes::WRITE_FILE => self.handle_write_file(body),
            routes::READ_FILE => self.handle_read_file(body),
            _ => error_envelope("", &format!("unknown route {path}")),
        };
        Ok(envelope)
    }

    fn get(&self, path: &str) -> ClientResult<String> {
        let envelope = match path {
            routes::REMOVE_ALL_DATABASES => {
                self.state.databases.lock().clear();
                success_envelope(Value::Null)
            }
            _ => error_envelope("", &format!("unknown route {path}")),
        };
        Ok(envelope)
    }
}

impl SessionConnector for MemoryService {
    fn connect(&self, db_id: u32) -> ClientResult<Box<dyn SessionTransport>> {
        let exists = self
            .state
            .databases
            .lock()
            .iter()
            .any(|record| record.id == db_id);
        if !exists {
            return Err(ClientError::Transport(format!("no such database {db_id}")));
        }
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            db_id,
            staged_version: None,
            connected: true,
        }))
    }
}

/// One session transport against the shared state.
struct MemorySession {
    state: Arc<ServiceState>,
    db_id: u32,
    staged_version: Option<String>,
    connected: bool,
}

impl MemorySession {
    fn answer(&mut self, command: &Command) -> String {
        match command {
            Command::Begin => {
                if self.state.fail_next_begin.swap(false, Ordering::SeqCst) {
                    error_envelope("", "injected begin failure")
                } else {
                    success_envelope(Value::Null)
                }
            }
            Command::ChangeVersion {
                old_version,
                new_version,
            } => {
                let databases = self.state.databases.lock();
                let Some(record) = databases.iter().find(|record| record.id == self.db_id)
                else {
                    return error_envelope("", "no such database");
                };
                if record.version != *old_version {
                    return sqlerror_envelope(&SqlError::version_mismatch());
                }
                self.staged_version = Some(new_version.clone());
                success_envelope(Value::Null)
            }
            Command::Exec { .. } => match self.state.exec_script.lock().pop_front() {
                Some(ExecOutcome::Ok(exec_reply)) => reply(&exec_reply),
                Some(ExecOutcome::Sql(error)) => sqlerror_envelope(&error),
                None => reply(&ExecReply::default()),
            },
            Command::Commit => {
                if self.state.fail_next_commit.swap(false, Ordering::SeqCst) {
                    return error_envelope("", "injected commit failure");
                }
                if let Some(version) = self.staged_version.take() {
                    let mut databases = self.state.databases.lock();
                    if let Some(record) =
                        databases.iter_mut().find(|record| record.id == self.db_id)
                    {
                        record.version = version;
                    }
                }
                success_envelope(Value::Null)
            }
            Command::Abort => {
                self.staged_version = None;
                success_envelope(Value::Null)
            }
        }
    }
}

impl SessionTransport for MemorySession {
    fn send(&mut self, command: &Command) -> ClientResult<Value> {
        if !self.connected {
            return Err(ClientError::Transport("channel is closed".into()));
        }
        self.state.command_log.lock().push(command.clone());
        let envelope = self.answer(command);
        // Real envelope text through the real normalizer.
        Ok(decode_reply(&envelope)?)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close(&mut self) {
        self.connected = false;
    }
}
