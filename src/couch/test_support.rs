//! In-memory CouchDB stand-in for tests.
//!
//! [`FakeCouch`] understands the handful of endpoints this crate uses and
//! enforces revision matching on writes, so tests can exercise create,
//! update and conflict paths without a server.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use http::{Method, StatusCode};
use serde_json::{Map, Value, json};

use super::error::AdminError;
use super::store::JsonObject;
use super::transport::{CouchPath, CouchRequest, CouchResponse, CouchTransport};

#[derive(Debug, Clone, Copy)]
enum Verb {
    Get,
    Put,
    Other,
}

#[derive(Debug, Default)]
struct Database {
    documents: BTreeMap<String, JsonObject>,
    security: Option<Value>,
}

/// In-memory server state.
#[derive(Debug, Default)]
pub struct FakeCouch {
    databases: RefCell<BTreeMap<String, Database>>,
    config: RefCell<BTreeMap<String, Value>>,
    requests: RefCell<Vec<CouchRequest>>,
    forced_statuses: RefCell<Vec<(Method, CouchPath, StatusCode)>>,
    offline: Cell<bool>,
}

impl FakeCouch {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a server holding the named (empty) databases.
    #[must_use]
    pub fn with_databases(names: &[&str]) -> Self {
        let fake = Self::new();
        for name in names {
            fake.create_database(name);
        }
        fake
    }

    /// Creates an empty database.
    pub fn create_database(&self, name: &str) {
        self.databases
            .borrow_mut()
            .entry(name.to_owned())
            .or_default();
    }

    /// Stores a document directly, assigning a first revision when the
    /// document does not carry one.
    pub fn insert_document(&self, database: &str, document: Value) {
        let Value::Object(mut object) = document else {
            panic!("test documents must be JSON objects");
        };
        let id = object
            .get("_id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| panic!("test documents need an _id"));
        object
            .entry("_rev")
            .or_insert_with(|| Value::String("1-seed".to_owned()));
        self.databases
            .borrow_mut()
            .entry(database.to_owned())
            .or_default()
            .documents
            .insert(id, object);
    }

    /// Returns a stored document.
    #[must_use]
    pub fn document(&self, database: &str, id: &str) -> Option<JsonObject> {
        self.databases
            .borrow()
            .get(database)
            .and_then(|db| db.documents.get(id).cloned())
    }

    /// Returns the stored `_security` object of a database.
    #[must_use]
    pub fn security(&self, database: &str) -> Option<Value> {
        self.databases
            .borrow()
            .get(database)
            .and_then(|db| db.security.clone())
    }

    /// Returns a server configuration value (`section/key`).
    #[must_use]
    pub fn config_value(&self, section: &str, key: &str) -> Option<Value> {
        self.config.borrow().get(&format!("{section}/{key}")).cloned()
    }

    /// Returns true when the database exists.
    #[must_use]
    pub fn has_database(&self, name: &str) -> bool {
        self.databases.borrow().contains_key(name)
    }

    /// Makes every matching request answer with `status` instead of being
    /// handled.
    pub fn force_status(&self, method: Method, path: CouchPath, status: StatusCode) {
        self.forced_statuses.borrow_mut().push((method, path, status));
    }

    /// Makes every subsequent request fail at the transport level.
    pub fn go_offline(&self) {
        self.offline.set(true);
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CouchRequest> {
        self.requests.borrow().clone()
    }

    /// Counts PUT requests to `path`.
    #[must_use]
    pub fn put_count(&self, path: &CouchPath) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == Method::PUT && &request.path == path)
            .count()
    }

    fn forced_status(&self, request: &CouchRequest) -> Option<StatusCode> {
        self.forced_statuses
            .borrow()
            .iter()
            .find(|(method, path, _)| *method == request.method && *path == request.path)
            .map(|(_, _, status)| *status)
    }

    fn handle(&self, request: &CouchRequest) -> CouchResponse {
        let segments: Vec<&str> = request.path.segments().iter().map(String::as_str).collect();
        let verb = if request.method == Method::GET {
            Verb::Get
        } else if request.method == Method::PUT {
            Verb::Put
        } else {
            Verb::Other
        };
        match (verb, segments.as_slice()) {
            (Verb::Get, ["_all_dbs"]) => {
                let names: Vec<String> = self.databases.borrow().keys().cloned().collect();
                ok(StatusCode::OK, json!(names))
            }
            (Verb::Put, ["_config", section, key]) => {
                let previous = self.config.borrow_mut().insert(
                    format!("{section}/{key}"),
                    request.body.clone().unwrap_or(Value::Null),
                );
                ok(StatusCode::OK, previous.unwrap_or_else(|| json!("")))
            }
            (Verb::Put, [database]) => self.create_database_request(database),
            (Verb::Get, [database, "_all_docs"]) => self.all_docs(database),
            (Verb::Put, [database, "_security"]) => {
                self.write_security(database, request.body.clone())
            }
            (Verb::Get, [database, "_design", name]) => {
                self.read_document(database, &format!("_design/{name}"))
            }
            (Verb::Put, [database, "_design", name]) => {
                self.write_document(database, &format!("_design/{name}"), request.body.as_ref())
            }
            (Verb::Get, [database, id]) => self.read_document(database, id),
            (Verb::Put, [database, id]) => {
                self.write_document(database, id, request.body.as_ref())
            }
            _ => error(StatusCode::BAD_REQUEST, "bad_request", "unsupported request"),
        }
    }

    fn create_database_request(&self, name: &str) -> CouchResponse {
        let mut databases = self.databases.borrow_mut();
        if databases.contains_key(name) {
            return error(
                StatusCode::PRECONDITION_FAILED,
                "file_exists",
                "The database could not be created, the file already exists.",
            );
        }
        databases.insert(name.to_owned(), Database::default());
        ok(StatusCode::CREATED, json!({"ok": true}))
    }

    fn all_docs(&self, database: &str) -> CouchResponse {
        let databases = self.databases.borrow();
        let Some(db) = databases.get(database) else {
            return missing_database();
        };
        let rows: Vec<Value> = db
            .documents
            .iter()
            .map(|(id, document)| {
                json!({"id": id, "key": id, "value": {"rev": document.get("_rev")}})
            })
            .collect();
        ok(
            StatusCode::OK,
            json!({"total_rows": rows.len(), "offset": 0, "rows": rows}),
        )
    }

    fn write_security(&self, database: &str, body: Option<Value>) -> CouchResponse {
        let mut databases = self.databases.borrow_mut();
        let Some(db) = databases.get_mut(database) else {
            return missing_database();
        };
        db.security = body;
        ok(StatusCode::OK, json!({"ok": true}))
    }

    fn read_document(&self, database: &str, id: &str) -> CouchResponse {
        let databases = self.databases.borrow();
        let Some(db) = databases.get(database) else {
            return missing_database();
        };
        db.documents.get(id).map_or_else(
            || error(StatusCode::NOT_FOUND, "not_found", "missing"),
            |document| ok(StatusCode::OK, Value::Object(document.clone())),
        )
    }

    fn write_document(&self, database: &str, id: &str, body: Option<&Value>) -> CouchResponse {
        let mut databases = self.databases.borrow_mut();
        let Some(db) = databases.get_mut(database) else {
            return missing_database();
        };
        let Some(Value::Object(incoming)) = body else {
            return error(StatusCode::BAD_REQUEST, "bad_request", "Document must be a JSON object");
        };

        let current_rev = db
            .documents
            .get(id)
            .and_then(|document| document.get("_rev"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        let incoming_rev = incoming.get("_rev").and_then(Value::as_str);
        if current_rev.as_deref() != incoming_rev {
            return error(StatusCode::CONFLICT, "conflict", "Document update conflict.");
        }

        let generation = current_rev
            .as_deref()
            .and_then(|rev| rev.split('-').next())
            .and_then(|prefix| prefix.parse::<u32>().ok())
            .unwrap_or(0)
            + 1;
        let new_rev = format!("{generation}-fake");

        let mut stored: Map<String, Value> = incoming.clone();
        stored.insert("_id".to_owned(), Value::String(id.to_owned()));
        stored.insert("_rev".to_owned(), Value::String(new_rev.clone()));
        db.documents.insert(id.to_owned(), stored);

        ok(
            StatusCode::CREATED,
            json!({"ok": true, "id": id, "rev": new_rev}),
        )
    }
}

impl CouchTransport for FakeCouch {
    fn send(&self, request: &CouchRequest) -> Result<CouchResponse, AdminError> {
        self.requests.borrow_mut().push(request.clone());
        if self.offline.get() {
            return Err(AdminError::Network {
                message: format!("{} {} failed: connection refused", request.method, request.path),
            });
        }
        if let Some(status) = self.forced_status(request) {
            return Ok(error(status, "forced", "forced by test"));
        }
        Ok(self.handle(request))
    }
}

fn ok(status: StatusCode, body: Value) -> CouchResponse {
    CouchResponse::new(status, body)
}

fn error(status: StatusCode, kind: &str, reason: &str) -> CouchResponse {
    CouchResponse::new(status, json!({"error": kind, "reason": reason}))
}

fn missing_database() -> CouchResponse {
    error(StatusCode::NOT_FOUND, "not_found", "Database does not exist.")
}
