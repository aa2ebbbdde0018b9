//! Typed document-store operations built on a [`CouchTransport`].

use http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::AdminError;
use super::transport::{CouchPath, CouchRequest, CouchResponse, CouchTransport};

/// A JSON object document as stored by CouchDB.
pub type JsonObject = Map<String, Value>;

/// A non-success response for a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// HTTP status returned by the server.
    pub status: StatusCode,
    /// CouchDB reason or reason phrase.
    pub reason: String,
}

impl Rejection {
    fn from_response(response: &CouchResponse) -> Self {
        Self {
            status: response.status,
            reason: response.reason(),
        }
    }
}

/// Result of reading one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The resource exists.
    Found(T),
    /// The server answered 404.
    Missing,
    /// The server answered with another non-success status, or the body had
    /// an unexpected shape.
    Rejected(Rejection),
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
}

/// Document-store client over any transport.
#[derive(Clone, Copy)]
pub struct DocumentStore<'transport> {
    transport: &'transport dyn CouchTransport,
}

impl<'transport> DocumentStore<'transport> {
    /// Wraps a transport.
    #[must_use]
    pub const fn new(transport: &'transport dyn CouchTransport) -> Self {
        Self { transport }
    }

    /// Lists every database on the server.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Network`] when the server is unreachable,
    /// [`AdminError::Api`] for a non-200 answer, and [`AdminError::Decode`]
    /// when the body is not a list of names. Without the listing no
    /// migration can proceed, so all three are fatal.
    pub fn all_databases(&self) -> Result<Vec<String>, AdminError> {
        let operation = "list databases";
        let response = self
            .transport
            .send(&CouchRequest::get(CouchPath::all_databases()))?;
        if response.status != StatusCode::OK {
            return Err(AdminError::Api {
                operation: operation.to_owned(),
                status: response.status.as_u16(),
                message: response.reason(),
            });
        }
        serde_json::from_value(response.body).map_err(|error| AdminError::Decode {
            operation: operation.to_owned(),
            message: error.to_string(),
        })
    }

    /// Reads a JSON object at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Network`] when the server is unreachable.
    pub fn fetch(&self, path: CouchPath) -> Result<Fetched<JsonObject>, AdminError> {
        let response = self.transport.send(&CouchRequest::get(path))?;
        Ok(match response.status {
            StatusCode::OK => match response.body {
                Value::Object(document) => Fetched::Found(document),
                _ => Fetched::Rejected(Rejection {
                    status: response.status,
                    reason: "response body is not a JSON object".to_owned(),
                }),
            },
            StatusCode::NOT_FOUND => Fetched::Missing,
            _ => Fetched::Rejected(Rejection::from_response(&response)),
        })
    }

    /// Lists the ids of every document in a database, design documents
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Network`] when the server is unreachable.
    pub fn all_document_ids(&self, database: &str) -> Result<Fetched<Vec<String>>, AdminError> {
        let response = self
            .transport
            .send(&CouchRequest::get(CouchPath::all_documents(database)))?;
        Ok(match response.status {
            StatusCode::OK => match serde_json::from_value::<AllDocsResponse>(response.body) {
                Ok(listing) => Fetched::Found(listing.rows.into_iter().map(|row| row.id).collect()),
                Err(error) => Fetched::Rejected(Rejection {
                    status: StatusCode::OK,
                    reason: format!("unexpected _all_docs body: {error}"),
                }),
            },
            StatusCode::NOT_FOUND => Fetched::Missing,
            _ => Fetched::Rejected(Rejection::from_response(&response)),
        })
    }

    /// Writes `body` at `path` and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Network`] when the server is unreachable.
    pub fn put(&self, path: CouchPath, body: Option<Value>) -> Result<CouchResponse, AdminError> {
        self.transport.send(&CouchRequest::put(path, body))
    }
}

/// Returns the `_rev` of a fetched document, if any.
#[must_use]
pub fn revision(document: &JsonObject) -> Option<&str> {
    document.get("_rev").and_then(Value::as_str)
}
