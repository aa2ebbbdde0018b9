//! Request/response primitives and the transport seam.
//!
//! Everything that talks to CouchDB goes through [`CouchTransport`]. The
//! production implementation is [`super::connection::CouchConnection`]; tests
//! substitute fakes or mocks.

use std::fmt;

use http::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use super::error::AdminError;

const DESIGN_PREFIX: &str = "_design/";

/// A server-relative CouchDB path made of unencoded segments.
///
/// Segments are percent-encoded only when joined onto the server URL, so a
/// database or document name containing `/` stays a single segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchPath {
    segments: Vec<String>,
}

impl CouchPath {
    fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `/_all_dbs`
    #[must_use]
    pub fn all_databases() -> Self {
        Self::from_segments(["_all_dbs"])
    }

    /// `/<db>`
    #[must_use]
    pub fn database(database: &str) -> Self {
        Self::from_segments([database])
    }

    /// `/<db>/_all_docs`
    #[must_use]
    pub fn all_documents(database: &str) -> Self {
        Self::from_segments([database, "_all_docs"])
    }

    /// `/<db>/_design/<name>`
    #[must_use]
    pub fn design_document(database: &str, name: &str) -> Self {
        Self::from_segments([database, "_design", name])
    }

    /// `/<db>/<id>`, keeping the `_design/` prefix of design document ids as
    /// a literal path separator.
    #[must_use]
    pub fn document(database: &str, id: &str) -> Self {
        id.strip_prefix(DESIGN_PREFIX).map_or_else(
            || Self::from_segments([database, id]),
            |name| Self::design_document(database, name),
        )
    }

    /// `/<db>/_security`
    #[must_use]
    pub fn security(database: &str) -> Self {
        Self::from_segments([database, "_security"])
    }

    /// `/_config/<section>/<key>`
    #[must_use]
    pub fn config(section: &str, key: &str) -> Self {
        Self::from_segments(["_config", section, key])
    }

    /// `/_users/org.couchdb.user:<name>`
    #[must_use]
    pub fn user(name: &str) -> Self {
        Self::from_segments(["_users".to_owned(), user_document_id(name)])
    }

    /// The unencoded path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves the path against the server base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidUrl`] when the base URL cannot carry a
    /// path (for example a `data:` URL).
    pub fn resolve(&self, base: &Url) -> Result<Url, AdminError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| AdminError::InvalidUrl(format!("{base} cannot be a base URL")))?;
            path.pop_if_empty();
            path.extend(&self.segments);
        }
        Ok(url)
    }
}

impl fmt::Display for CouchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Returns the `_users` document id for a user name.
#[must_use]
pub fn user_document_id(name: &str) -> String {
    format!("org.couchdb.user:{name}")
}

/// A single request against the server.
#[derive(Debug, Clone, PartialEq)]
pub struct CouchRequest {
    /// HTTP method; only GET and PUT are issued.
    pub method: Method,
    /// Server-relative path.
    pub path: CouchPath,
    /// JSON body for PUT requests.
    pub body: Option<Value>,
}

impl CouchRequest {
    /// Builds a GET request.
    #[must_use]
    pub const fn get(path: CouchPath) -> Self {
        Self {
            method: Method::GET,
            path,
            body: None,
        }
    }

    /// Builds a PUT request with an optional JSON body.
    #[must_use]
    pub const fn put(path: CouchPath, body: Option<Value>) -> Self {
        Self {
            method: Method::PUT,
            path,
            body,
        }
    }
}

/// Status and decoded body of a response.
///
/// Bodies that are empty or not JSON decode to [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct CouchResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Decoded JSON body.
    pub body: Value,
}

impl CouchResponse {
    /// Creates a response from its parts.
    #[must_use]
    pub const fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns CouchDB's `reason` (or `error`) field, falling back to the
    /// canonical reason phrase.
    #[must_use]
    pub fn reason(&self) -> String {
        self.body
            .get("reason")
            .or_else(|| self.body.get("error"))
            .and_then(Value::as_str)
            .map_or_else(
                || {
                    self.status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_owned()
                },
                ToOwned::to_owned,
            )
    }

    /// Returns true for 409 Conflict and 412 Precondition Failed, which
    /// CouchDB uses to signal that a resource already exists.
    #[must_use]
    pub fn already_exists(&self) -> bool {
        matches!(
            self.status,
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED
        )
    }
}

/// The set of statuses a write accepts as success.
///
/// The historical scripts disagree on whether 200 counts alongside 201, so
/// each write declares its own set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Only 201 Created.
    Created,
    /// 200 OK or 201 Created.
    OkOrCreated,
}

impl Acceptance {
    /// Returns true when `status` counts as a successful write.
    #[must_use]
    pub fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::Created => status == StatusCode::CREATED,
            Self::OkOrCreated => matches!(status, StatusCode::OK | StatusCode::CREATED),
        }
    }
}

/// Sends requests to a CouchDB server.
#[cfg_attr(test, mockall::automock)]
pub trait CouchTransport {
    /// Sends one request and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Network`] when the server cannot be reached.
    /// HTTP error statuses are not errors; they are returned in the
    /// response.
    fn send(&self, request: &CouchRequest) -> Result<CouchResponse, AdminError>;
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use rstest::rstest;
    use serde_json::{Value, json};
    use url::Url;

    use super::{Acceptance, CouchPath, CouchResponse};

    #[rstest]
    #[case::all_dbs(CouchPath::all_databases(), "/_all_dbs")]
    #[case::design(CouchPath::design_document("wiki_a", "wikit"), "/wiki_a/_design/wikit")]
    #[case::design_id(CouchPath::document("wiki_a", "_design/wikit"), "/wiki_a/_design/wikit")]
    #[case::plain_id(CouchPath::document("wiki_a", "page-1"), "/wiki_a/page-1")]
    #[case::user(CouchPath::user("alice"), "/_users/org.couchdb.user:alice")]
    #[case::config(
        CouchPath::config("couch_httpd_auth", "public_fields"),
        "/_config/couch_httpd_auth/public_fields"
    )]
    fn paths_render_as_server_relative(#[case] path: CouchPath, #[case] expected: &str) {
        assert_eq!(path.to_string(), expected);
    }

    #[test]
    fn resolve_encodes_slashes_inside_a_segment() {
        let base = Url::parse("http://localhost:5984").expect("base URL should parse");
        let url = CouchPath::document("wiki_a", "odd/id")
            .resolve(&base)
            .expect("path should resolve");

        assert_eq!(url.as_str(), "http://localhost:5984/wiki_a/odd%2Fid");
    }

    #[test]
    fn resolve_keeps_base_path_prefix() {
        let base = Url::parse("https://example.org/couch").expect("base URL should parse");
        let url = CouchPath::all_databases()
            .resolve(&base)
            .expect("path should resolve");

        assert_eq!(url.as_str(), "https://example.org/couch/_all_dbs");
    }

    #[rstest]
    #[case::created_only_accepts_201(Acceptance::Created, StatusCode::CREATED, true)]
    #[case::created_only_rejects_200(Acceptance::Created, StatusCode::OK, false)]
    #[case::ok_or_created_accepts_200(Acceptance::OkOrCreated, StatusCode::OK, true)]
    #[case::ok_or_created_rejects_409(Acceptance::OkOrCreated, StatusCode::CONFLICT, false)]
    fn acceptance_sets(
        #[case] acceptance: Acceptance,
        #[case] status: StatusCode,
        #[case] expected: bool,
    ) {
        assert_eq!(acceptance.accepts(status), expected);
    }

    #[test]
    fn reason_prefers_couch_reason_field() {
        let response = CouchResponse::new(
            StatusCode::CONFLICT,
            json!({"error": "conflict", "reason": "Document update conflict."}),
        );
        assert_eq!(response.reason(), "Document update conflict.");

        let bare = CouchResponse::new(StatusCode::NOT_FOUND, Value::Null);
        assert_eq!(bare.reason(), "Not Found");
    }
}
