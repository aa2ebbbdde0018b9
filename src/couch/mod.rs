//! CouchDB connection, transport and document-store access.
//!
//! The connection context bundles the blocking HTTP client, the server base
//! URL and the two header sets derived from the admin credentials. It is
//! passed explicitly to every operation; nothing here is global.

pub mod connection;
pub mod credentials;
pub mod error;
pub mod store;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use connection::{CouchConnection, ServerAddress};
pub use credentials::{AdminCredentials, HeaderSets};
pub use error::AdminError;
pub use store::{DocumentStore, Fetched, JsonObject, Rejection};
pub use transport::{Acceptance, CouchPath, CouchRequest, CouchResponse, CouchTransport};

#[cfg(test)]
pub use transport::MockCouchTransport;
