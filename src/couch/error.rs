//! Error types exposed by the CouchDB administration layer.

use thiserror::Error;

/// Errors that abort an administrative operation.
///
/// Per-database and per-document failures during a migration are not errors;
/// they are recorded as outcomes inside the migration report. Variants here
/// describe conditions after which continuing makes no sense.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    /// The CLI did not include a command.
    #[error("a command is required (one of: setup, configure, install, migrate)")]
    MissingCommand,

    /// A required credential or parameter was not supplied.
    #[error("{field} is required (use {flag})")]
    MissingCredential {
        /// Human-readable name of the missing value.
        field: &'static str,
        /// The CLI flag that supplies it.
        flag: &'static str,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// The server URL could not be constructed.
    #[error("CouchDB URL is invalid: {0}")]
    InvalidUrl(String),

    /// Networking failed while talking to CouchDB.
    #[error("network error talking to CouchDB: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// CouchDB answered with a status that the operation cannot tolerate.
    #[error("CouchDB returned {status} for {operation}: {message}")]
    Api {
        /// The operation being attempted.
        operation: String,
        /// HTTP status code returned.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// A response body could not be decoded into the expected shape.
    #[error("unexpected response from CouchDB for {operation}: {message}")]
    Decode {
        /// The operation being attempted.
        operation: String,
        /// Decoder error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// A built-in template failed to render.
    #[error("template error: {message}")]
    Template {
        /// Details from the template engine.
        message: String,
    },
}
