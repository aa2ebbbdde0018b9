//! Wikifeat administration library crate.
//!
//! The library provisions a CouchDB server for Wikifeat, generates the
//! per-service configuration files, and migrates stored design documents and
//! records across the application's schema versions. Every server operation
//! takes an explicit [`couch::CouchTransport`], so the same code runs against
//! a live server or an in-memory stand-in.

pub mod config;
pub mod couch;
pub mod migration;
pub mod service_config;
pub mod setup;
pub mod telemetry;

pub use config::{OperationMode, WikifeatAdminConfig};
pub use couch::{AdminCredentials, AdminError, CouchConnection, CouchTransport, ServerAddress};
pub use migration::{MigrationRunner, MigrationStep, SchemaVersion, StepReport};
pub use setup::{SetupOptions, SetupReport, run_setup};
