//! CLI operation mode handlers.
//!
//! This module contains the implementations for different operation modes:
//! - [`setup`]: Provision databases, documents and the master user
//! - [`configure`]: Generate service configuration files
//! - [`migrate`]: Walk the schema forward between two versions
//!
//! `install` is [`setup`] followed by [`configure`]. Output formatting
//! utilities are in [`output`].

use wikifeat_admin::couch::{CouchConnection, ServerAddress};
use wikifeat_admin::{AdminError, WikifeatAdminConfig};

pub mod configure;
pub mod migrate;
pub mod output;
pub mod setup;

/// Opens a connection context to the server named on the command line.
///
/// # Errors
///
/// Returns an error when the admin credentials are incomplete or the
/// address cannot form a URL.
pub fn connect(
    config: &WikifeatAdminConfig,
    address: &ServerAddress,
) -> Result<CouchConnection, AdminError> {
    let credentials = config.credentials()?;
    tracing::info!(
        "connecting to CouchDB at {}:{} as {}",
        address.host(),
        address.port(),
        credentials.user()
    );
    CouchConnection::open(address, &credentials, config.request_timeout())
}

/// Runs setup and then configure against the same server.
///
/// # Errors
///
/// Returns the first fatal error from either phase; configure does not run
/// when setup fails fatally.
pub fn install(config: &WikifeatAdminConfig, address: &ServerAddress) -> Result<(), AdminError> {
    setup::run(config, address)?;
    configure::run(config, address)
}
