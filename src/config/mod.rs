//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.wikifeat-admin.toml` in current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** – `WIKIFEAT_ADMIN_ADMIN_USER`,
//!    `WIKIFEAT_ADMIN_ADMIN_PASSWORD`, ...
//! 4. **Command-line arguments** – `--admin-user`/`-u`,
//!    `--admin-password`/`-p`, ...
//!
//! The command, CouchDB host and port are positional and are extracted from
//! the argument list before the remaining flags reach ortho-config.
//!
//! # Configuration File
//!
//! ```toml
//! admin_user = "admin"
//! admin_password = "secret"
//! main_db = "wikifeat_main_db"
//! wikifeat_home = "/opt/wikifeat"
//! domain_name = "wiki.example.com"
//! skip_master = true
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::couch::{AdminCredentials, AdminError};
use crate::migration::SchemaVersion;
use crate::service_config::ServiceParameters;
use crate::setup::{MasterUser, SetupOptions};

/// Main database name used when none is configured.
pub const DEFAULT_MAIN_DB: &str = "wikifeat_main_db";

/// Avatar database name used when none is configured.
pub const DEFAULT_AVATAR_DB: &str = "user_avatars";

/// Wikifeat home used when none is configured.
pub const DEFAULT_WIKIFEAT_HOME: &str = "..";

/// Public domain name used when none is configured.
pub const DEFAULT_DOMAIN_NAME: &str = "localhost";

const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Operation selected by the first positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Provision databases, documents and the master user.
    Setup,
    /// Generate service configuration files.
    Configure,
    /// Setup followed by configure.
    Install,
    /// Migrate the schema between two versions.
    Migrate,
}

impl OperationMode {
    /// The command word.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Configure => "configure",
            Self::Install => "install",
            Self::Migrate => "migrate",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = AdminError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "setup" => Ok(Self::Setup),
            "configure" => Ok(Self::Configure),
            "install" => Ok(Self::Install),
            "migrate" => Ok(Self::Migrate),
            other => Err(AdminError::Configuration {
                message: format!(
                    "unknown command '{other}' (expected setup, configure, install or migrate)"
                ),
            }),
        }
    }
}

/// Parses the CouchDB port positional.
///
/// # Errors
///
/// Returns [`AdminError::Configuration`] when `value` is not a port number.
pub fn parse_port(value: &str) -> Result<u16, AdminError> {
    value
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| AdminError::Configuration {
            message: format!("invalid CouchDB port '{value}'"),
        })
}

/// Administration tool configuration supporting CLI, environment, and file
/// sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use wikifeat_admin::WikifeatAdminConfig;
///
/// let config = WikifeatAdminConfig::load().expect("failed to load configuration");
/// let credentials = config.credentials().expect("admin credentials required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "WIKIFEAT_ADMIN",
    discovery(
        dotfile_name = ".wikifeat-admin.toml",
        config_file_name = "wikifeat-admin.toml",
        app_name = "wikifeat-admin"
    )
)]
pub struct WikifeatAdminConfig {
    /// CouchDB server-admin user.
    ///
    /// Can be provided via:
    /// - CLI: `--admin-user <USER>` or `-u <USER>`
    /// - Environment: `WIKIFEAT_ADMIN_ADMIN_USER`
    /// - Config file: `admin_user = "..."`
    #[ortho_config(cli_short = 'u')]
    pub admin_user: Option<String>,

    /// CouchDB server-admin password.
    ///
    /// Can be provided via:
    /// - CLI: `--admin-password <PASSWORD>` or `-p <PASSWORD>`
    /// - Environment: `WIKIFEAT_ADMIN_ADMIN_PASSWORD`
    /// - Config file: `admin_password = "..."`
    #[ortho_config(cli_short = 'p')]
    pub admin_password: Option<String>,

    /// Connects over HTTPS.
    #[ortho_config()]
    pub use_ssl: bool,

    /// Main Wikifeat database name. Defaults to `wikifeat_main_db`.
    #[ortho_config()]
    pub main_db: Option<String>,

    /// User avatar database name. Defaults to `user_avatars`.
    #[ortho_config()]
    pub avatar_db: Option<String>,

    /// Master user login name.
    #[ortho_config()]
    pub master_username: Option<String>,

    /// Master user password.
    #[ortho_config()]
    pub master_password: Option<String>,

    /// Master user first name.
    #[ortho_config()]
    pub master_firstname: Option<String>,

    /// Master user last name.
    #[ortho_config()]
    pub master_lastname: Option<String>,

    /// Skips master user creation during setup.
    #[ortho_config()]
    pub skip_master: bool,

    /// Wikifeat installation directory. Defaults to the parent directory.
    #[ortho_config()]
    pub wikifeat_home: Option<String>,

    /// Public domain name of the installation. Defaults to `localhost`.
    #[ortho_config()]
    pub domain_name: Option<String>,

    /// Schema version the stored data is currently at. Required by `migrate`.
    #[ortho_config()]
    pub from_version: Option<String>,

    /// Schema version to migrate to. Defaults to the newest known version.
    #[ortho_config()]
    pub to_version: Option<String>,

    /// Runs migrations without touching shared design documents (the main
    /// database and `_users`).
    #[ortho_config()]
    pub skip_shared: bool,

    /// Timeout for each CouchDB request, in seconds.
    ///
    /// Defaults to 30 seconds.
    #[ortho_config()]
    pub request_timeout_seconds: u64,
}

impl Default for WikifeatAdminConfig {
    fn default() -> Self {
        Self {
            admin_user: None,
            admin_password: None,
            use_ssl: false,
            main_db: None,
            avatar_db: None,
            master_username: None,
            master_password: None,
            master_firstname: None,
            master_lastname: None,
            skip_master: false,
            wikifeat_home: None,
            domain_name: None,
            from_version: None,
            to_version: None,
            skip_shared: false,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
    flag: &'static str,
) -> Result<&'a str, AdminError> {
    value
        .filter(|text| !text.is_empty())
        .ok_or(AdminError::MissingCredential { field, flag })
}

/// Checks a database name against CouchDB's naming rules.
fn validate_database_name(name: &str, flag: &str) -> Result<(), AdminError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|first| first.is_ascii_lowercase());
    let rest_allowed = chars.all(|ch| {
        ch.is_ascii_lowercase() || ch.is_ascii_digit() || "_$()+-/".contains(ch)
    });
    if starts_with_letter && rest_allowed {
        Ok(())
    } else {
        Err(AdminError::Configuration {
            message: format!(
                "invalid database name '{name}' for {flag}: names start with a lowercase \
                 letter and contain only a-z, 0-9 and _$()+-/"
            ),
        })
    }
}

impl WikifeatAdminConfig {
    /// Returns the admin credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingCredential`] when the user or password is
    /// not configured.
    pub fn credentials(&self) -> Result<AdminCredentials, AdminError> {
        let user = required(self.admin_user.as_deref(), "CouchDB admin user", "--admin-user")?;
        let password = required(
            self.admin_password.as_deref(),
            "CouchDB admin password",
            "--admin-password",
        )?;
        AdminCredentials::new(user, SecretString::from(password))
    }

    /// Returns the main database name.
    #[must_use]
    pub fn main_database(&self) -> &str {
        self.main_db.as_deref().unwrap_or(DEFAULT_MAIN_DB)
    }

    /// Returns the avatar database name.
    #[must_use]
    pub fn avatar_database(&self) -> &str {
        self.avatar_db.as_deref().unwrap_or(DEFAULT_AVATAR_DB)
    }

    /// Returns the Wikifeat installation directory.
    #[must_use]
    pub fn wikifeat_home(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.wikifeat_home.as_deref().unwrap_or(DEFAULT_WIKIFEAT_HOME))
    }

    /// Returns the public domain name.
    #[must_use]
    pub fn domain_name(&self) -> &str {
        self.domain_name.as_deref().unwrap_or(DEFAULT_DOMAIN_NAME)
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Returns the master user, or `None` when `skip_master` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingCredential`] when any master user field
    /// is missing.
    pub fn master_user(&self) -> Result<Option<MasterUser>, AdminError> {
        if self.skip_master {
            return Ok(None);
        }
        let name = required(
            self.master_username.as_deref(),
            "master username",
            "--master-username",
        )?;
        let password = required(
            self.master_password.as_deref(),
            "master password",
            "--master-password",
        )?;
        let first_name = required(
            self.master_firstname.as_deref(),
            "master first name",
            "--master-firstname",
        )?;
        let last_name = required(
            self.master_lastname.as_deref(),
            "master last name",
            "--master-lastname",
        )?;
        MasterUser::new(name, SecretString::from(password), first_name, last_name).map(Some)
    }

    /// Builds the setup parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when the master user is incomplete.
    pub fn setup_options(&self) -> Result<SetupOptions, AdminError> {
        Ok(SetupOptions {
            main_database: self.main_database().to_owned(),
            avatar_database: self.avatar_database().to_owned(),
            master: self.master_user()?,
        })
    }

    /// Builds the service configuration parameters for a CouchDB server.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingCredential`] when the admin credentials
    /// are incomplete.
    pub fn service_parameters(
        &self,
        database_host: &str,
        database_port: u16,
    ) -> Result<ServiceParameters, AdminError> {
        let credentials = self.credentials()?;
        Ok(ServiceParameters {
            domain_name: self.domain_name().to_owned(),
            database_host: database_host.to_owned(),
            database_port,
            admin_user: credentials.user().to_owned(),
            admin_password: credentials.password().clone(),
        })
    }

    /// Returns the migration range.
    ///
    /// The starting version has no default; the target defaults to the
    /// newest known version.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingCredential`] when `--from-version` is
    /// absent and [`AdminError::Configuration`] when a version is unknown.
    pub fn migration_range(&self) -> Result<(SchemaVersion, SchemaVersion), AdminError> {
        let from = self
            .from_version
            .as_deref()
            .ok_or(AdminError::MissingCredential {
                field: "current schema version",
                flag: "--from-version",
            })?
            .parse()?;
        let to = self
            .to_version
            .as_deref()
            .map_or(Ok(SchemaVersion::LATEST), str::parse)?;
        Ok((from, to))
    }

    /// Validates configuration consistency.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Configuration`] when the timeout is zero, a
    /// database name breaks CouchDB's naming rules, or the migration range
    /// runs backwards.
    pub fn validate(&self) -> Result<(), AdminError> {
        if self.request_timeout_seconds == 0 {
            return Err(AdminError::Configuration {
                message: "request timeout must be at least one second".to_owned(),
            });
        }
        validate_database_name(self.main_database(), "--main-db")?;
        validate_database_name(self.avatar_database(), "--avatar-db")?;
        if self.from_version.is_none() {
            if let Some(to) = self.to_version.as_deref() {
                to.parse::<SchemaVersion>()?;
            }
            return Ok(());
        }
        let (from, to) = self.migration_range()?;
        if from > to {
            return Err(AdminError::Configuration {
                message: format!("--from-version {from} is newer than --to-version {to}"),
            });
        }
        Ok(())
    }
}
