//! Initial provisioning of a Wikifeat CouchDB server.
//!
//! Every operation is safe to repeat: an existing database or user is
//! reported as already present, and design documents are rewritten in place
//! with their current revision.

pub mod documents;
pub mod master_user;
pub mod validation;

use std::fmt;

use http::StatusCode;
use serde_json::Value;

use crate::couch::store::revision;
use crate::couch::{
    Acceptance, AdminError, CouchPath, CouchResponse, CouchTransport, DocumentStore, Fetched,
};
use crate::migration::{DesignPatch, apply_patches};

pub use master_user::MasterUser;

use documents::{AUTH_DESIGN, USER_DESIGN, USERS_DATABASE, main_access, user_queries};
use validation::render_validation;

/// Outcome of one setup operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The resource did not exist and was created.
    Created,
    /// The resource was already present and left alone.
    AlreadyExists,
    /// The resource was written over its previous state.
    Updated,
    /// The operation failed; setup carried on.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl fmt::Display for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::AlreadyExists => f.write_str("already exists"),
            Self::Updated => f.write_str("updated"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// One reported setup operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupItem {
    /// What was provisioned, e.g. `database wikifeat_main_db`.
    pub subject: String,
    /// What happened.
    pub outcome: SetupOutcome,
}

/// Ordered results of a setup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// One entry per operation, in execution order.
    pub items: Vec<SetupItem>,
}

impl SetupReport {
    fn record(&mut self, subject: impl Into<String>, outcome: SetupOutcome) {
        let item = SetupItem {
            subject: subject.into(),
            outcome,
        };
        match &item.outcome {
            SetupOutcome::Failed { reason } => {
                tracing::warn!("{} failed: {reason}", item.subject);
            }
            other => tracing::info!("{}: {other}", item.subject),
        }
        self.items.push(item);
    }

    /// Looks up the outcome recorded for `subject`.
    #[must_use]
    pub fn outcome(&self, subject: &str) -> Option<&SetupOutcome> {
        self.items
            .iter()
            .find(|item| item.subject == subject)
            .map(|item| &item.outcome)
    }

    /// Number of operations that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, SetupOutcome::Failed { .. }))
            .count()
    }
}

/// Parameters of a setup run.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Main database name.
    pub main_database: String,
    /// Avatar database name.
    pub avatar_database: String,
    /// Master user to create, or `None` to skip.
    pub master: Option<MasterUser>,
}

/// Provisions the server.
///
/// # Errors
///
/// Returns an error when the server is unreachable, when a database can be
/// neither created nor found, or when the validation function fails to
/// render. Other failures are recorded in the report.
pub fn run_setup(
    transport: &dyn CouchTransport,
    options: &SetupOptions,
) -> Result<SetupReport, AdminError> {
    let store = DocumentStore::new(transport);
    let mut report = SetupReport::default();

    for database in [&options.main_database, &options.avatar_database] {
        let outcome = create_database(store, database)?;
        report.record(format!("database {database}"), outcome);
    }

    let validation = render_validation(&options.main_database)?;
    report.record(
        format!("{}/_design/{AUTH_DESIGN}", options.main_database),
        install_validation(store, &options.main_database, validation)?,
    );

    report.record(
        format!("{}/_security", options.main_database),
        written(
            &store.put(CouchPath::security(&options.main_database), Some(main_access()))?,
            Acceptance::OkOrCreated,
            SetupOutcome::Updated,
        ),
    );

    report.record(
        "config couch_httpd_auth/public_fields",
        written(
            &store.put(
                CouchPath::config("couch_httpd_auth", "public_fields"),
                Some(Value::String("userPublic".to_owned())),
            )?,
            Acceptance::OkOrCreated,
            SetupOutcome::Updated,
        ),
    );

    report.record(
        format!("{USERS_DATABASE}/_design/{USER_DESIGN}"),
        install_user_queries(store)?,
    );

    match &options.master {
        Some(master) => report.record(
            format!("master user {}", master.name()),
            create_master(store, master)?,
        ),
        None => tracing::info!("skipping master user creation"),
    }

    Ok(report)
}

fn create_database(store: DocumentStore<'_>, database: &str) -> Result<SetupOutcome, AdminError> {
    let response = store.put(CouchPath::database(database), None)?;
    if response.status == StatusCode::CREATED {
        Ok(SetupOutcome::Created)
    } else if response.already_exists() {
        Ok(SetupOutcome::AlreadyExists)
    } else {
        Err(AdminError::Api {
            operation: format!("create database {database}"),
            status: response.status.as_u16(),
            message: response.reason(),
        })
    }
}

fn install_validation(
    store: DocumentStore<'_>,
    main_database: &str,
    source: String,
) -> Result<SetupOutcome, AdminError> {
    let path = CouchPath::design_document(main_database, AUTH_DESIGN);
    let existing = match store.fetch(path.clone())? {
        Fetched::Found(document) => Some(document),
        Fetched::Missing => None,
        Fetched::Rejected(rejection) => {
            return Ok(SetupOutcome::Failed {
                reason: format!("fetch returned {}: {}", rejection.status, rejection.reason),
            });
        }
    };
    let success = if existing.is_some() {
        SetupOutcome::Updated
    } else {
        SetupOutcome::Created
    };
    let document = match apply_patches(existing.as_ref(), &[DesignPatch::SetValidation { source }]) {
        Ok(document) => document,
        Err(error) => {
            return Ok(SetupOutcome::Failed {
                reason: error.to_string(),
            });
        }
    };
    let response = store.put(path, Some(Value::Object(document)))?;
    Ok(written(&response, Acceptance::Created, success))
}

fn install_user_queries(store: DocumentStore<'_>) -> Result<SetupOutcome, AdminError> {
    let path = CouchPath::design_document(USERS_DATABASE, USER_DESIGN);
    let current_revision = match store.fetch(path.clone())? {
        Fetched::Found(document) => revision(&document).map(ToOwned::to_owned),
        Fetched::Missing => None,
        Fetched::Rejected(rejection) => {
            return Ok(SetupOutcome::Failed {
                reason: format!("fetch returned {}: {}", rejection.status, rejection.reason),
            });
        }
    };
    let mut document = user_queries()?;
    let success = match current_revision {
        Some(rev) => {
            document.insert("_rev".to_owned(), Value::String(rev));
            SetupOutcome::Updated
        }
        None => SetupOutcome::Created,
    };
    let response = store.put(path, Some(Value::Object(document)))?;
    Ok(written(&response, Acceptance::OkOrCreated, success))
}

fn create_master(store: DocumentStore<'_>, master: &MasterUser) -> Result<SetupOutcome, AdminError> {
    let response = store.put(CouchPath::user(master.name()), Some(master.to_document()))?;
    Ok(if response.already_exists() {
        SetupOutcome::AlreadyExists
    } else {
        written(&response, Acceptance::OkOrCreated, SetupOutcome::Created)
    })
}

fn written(response: &CouchResponse, acceptance: Acceptance, success: SetupOutcome) -> SetupOutcome {
    if acceptance.accepts(response.status) {
        success
    } else {
        SetupOutcome::Failed {
            reason: format!("write returned {}: {}", response.status, response.reason()),
        }
    }
}
