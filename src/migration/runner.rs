//! Executes one migration step against a server.

use serde_json::Value;

use crate::couch::{AdminError, CouchPath, CouchTransport, DocumentStore, Fetched, JsonObject};

use super::rename::apply_renames;
use super::report::{
    DatabaseReport, DesignReport, DocumentPassReport, StepReport, TargetOutcome,
};
use super::step::{DesignTarget, DocumentPass, MigrationStep, PresencePolicy};
use super::transform::apply_patches;

/// Runs steps against one server.
///
/// The runner keeps no state between steps. Transport failures abort the
/// run; everything else becomes part of the returned [`StepReport`].
pub struct MigrationRunner<'transport> {
    store: DocumentStore<'transport>,
    main_database: String,
}

impl<'transport> MigrationRunner<'transport> {
    /// Creates a runner resolving [`super::DatabaseSelector::MainDatabase`]
    /// to `main_database`.
    #[must_use]
    pub fn new(transport: &'transport dyn CouchTransport, main_database: impl Into<String>) -> Self {
        Self {
            store: DocumentStore::new(transport),
            main_database: main_database.into(),
        }
    }

    /// Applies `step` to every database it selects.
    ///
    /// # Errors
    ///
    /// Returns an error when the server is unreachable or the database
    /// listing cannot be read.
    pub fn run(&self, step: &MigrationStep) -> Result<StepReport, AdminError> {
        tracing::info!("running migration step {}: {}", step.label(), step.summary);
        let databases = self.store.all_databases()?;

        let mut reports = Vec::new();
        for database in databases
            .iter()
            .filter(|name| step.touches(name, &self.main_database))
        {
            reports.push(self.run_database(step, database)?);
        }

        Ok(StepReport {
            step: step.label(),
            databases: reports,
        })
    }

    fn run_database(&self, step: &MigrationStep, database: &str) -> Result<DatabaseReport, AdminError> {
        tracing::info!("examining {database}");
        let mut report = DatabaseReport::new(database);

        for target in step
            .targets
            .iter()
            .filter(|target| target.selector.matches(database, &self.main_database))
        {
            let outcome = self.run_target(database, target)?;
            match &outcome {
                TargetOutcome::Failed { reason } => {
                    tracing::warn!("{database}/_design/{} not updated: {reason}", target.design);
                }
                other => tracing::info!("{database}/_design/{}: {other}", target.design),
            }
            report.designs.push(DesignReport {
                design: target.design.to_owned(),
                outcome,
            });
        }

        if let Some(pass) = step
            .document_pass
            .as_ref()
            .filter(|pass| pass.selector.matches(database, &self.main_database))
        {
            match self.run_document_pass(database, pass)? {
                Ok(documents) => {
                    tracing::info!(
                        "updated {} of {} records in {database}",
                        documents.modified,
                        documents.examined
                    );
                    report.documents = Some(documents);
                }
                Err(reason) => {
                    tracing::warn!("could not list documents in {database}: {reason}");
                    report.listing_failure = Some(reason);
                }
            }
        }

        Ok(report)
    }

    fn run_target(&self, database: &str, target: &DesignTarget) -> Result<TargetOutcome, AdminError> {
        let path = CouchPath::design_document(database, target.design);
        let existing = match self.store.fetch(path.clone())? {
            Fetched::Found(document) => Some(document),
            Fetched::Missing => None,
            Fetched::Rejected(rejection) => {
                return Ok(TargetOutcome::Failed {
                    reason: format!("fetch returned {}: {}", rejection.status, rejection.reason),
                });
            }
        };

        if target.presence == PresencePolicy::KeepExisting && existing.is_some() {
            return Ok(TargetOutcome::AlreadyCurrent);
        }

        let updated = match apply_patches(existing.as_ref(), &target.patches) {
            Ok(updated) => updated,
            Err(error) => {
                return Ok(TargetOutcome::Failed {
                    reason: error.to_string(),
                });
            }
        };
        if existing.as_ref() == Some(&updated) {
            return Ok(TargetOutcome::AlreadyCurrent);
        }

        let response = self.store.put(path, Some(Value::Object(updated)))?;
        Ok(if target.acceptance.accepts(response.status) {
            TargetOutcome::Applied
        } else {
            TargetOutcome::Failed {
                reason: format!("write returned {}: {}", response.status, response.reason()),
            }
        })
    }

    /// Walks every document in `database`. The inner error carries the
    /// reason the listing failed.
    fn run_document_pass(
        &self,
        database: &str,
        pass: &DocumentPass,
    ) -> Result<Result<DocumentPassReport, String>, AdminError> {
        tracing::info!("updating records in {database}, this might take a while");
        let ids = match self.store.all_document_ids(database)? {
            Fetched::Found(ids) => ids,
            Fetched::Missing => return Ok(Err("database does not exist".to_owned())),
            Fetched::Rejected(rejection) => {
                return Ok(Err(format!("{}: {}", rejection.status, rejection.reason)));
            }
        };

        let mut counts = DocumentPassReport::default();
        for id in ids {
            let path = CouchPath::document(database, &id);
            let mut document = match self.store.fetch(path.clone())? {
                Fetched::Found(document) => document,
                Fetched::Missing | Fetched::Rejected(_) => {
                    tracing::warn!("could not fetch {database}/{id}");
                    counts.failed += 1;
                    continue;
                }
            };
            counts.examined += 1;

            if !correct(&mut document, pass) {
                continue;
            }
            let response = self.store.put(path, Some(Value::Object(document)))?;
            if pass.acceptance.accepts(response.status) {
                counts.modified += 1;
            } else {
                tracing::warn!(
                    "could not write {database}/{id}: {} {}",
                    response.status,
                    response.reason()
                );
                counts.failed += 1;
            }
        }
        Ok(Ok(counts))
    }
}

/// Applies the pass's renames to an ordinary document. Design documents are
/// never rewritten by a document pass.
fn correct(document: &mut JsonObject, pass: &DocumentPass) -> bool {
    let is_design = document
        .get("_id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with("_design/"));
    !is_design && apply_renames(&pass.renames, document)
}
