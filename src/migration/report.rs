//! Structured results of a migration step.

use std::fmt;

/// Outcome for one design document in one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// The document was written.
    Applied,
    /// Nothing needed to change, so nothing was written.
    AlreadyCurrent,
    /// The document could not be read, transformed or written.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::AlreadyCurrent => f.write_str("already current"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome for one design target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignReport {
    /// Design document name.
    pub design: String,
    /// What happened.
    pub outcome: TargetOutcome,
}

/// Counts from a document pass over one database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentPassReport {
    /// Documents fetched and inspected.
    pub examined: usize,
    /// Documents changed and written with an accepted status.
    pub modified: usize,
    /// Documents that could not be fetched or written.
    pub failed: usize,
}

/// Everything a step did to one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseReport {
    /// Database name.
    pub database: String,
    /// One entry per design target, in step order.
    pub designs: Vec<DesignReport>,
    /// Document pass counts, when the step has a pass for this database.
    pub documents: Option<DocumentPassReport>,
    /// Set when the document listing itself failed.
    pub listing_failure: Option<String>,
}

impl DatabaseReport {
    pub(crate) fn new(database: &str) -> Self {
        Self {
            database: database.to_owned(),
            designs: Vec::new(),
            documents: None,
            listing_failure: None,
        }
    }
}

/// Tally of design outcomes across a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    /// Written documents.
    pub applied: usize,
    /// Untouched documents.
    pub already_current: usize,
    /// Failures.
    pub failed: usize,
}

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// `"<from> -> <to>"`.
    pub step: String,
    /// One entry per visited database, in server listing order.
    pub databases: Vec<DatabaseReport>,
}

impl StepReport {
    /// Tallies design outcomes.
    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        self.databases
            .iter()
            .flat_map(|database| &database.designs)
            .fold(OutcomeCounts::default(), |mut counts, design| {
                match design.outcome {
                    TargetOutcome::Applied => counts.applied += 1,
                    TargetOutcome::AlreadyCurrent => counts.already_current += 1,
                    TargetOutcome::Failed { .. } => counts.failed += 1,
                }
                counts
            })
    }

    /// Total documents rewritten by the document pass.
    #[must_use]
    pub fn documents_modified(&self) -> usize {
        self.databases
            .iter()
            .filter_map(|database| database.documents)
            .map(|documents| documents.modified)
            .sum()
    }

    /// Total documents the document pass failed on, plus failed listings.
    #[must_use]
    pub fn documents_failed(&self) -> usize {
        self.databases
            .iter()
            .map(|database| {
                database.documents.map_or(0, |documents| documents.failed)
                    + usize::from(database.listing_failure.is_some())
            })
            .sum()
    }

    /// Looks up the outcome for one database and design document.
    #[must_use]
    pub fn outcome(&self, database: &str, design: &str) -> Option<&TargetOutcome> {
        self.databases
            .iter()
            .find(|report| report.database == database)?
            .designs
            .iter()
            .find(|report| report.design == design)
            .map(|report| &report.outcome)
    }
}
