//! Migration steps as data.

use crate::couch::Acceptance;

use super::rename::FieldRename;
use super::transform::DesignPatch;
use super::version::SchemaVersion;

/// Prefix shared by every per-wiki database.
pub const WIKI_PREFIX: &str = "wiki_";

/// Chooses the databases a target applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseSelector {
    /// Every database whose name starts with the prefix.
    Prefix(&'static str),
    /// Exactly one database.
    Named(&'static str),
    /// The configured main database.
    MainDatabase,
}

impl DatabaseSelector {
    /// Every per-wiki database.
    pub const WIKIS: Self = Self::Prefix(WIKI_PREFIX);

    /// Returns true when `database` is selected.
    #[must_use]
    pub fn matches(self, database: &str, main_database: &str) -> bool {
        match self {
            Self::Prefix(prefix) => database.starts_with(prefix),
            Self::Named(name) => database == name,
            Self::MainDatabase => database == main_database,
        }
    }

    /// Returns true for selectors naming one shared database rather than a
    /// family of per-wiki databases.
    #[must_use]
    pub const fn is_shared(self) -> bool {
        !matches!(self, Self::Prefix(_))
    }
}

/// What to do when the design document already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresencePolicy {
    /// Apply the patches on top of the existing document.
    Merge,
    /// Leave an existing document untouched.
    KeepExisting,
}

/// One design document to bring up to date in every selected database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignTarget {
    /// Databases to visit.
    pub selector: DatabaseSelector,
    /// Design document name, without the `_design/` prefix.
    pub design: &'static str,
    /// Ordered edits.
    pub patches: Vec<DesignPatch>,
    /// Behaviour when the document exists.
    pub presence: PresencePolicy,
    /// Statuses accepted for the write.
    pub acceptance: Acceptance,
}

impl DesignTarget {
    /// A target that merges `patches` into `design`.
    #[must_use]
    pub const fn merge(
        selector: DatabaseSelector,
        design: &'static str,
        patches: Vec<DesignPatch>,
        acceptance: Acceptance,
    ) -> Self {
        Self {
            selector,
            design,
            patches,
            presence: PresencePolicy::Merge,
            acceptance,
        }
    }

    /// A target that only creates `design` when it is absent.
    #[must_use]
    pub const fn create_if_absent(
        selector: DatabaseSelector,
        design: &'static str,
        patches: Vec<DesignPatch>,
        acceptance: Acceptance,
    ) -> Self {
        Self {
            selector,
            design,
            patches,
            presence: PresencePolicy::KeepExisting,
            acceptance,
        }
    }
}

/// Field renames applied to every document of the selected databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPass {
    /// Databases to walk.
    pub selector: DatabaseSelector,
    /// Renames applied to each document.
    pub renames: Vec<FieldRename>,
    /// Statuses accepted for each document write.
    pub acceptance: Acceptance,
}

/// One schema-version transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    /// Version the step starts from.
    pub from: SchemaVersion,
    /// Version the step produces.
    pub to: SchemaVersion,
    /// One-line description.
    pub summary: &'static str,
    /// Design documents to update, in order.
    pub targets: Vec<DesignTarget>,
    /// Optional document walk, run after the design updates of each database.
    pub document_pass: Option<DocumentPass>,
}

impl MigrationStep {
    /// `"<from> -> <to>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }

    /// Drops the targets that edit shared databases.
    #[must_use]
    pub fn without_shared_targets(mut self) -> Self {
        self.targets.retain(|target| !target.selector.is_shared());
        self
    }

    /// Returns true when any part of the step applies to `database`.
    #[must_use]
    pub fn touches(&self, database: &str, main_database: &str) -> bool {
        self.targets
            .iter()
            .map(|target| target.selector)
            .chain(self.document_pass.as_ref().map(|pass| pass.selector))
            .any(|selector| selector.matches(database, main_database))
    }
}
