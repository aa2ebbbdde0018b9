//! Schema migration engine.
//!
//! Each historical upgrade is a [`MigrationStep`]: a list of design-document
//! targets plus an optional document pass. The [`MigrationRunner`] applies a
//! step to every database its selectors match and reports per-database
//! outcomes; [`steps::plan`] chains the steps between two versions.

pub mod rename;
pub mod report;
pub mod runner;
pub mod step;
pub mod steps;
pub mod transform;
pub mod version;

pub use rename::FieldRename;
pub use report::{
    DatabaseReport, DesignReport, DocumentPassReport, OutcomeCounts, StepReport, TargetOutcome,
};
pub use runner::MigrationRunner;
pub use step::{DatabaseSelector, DesignTarget, DocumentPass, MigrationStep, PresencePolicy};
pub use steps::{catalogue, plan};
pub use transform::{DesignPatch, PatchError, ReduceKind, ViewDefinition, apply_patches};
pub use version::SchemaVersion;
