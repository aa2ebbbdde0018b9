//! 0.1a → 0.1.1a: count reduces on the wiki index views.

use crate::couch::Acceptance;
use crate::migration::step::{DatabaseSelector, DesignTarget, MigrationStep};
use crate::migration::transform::{DesignPatch, ReduceKind};
use crate::migration::version::SchemaVersion;

const COUNTED_VIEWS: [&str; 4] = ["getChildPageIndex", "getFileIndex", "getHistory", "getIndex"];

/// Adds `_count` reduces to the page, file and history indexes.
#[must_use]
pub fn step() -> MigrationStep {
    let patches = COUNTED_VIEWS
        .into_iter()
        .map(|view| DesignPatch::SetReduce {
            view,
            reduce: ReduceKind::Count,
        })
        .collect();
    MigrationStep {
        from: SchemaVersion::V0_1a,
        to: SchemaVersion::V0_1_1a,
        summary: "add count reduces to wiki index views",
        targets: vec![DesignTarget::merge(
            DatabaseSelector::WIKIS,
            "wikit",
            patches,
            Acceptance::Created,
        )],
        document_pass: None,
    }
}
