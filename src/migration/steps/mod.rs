//! The historical schema transitions and the planner that chains them.

pub mod comments;
pub mod consistent_api;
pub mod image_index;
pub mod reduce_counts;
pub mod user_search;

use crate::couch::AdminError;

use super::step::MigrationStep;
use super::version::SchemaVersion;

/// Every known step, oldest first.
///
/// There is no step for 0.3.1a → 0.4a; that release did not change the
/// database.
#[must_use]
pub fn catalogue() -> Vec<MigrationStep> {
    vec![
        reduce_counts::step(),
        comments::step(),
        consistent_api::step(),
        user_search::step(),
        image_index::step(),
    ]
}

/// Selects the steps that take a database from `from` to `to`, in order.
///
/// # Errors
///
/// Returns [`AdminError::Configuration`] when `from` is newer than `to`.
pub fn plan(from: SchemaVersion, to: SchemaVersion) -> Result<Vec<MigrationStep>, AdminError> {
    if from > to {
        return Err(AdminError::Configuration {
            message: format!("cannot migrate backwards from {from} to {to}"),
        });
    }
    Ok(catalogue()
        .into_iter()
        .filter(|step| from <= step.from && step.to <= to)
        .collect())
}
