//! 0.3a → 0.3.1a: user search by name.

use crate::couch::Acceptance;
use crate::migration::step::{DatabaseSelector, DesignTarget, MigrationStep};
use crate::migration::transform::{DesignPatch, ViewDefinition};
use crate::migration::version::SchemaVersion;

/// Design document holding the user queries in `_users`.
pub const USER_QUERIES: &str = "user_queries";

/// Map function indexing each user under their name, last name and first
/// name, skipping keys already emitted for the same user.
pub const USERS_BY_NAME: &str = r#"
function(doc){
    if(doc.type==="user" && doc.userPublic){
        emit(doc.name, {name: doc.name, roles: doc.roles, userPublic: doc.userPublic});
        if(doc.userPublic.lastName && doc.name !== doc.userPublic.lastName){
            emit(doc.userPublic.lastName, {name: doc.name, roles: doc.roles, userPublic: doc.userPublic});
        }
        if(doc.userPublic.firstName && doc.name !== doc.userPublic.firstName && doc.userPublic.lastName !== doc.userPublic.firstName){
            emit(doc.userPublic.firstName, {name: doc.name, roles: doc.roles, userPublic: doc.userPublic});
        }
    }
}
"#;

/// The `usersByName` view as installed in the user query document.
#[must_use]
pub const fn users_by_name_view() -> DesignPatch {
    DesignPatch::InstallView {
        name: "usersByName",
        view: ViewDefinition::counted(USERS_BY_NAME),
    }
}

/// Installs `usersByName` in the user query design document.
#[must_use]
pub fn step() -> MigrationStep {
    MigrationStep {
        from: SchemaVersion::V0_3a,
        to: SchemaVersion::V0_3_1a,
        summary: "add user search by name",
        targets: vec![DesignTarget::merge(
            DatabaseSelector::Named("_users"),
            USER_QUERIES,
            vec![users_by_name_view()],
            Acceptance::Created,
        )],
        document_pass: None,
    }
}
