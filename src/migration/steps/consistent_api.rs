//! 0.2a → 0.3a: camel-case field names across wiki documents.

use crate::couch::Acceptance;
use crate::migration::rename::FieldRename;
use crate::migration::step::{DatabaseSelector, DesignTarget, DocumentPass, MigrationStep};
use crate::migration::transform::{DesignPatch, ViewDefinition};
use crate::migration::version::SchemaVersion;

const HISTORY: &str = r#"
    function(doc) {
        if(doc.type==="page"){
            emit([doc.owningPage, doc.timestamp],
            {
                documentId: doc._id,
                documentRev: doc._rev,
                editor: doc.editor,
                contentSize: doc.content.raw.length
            });
        }
    }
"#;

const INDEX: &str = r#"
    function(doc){
        if(doc.type==="page" && doc._id === doc.owningPage){
            emit(doc.title, {
                id: doc._id,
                slug: doc.slug,
                title: doc.title,
                owner: doc.owner,
                editor: doc.editor,
                timestamp: doc.timestamp
            });
        }
    }
"#;

const CHILD_PAGE_INDEX: &str = r#"
    function(doc) {
        if(doc.type==="page" && doc._id === doc.owningPage){
            emit(doc.parent, {
                id: doc._id,
                slug: doc.slug,
                title: doc.title,
                owner: doc.owner,
                editor: doc.editor,
                timestamp: doc.timestamp
            });
        }
    }
"#;

const COMMENTS_FOR_PAGE: &str = r#"
    function(doc){
        if(doc.type==="comment"){
            emit([doc.owningPage, doc.createdTime], doc);
        }
    }
"#;

/// Field renames applied to every wiki document.
#[must_use]
pub fn renames() -> Vec<FieldRename> {
    vec![
        FieldRename::any("owning_page", "owningPage"),
        FieldRename::for_type("page", "comments_disabled", "commentsDisabled"),
        FieldRename::for_type("comment", "created_at", "createdAt"),
        FieldRename::for_type("comment", "modified_at", "modifiedAt"),
    ]
}

/// Rewrites the page and comment views against the new field names, then
/// renames the fields on stored documents.
#[must_use]
pub fn step() -> MigrationStep {
    MigrationStep {
        from: SchemaVersion::V0_2a,
        to: SchemaVersion::V0_3a,
        summary: "switch wiki documents to camel-case field names",
        targets: vec![
            DesignTarget::merge(
                DatabaseSelector::WIKIS,
                "wikit",
                vec![
                    DesignPatch::InstallView {
                        name: "getHistory",
                        view: ViewDefinition::counted(HISTORY),
                    },
                    DesignPatch::InstallView {
                        name: "getIndex",
                        view: ViewDefinition::counted(INDEX),
                    },
                    DesignPatch::InstallView {
                        name: "getChildPageIndex",
                        view: ViewDefinition::counted(CHILD_PAGE_INDEX),
                    },
                ],
                Acceptance::Created,
            ),
            DesignTarget::merge(
                DatabaseSelector::WIKIS,
                "wikit_comments",
                vec![DesignPatch::InstallView {
                    name: "getCommentsForPage",
                    view: ViewDefinition::counted(COMMENTS_FOR_PAGE),
                }],
                Acceptance::OkOrCreated,
            ),
        ],
        document_pass: Some(DocumentPass {
            selector: DatabaseSelector::WIKIS,
            renames: renames(),
            acceptance: Acceptance::Created,
        }),
    }
}
