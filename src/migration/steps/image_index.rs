//! 0.4a → 0.5: image file index.

use crate::couch::Acceptance;
use crate::migration::step::{DatabaseSelector, DesignTarget, MigrationStep};
use crate::migration::transform::{DesignPatch, ViewDefinition};
use crate::migration::version::SchemaVersion;

const IMAGE_FILE_INDEX: &str = r#"
function(doc){
    if(doc.type==="file"){
        const att=doc._attachments;
        const contentType=att[Object.keys(att)[0]].content_type;
        if(contentType.substring(0,6)==="image/"){
            emit(doc.name,doc);
        }
    }
}
"#;

/// Adds the view listing files whose first attachment is an image.
#[must_use]
pub fn step() -> MigrationStep {
    MigrationStep {
        from: SchemaVersion::V0_4a,
        to: SchemaVersion::V0_5,
        summary: "add the image file index",
        targets: vec![DesignTarget::merge(
            DatabaseSelector::WIKIS,
            "wikit",
            vec![DesignPatch::InstallView {
                name: "getImageFileIndex",
                view: ViewDefinition::counted(IMAGE_FILE_INDEX),
            }],
            Acceptance::OkOrCreated,
        )],
        document_pass: None,
    }
}
