//! 0.1.1a → 0.2a: page comments and the per-user wiki listing.

use crate::couch::Acceptance;
use crate::migration::step::{DatabaseSelector, DesignTarget, MigrationStep};
use crate::migration::transform::{DesignPatch, ViewDefinition};
use crate::migration::version::SchemaVersion;

const COMMENTS_FOR_PAGE: &str = r#"
    function(doc){
        if(doc.type==="comment"){
            emit([doc.owning_page, doc.created_time], doc);
        }
    }
"#;

/// Filters the wiki listing down to wikis the requesting user may read.
pub const USER_WIKI_LIST: &str = r#"function(head,req){var row;var user=req['userCtx']['name'];var userRoles=req['userCtx']['roles'];var response={total_rows:0,offset:0,rows:[]};while(row=getRow()){var wikiName="wiki_"+row.id; if(userRoles.indexOf(wikiName+":read") > -1 || userRoles.indexOf(wikiName+":admin") > -1 || userRoles.indexOf(wikiName+":write") > -1 || userRoles.indexOf("admin") > -1 || userRoles.indexOf("master") > -1 || row.value.allowGuest){response.rows.push(row);}}response.total_rows=response.rows.length;send(toJSON(response));}"#;

/// Installs the wiki listing filter and creates the comment design
/// document in wikis that lack one.
#[must_use]
pub fn step() -> MigrationStep {
    MigrationStep {
        from: SchemaVersion::V0_1_1a,
        to: SchemaVersion::V0_2a,
        summary: "add page comments and the per-user wiki listing",
        targets: vec![
            DesignTarget::merge(
                DatabaseSelector::MainDatabase,
                "wiki_query",
                vec![DesignPatch::InstallList {
                    name: "userWikiList",
                    source: USER_WIKI_LIST,
                }],
                Acceptance::Created,
            ),
            DesignTarget::create_if_absent(
                DatabaseSelector::WIKIS,
                "wikit_comments",
                vec![DesignPatch::InstallView {
                    name: "getCommentsForPage",
                    view: ViewDefinition::counted(COMMENTS_FOR_PAGE),
                }],
                Acceptance::Created,
            ),
        ],
        document_pass: None,
    }
}
