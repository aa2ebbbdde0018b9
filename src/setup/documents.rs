//! Fixed documents installed by setup.

use serde_json::{Value, json};

use crate::couch::{AdminError, JsonObject};
use crate::migration::steps::user_search::{USER_QUERIES, users_by_name_view};
use crate::migration::{DesignPatch, ReduceKind, ViewDefinition, apply_patches};

use super::validation::ADMIN_ROLE;

/// Name of the main database's validation design document.
pub const AUTH_DESIGN: &str = "_auth";

/// The user design document's name.
pub const USER_DESIGN: &str = USER_QUERIES;

/// Name of the `_users` system database.
pub const USERS_DATABASE: &str = "_users";

const LIST_USERS: &str = r#"
function(doc){
    if(doc.type==="user"){
        emit(doc.name, {name: doc.name, roles: doc.roles, userPublic: doc.userPublic});
    }
}
"#;

const USERS_BY_ROLE: &str = r#"
function(doc){
    if(doc.type==="user" && doc.roles){
        for(var i = 0; i < doc.roles.length; i++){
            emit(doc.roles[i], {name: doc.name, roles: doc.roles, userPublic: doc.userPublic});
        }
    }
}
"#;

const BROWSE_USERS: &str = r#"
function(head, req){
    var row;
    var seen = {};
    var response = {total_rows: 0, offset: 0, rows: []};
    while(row = getRow()){
        if(row.id){
            if(!seen[row.id]){
                seen[row.id] = true;
                response.rows.push(row);
            }
        } else {
            response.rows.push(row);
        }
    }
    response.total_rows = response.rows.length;
    send(toJSON(response));
}
"#;

/// Access control for the main database: administrators may change it,
/// everyone may read it.
#[must_use]
pub fn main_access() -> Value {
    json!({
        "admins": {"names": [], "roles": [ADMIN_ROLE, "master"]},
        "members": {"names": [], "roles": []}
    })
}

/// The user query design document, without a revision.
///
/// # Errors
///
/// Returns [`AdminError::Configuration`] if the built-in patches do not
/// apply, which would indicate a broken build.
pub fn user_queries() -> Result<JsonObject, AdminError> {
    let patches = [
        DesignPatch::InstallView {
            name: "listUsers",
            view: ViewDefinition {
                map: LIST_USERS,
                reduce: None,
            },
        },
        DesignPatch::InstallView {
            name: "usersByRole",
            view: ViewDefinition {
                map: USERS_BY_ROLE,
                reduce: Some(ReduceKind::Count),
            },
        },
        users_by_name_view(),
        DesignPatch::InstallList {
            name: "browseUsers",
            source: BROWSE_USERS,
        },
    ];
    let mut document = apply_patches(None, &patches).map_err(|error| AdminError::Configuration {
        message: format!("built-in user design document is invalid: {error}"),
    })?;
    document.insert(
        "_id".to_owned(),
        Value::String(format!("_design/{USER_DESIGN}")),
    );
    document.insert("language".to_owned(), Value::String("javascript".to_owned()));
    Ok(document)
}
