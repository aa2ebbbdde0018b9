//! Validation function guarding writes to the main database.

use minijinja::{Environment, context};

use crate::couch::AdminError;

/// Role every administrator carries.
pub const ADMIN_ROLE: &str = "admin";

const VALIDATION_TEMPLATE: &str = r#"
    function(newDoc, oldDoc, userCtx){
        if((userCtx.roles.indexOf("{{ admin_role }}") === -1) &&
            (userCtx.roles.indexOf("{{ write_role }}") === -1) &&
            (userCtx.roles.indexOf("master") === -1) &&
            (userCtx.roles.indexOf("_admin") === -1)){
                throw({forbidden: "Not authorized"});
            }
    }
"#;

/// The role granting write access to `main_database`.
#[must_use]
pub fn write_role(main_database: &str) -> String {
    format!("{main_database}:write")
}

/// Renders the `validate_doc_update` source for `main_database`.
///
/// # Errors
///
/// Returns [`AdminError::Template`] if the template fails to render.
pub fn render_validation(main_database: &str) -> Result<String, AdminError> {
    let mut environment = Environment::new();
    environment.set_auto_escape_callback(|_| minijinja::AutoEscape::None);

    environment
        .add_template("validation", VALIDATION_TEMPLATE)
        .map_err(|error| AdminError::Template {
            message: error.to_string(),
        })?;

    let template = environment
        .get_template("validation")
        .map_err(|error| AdminError::Template {
            message: error.to_string(),
        })?;

    template
        .render(context! {
            admin_role => ADMIN_ROLE,
            write_role => write_role(main_database),
        })
        .map_err(|error| AdminError::Template {
            message: error.to_string(),
        })
}
