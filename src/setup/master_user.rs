//! The first administrative account.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::couch::AdminError;
use crate::couch::transport::user_document_id;

/// Roles granted to the master user.
pub const MASTER_ROLES: [&str; 3] = ["master", "admin", "all_users"];

/// Details of the master user created by setup.
#[derive(Debug, Clone)]
pub struct MasterUser {
    name: String,
    password: SecretString,
    first_name: String,
    last_name: String,
}

impl MasterUser {
    /// Creates the master user description.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingCredential`] when the name or password
    /// is blank.
    pub fn new(
        name: impl Into<String>,
        password: SecretString,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, AdminError> {
        let name_value = name.into();
        if name_value.trim().is_empty() {
            return Err(AdminError::MissingCredential {
                field: "master username",
                flag: "--master-username",
            });
        }
        if password.expose_secret().is_empty() {
            return Err(AdminError::MissingCredential {
                field: "master password",
                flag: "--master-password",
            });
        }
        Ok(Self {
            name: name_value,
            password,
            first_name: first_name.into(),
            last_name: last_name.into(),
        })
    }

    /// Login name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `_users` document for this user.
    #[must_use]
    pub fn to_document(&self) -> Value {
        json!({
            "_id": user_document_id(&self.name),
            "name": self.name,
            "type": "user",
            "roles": MASTER_ROLES,
            "password": self.password.expose_secret(),
            "userPublic": {
                "lastName": self.last_name,
                "firstName": self.first_name,
            },
        })
    }
}
