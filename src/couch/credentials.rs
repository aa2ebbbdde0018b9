//! Admin credentials and the request-header sets derived from them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use super::error::AdminError;

const JSON_MEDIA_TYPE: &str = "application/json";

/// CouchDB server-admin credentials.
///
/// The password is held as a [`SecretString`] so it never appears in debug
/// output or logs.
#[derive(Debug)]
pub struct AdminCredentials {
    user: String,
    password: SecretString,
}

impl AdminCredentials {
    /// Builds credentials from a user name and password.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MissingCredential`] when the user name is blank.
    pub fn new(user: impl Into<String>, password: SecretString) -> Result<Self, AdminError> {
        let user_value = user.into();
        if user_value.trim().is_empty() {
            return Err(AdminError::MissingCredential {
                field: "CouchDB admin user",
                flag: "--admin-user",
            });
        }
        Ok(Self {
            user: user_value,
            password,
        })
    }

    /// Returns the admin user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the password for callers that must forward it verbatim.
    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Encodes `user:password` as base64 for HTTP Basic authentication.
    #[must_use]
    pub fn basic_token(&self) -> String {
        let raw = format!("{}:{}", self.user, self.password.expose_secret());
        STANDARD.encode(raw.as_bytes())
    }
}

/// The two header sets used for every request.
///
/// Read requests carry `Accept` and `Authorization`; write requests add
/// `Content-Type: application/json`.
#[derive(Debug, Clone)]
pub struct HeaderSets {
    read: HeaderMap,
    write: HeaderMap,
}

impl HeaderSets {
    /// Computes both header sets from the admin credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Configuration`] when the credentials contain
    /// characters that cannot appear in an HTTP header.
    pub fn from_credentials(credentials: &AdminCredentials) -> Result<Self, AdminError> {
        let mut authorization = HeaderValue::from_str(&format!(
            "Basic {}",
            credentials.basic_token()
        ))
        .map_err(|error| AdminError::Configuration {
            message: format!("credentials cannot be sent as a header: {error}"),
        })?;
        authorization.set_sensitive(true);

        let mut read = HeaderMap::new();
        read.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        read.insert(AUTHORIZATION, authorization);

        let mut write = read.clone();
        write.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));

        Ok(Self { read, write })
    }

    /// Headers for GET requests.
    #[must_use]
    pub const fn read(&self) -> &HeaderMap {
        &self.read
    }

    /// Headers for PUT requests.
    #[must_use]
    pub const fn write(&self) -> &HeaderMap {
        &self.write
    }
}
