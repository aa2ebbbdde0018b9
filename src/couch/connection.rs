//! Blocking HTTP connection context for a CouchDB server.

use std::time::Duration;

use http::Method;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use url::Url;

use super::credentials::{AdminCredentials, HeaderSets};
use super::error::AdminError;
use super::transport::{CouchRequest, CouchResponse, CouchTransport};

/// Where the server lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    host: String,
    port: u16,
    use_ssl: bool,
}

impl ServerAddress {
    /// Creates a server address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, use_ssl: bool) -> Self {
        Self {
            host: host.into(),
            port,
            use_ssl,
        }
    }

    /// Host name or IP address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Builds the base URL (`http://host:port/` or `https://host:port/`).
    /// Bare IPv6 literals are bracketed.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidUrl`] when the host is not a valid URL
    /// host.
    pub fn base_url(&self) -> Result<Url, AdminError> {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let host = self.host.trim();
        if host.is_empty() {
            return Err(AdminError::InvalidUrl("CouchDB host must not be blank".to_owned()));
        }
        let url_host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        Url::parse(&format!("{scheme}://{url_host}:{port}/", port = self.port))
            .map_err(|error| AdminError::InvalidUrl(format!("{host}: {error}")))
    }
}

/// An open connection context: transport handle, base URL and the two
/// header sets computed once from the admin credentials.
#[derive(Debug)]
pub struct CouchConnection {
    client: Client,
    base_url: Url,
    headers: HeaderSets,
}

impl CouchConnection {
    /// Builds a connection context for the given server.
    ///
    /// No request is sent; the first request surfaces connectivity problems.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidUrl`] for an unusable address and
    /// [`AdminError::Configuration`] when the HTTP client cannot be built.
    pub fn open(
        address: &ServerAddress,
        credentials: &AdminCredentials,
        timeout: Duration,
    ) -> Result<Self, AdminError> {
        let base_url = address.base_url()?;
        Self::with_base_url(base_url, credentials, timeout)
    }

    /// Builds a connection context for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Configuration`] when the HTTP client cannot be
    /// built or the credentials cannot be encoded as headers.
    pub fn with_base_url(
        base_url: Url,
        credentials: &AdminCredentials,
        timeout: Duration,
    ) -> Result<Self, AdminError> {
        let headers = HeaderSets::from_credentials(credentials)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| AdminError::Configuration {
                message: format!("failed to configure CouchDB HTTP client: {error}"),
            })?;
        Ok(Self {
            client,
            base_url,
            headers,
        })
    }
}

impl CouchTransport for CouchConnection {
    fn send(&self, request: &CouchRequest) -> Result<CouchResponse, AdminError> {
        let url = request.path.resolve(&self.base_url)?;
        tracing::debug!("{} {}", request.method, request.path);

        let builder = if request.method == Method::GET {
            self.client.get(url).headers(self.headers.read().clone())
        } else {
            let put = self
                .client
                .request(request.method.clone(), url)
                .headers(self.headers.write().clone());
            match &request.body {
                Some(body) => put.json(body),
                None => put,
            }
        };

        let response = builder.send().map_err(|error| AdminError::Network {
            message: format!("{} {} failed: {error}", request.method, request.path),
        })?;

        decode_response(response)
    }
}

fn decode_response(response: Response) -> Result<CouchResponse, AdminError> {
    let status = response.status();
    let text = response.text().map_err(|error| AdminError::Network {
        message: format!("reading response body failed: {error}"),
    })?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::Null)
    };
    Ok(CouchResponse::new(status, body))
}
