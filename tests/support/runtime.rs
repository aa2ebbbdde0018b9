//! Tokio runtime and Wiremock helpers for tests that drive a blocking
//! CouchDB client against a mock HTTP server.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use rstest_bdd::Slot;
use secrecy::SecretString;
use tokio::runtime::Runtime;
use url::Url;
use wikifeat_admin::{AdminCredentials, AdminError, CouchConnection};
use wiremock::{Mock, MockServer};

/// Basic token for `admin:secret`.
pub const ADMIN_BASIC: &str = "Basic YWRtaW46c2VjcmV0";

/// Runtime wrapper that can be stored in an `rstest-bdd` Slot.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    pub fn new(runtime: Runtime) -> Self {
        Self(Rc::new(RefCell::new(runtime)))
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }

    /// Mounts every mock on `server`.
    pub fn mount_all(&self, server: &MockServer, mocks: Vec<Mock>) {
        for mock in mocks {
            self.block_on(mock.mount(server));
        }
    }
}

/// Ensures a Tokio runtime and Wiremock server are initialised.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created or if the slots
/// behave unexpectedly.
pub fn ensure_runtime_and_server(
    runtime: &Slot<SharedRuntime>,
    server: &Slot<MockServer>,
) -> Result<SharedRuntime, io::Error> {
    if runtime.with_ref(|_| ()).is_none() {
        runtime.set(SharedRuntime::new(Runtime::new()?));
    }

    let shared_runtime = runtime
        .get()
        .ok_or_else(|| io::Error::other("runtime not initialised after set"))?;

    if server.with_ref(|_| ()).is_none() {
        server.set(shared_runtime.block_on(MockServer::start()));
    }

    Ok(shared_runtime)
}

/// Opens a blocking connection to the mock server as `admin:secret`.
///
/// # Errors
///
/// Returns an error when the server URI cannot be parsed or the client
/// cannot be built.
pub fn connect_to(server: &MockServer) -> Result<CouchConnection, AdminError> {
    let base_url =
        Url::parse(&server.uri()).map_err(|error| AdminError::InvalidUrl(error.to_string()))?;
    let credentials = AdminCredentials::new("admin", SecretString::from("secret"))?;
    CouchConnection::with_base_url(base_url, &credentials, Duration::from_secs(5))
}
