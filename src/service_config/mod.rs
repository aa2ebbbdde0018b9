//! Generates each service's `config.ini` from its shipped template.
//!
//! Every service directory under the Wikifeat home carries a
//! `config.ini.example`. The installer copies it to `config.ini` with the
//! service identity and CouchDB connection keys filled in.

pub mod ini;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use secrecy::{ExposeSecret, SecretString};

use crate::couch::AdminError;

pub use ini::IniTemplate;

const TEMPLATE_NAME: &str = "config.ini.example";
const CONFIG_NAME: &str = "config.ini";

/// Port the frontend listens on.
pub const FRONTEND_PORT: u16 = 8081;

/// Identity of one Wikifeat service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceProfile {
    /// Service name used in logs and reports.
    pub name: &'static str,
    /// Directory under the Wikifeat home.
    pub directory: &'static str,
    /// Registry node identifier.
    pub node_id: &'static str,
    /// Listening port.
    pub port: u16,
    /// Extra `(template, destination)` files copied verbatim, relative to
    /// the service directory.
    pub copies: &'static [(&'static str, &'static str)],
    /// Whether the service needs the public site URL.
    pub needs_site_url: bool,
}

/// The users service.
pub const USERS: ServiceProfile = ServiceProfile {
    name: "users",
    directory: "users",
    node_id: "us1",
    port: 4100,
    copies: &[],
    needs_site_url: false,
};

/// The wikis service.
pub const WIKIS: ServiceProfile = ServiceProfile {
    name: "wikis",
    directory: "wikis",
    node_id: "ws1",
    port: 4110,
    copies: &[],
    needs_site_url: false,
};

/// The notifications service.
pub const NOTIFICATIONS: ServiceProfile = ServiceProfile {
    name: "notifications",
    directory: "notifications",
    node_id: "ns1",
    port: 4120,
    copies: &[],
    needs_site_url: true,
};

/// The web frontend.
pub const FRONTEND: ServiceProfile = ServiceProfile {
    name: "frontend",
    directory: "frontend",
    node_id: "fe1",
    port: FRONTEND_PORT,
    copies: &[
        ("index.html.template", "index.html"),
        ("plugins/plugins.ini.example", "plugins/plugins.ini"),
    ],
    needs_site_url: false,
};

/// Services in the order they are configured.
pub const PROFILES: [ServiceProfile; 4] = [USERS, WIKIS, FRONTEND, NOTIFICATIONS];

/// Values written into every service configuration.
#[derive(Debug, Clone)]
pub struct ServiceParameters {
    /// Public domain name of the installation.
    pub domain_name: String,
    /// CouchDB host.
    pub database_host: String,
    /// CouchDB port.
    pub database_port: u16,
    /// CouchDB admin user.
    pub admin_user: String,
    /// CouchDB admin password.
    pub admin_password: SecretString,
}

/// What was written for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredService {
    /// Service name.
    pub service: &'static str,
    /// Files written, relative to the Wikifeat home.
    pub written: Vec<Utf8PathBuf>,
}

/// The public URL of the frontend: `http://<domain>`, with the port unless
/// it is 80 or 443.
#[must_use]
pub fn main_site_url(domain_name: &str, port: u16) -> String {
    match port {
        80 | 443 => format!("http://{domain_name}"),
        _ => format!("http://{domain_name}:{port}"),
    }
}

/// Applies the service and database keys to a template.
#[must_use]
pub fn render_service_config(
    template: &str,
    profile: &ServiceProfile,
    parameters: &ServiceParameters,
) -> String {
    let mut config = IniTemplate::parse(template);
    config.set("Service", "domainName", &parameters.domain_name);
    config.set("Service", "nodeId", profile.node_id);
    config.set("Service", "port", &profile.port.to_string());
    config.set("Database", "dbAddr", &parameters.database_host);
    config.set("Database", "dbPort", &parameters.database_port.to_string());
    config.set("Database", "dbAdminUser", &parameters.admin_user);
    config.set(
        "Database",
        "dbAdminPassword",
        parameters.admin_password.expose_secret(),
    );
    if profile.needs_site_url {
        config.set(
            "Notifications",
            "mainSiteUrl",
            &main_site_url(&parameters.domain_name, FRONTEND_PORT),
        );
    }
    config.render()
}

/// Configures every service under `home`.
///
/// # Errors
///
/// Returns [`AdminError::Io`] when `home` cannot be opened, a template is
/// missing, or a file cannot be written. Services configured before the
/// failure keep their new files.
pub fn configure_services(
    home: &Utf8Path,
    parameters: &ServiceParameters,
) -> Result<Vec<ConfiguredService>, AdminError> {
    let dir = Dir::open_ambient_dir(home, ambient_authority()).map_err(|error| AdminError::Io {
        message: format!("failed to open Wikifeat home '{home}': {error}"),
    })?;
    PROFILES
        .iter()
        .map(|profile| configure_service(&dir, profile, parameters))
        .collect()
}

/// Configures one service inside an opened Wikifeat home.
///
/// # Errors
///
/// Returns [`AdminError::Io`] when the template is missing or a file cannot
/// be written.
pub fn configure_service(
    home: &Dir,
    profile: &ServiceProfile,
    parameters: &ServiceParameters,
) -> Result<ConfiguredService, AdminError> {
    tracing::info!("configuring {} service", profile.name);
    let service_dir = Utf8Path::new(profile.directory);
    let template_path = service_dir.join(TEMPLATE_NAME);
    let config_path = service_dir.join(CONFIG_NAME);

    let template = home
        .read_to_string(&template_path)
        .map_err(|error| AdminError::Io {
            message: format!("failed to read template '{template_path}': {error}"),
        })?;
    home.write(&config_path, render_service_config(&template, profile, parameters))
        .map_err(|error| AdminError::Io {
            message: format!("failed to write '{config_path}': {error}"),
        })?;

    let mut written = vec![config_path];
    for (source, destination) in profile.copies {
        let from = service_dir.join(source);
        let to = service_dir.join(destination);
        home.copy(&from, home, &to).map_err(|error| AdminError::Io {
            message: format!("failed to copy '{from}' to '{to}': {error}"),
        })?;
        written.push(to);
    }

    Ok(ConfiguredService {
        service: profile.name,
        written,
    })
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use rstest::{fixture, rstest};
    use secrecy::SecretString;
    use tempfile::TempDir;

    use super::{
        FRONTEND, NOTIFICATIONS, ServiceParameters, USERS, configure_services, main_site_url,
        render_service_config,
    };
    use crate::couch::AdminError;
    use crate::service_config::IniTemplate;

    const TEMPLATE: &str = "[Service]\ndomainName = example.org\nnodeId = x\nport = 0\n\n[Database]\ndbAddr = db\n";

    #[fixture]
    fn parameters() -> ServiceParameters {
        ServiceParameters {
            domain_name: "wiki.example.com".to_owned(),
            database_host: "couch.internal".to_owned(),
            database_port: 5984,
            admin_user: "admin".to_owned(),
            admin_password: SecretString::from("s3cret"),
        }
    }

    #[rstest]
    #[case::default_frontend(8081, "http://wiki.example.com:8081")]
    #[case::http(80, "http://wiki.example.com")]
    #[case::https(443, "http://wiki.example.com")]
    fn site_url_omits_standard_ports(#[case] port: u16, #[case] expected: &str) {
        assert_eq!(main_site_url("wiki.example.com", port), expected);
    }

    #[rstest]
    fn renders_service_and_database_keys(parameters: ServiceParameters) {
        let rendered = IniTemplate::parse(&render_service_config(TEMPLATE, &USERS, &parameters));

        assert_eq!(rendered.get("Service", "nodeId").as_deref(), Some("us1"));
        assert_eq!(rendered.get("Service", "port").as_deref(), Some("4100"));
        assert_eq!(
            rendered.get("Service", "domainName").as_deref(),
            Some("wiki.example.com")
        );
        assert_eq!(rendered.get("Database", "dbPort").as_deref(), Some("5984"));
        assert_eq!(
            rendered.get("Database", "dbAdminPassword").as_deref(),
            Some("s3cret")
        );
        assert_eq!(rendered.get("Notifications", "mainSiteUrl"), None);
    }

    #[rstest]
    fn notifications_link_back_to_the_frontend(parameters: ServiceParameters) {
        let rendered =
            IniTemplate::parse(&render_service_config(TEMPLATE, &NOTIFICATIONS, &parameters));

        assert_eq!(
            rendered.get("Notifications", "mainSiteUrl").as_deref(),
            Some("http://wiki.example.com:8081")
        );
    }

    fn seed_home(root: &Utf8Path) {
        for service in ["users", "wikis", "notifications", "frontend"] {
            std::fs::create_dir_all(root.join(service)).expect("service dir should be created");
            std::fs::write(root.join(service).join("config.ini.example"), TEMPLATE)
                .expect("template should be written");
        }
        std::fs::create_dir_all(root.join("frontend/plugins")).expect("plugins dir should be created");
        std::fs::write(root.join("frontend/index.html.template"), "<html></html>")
            .expect("index template should be written");
        std::fs::write(root.join("frontend/plugins/plugins.ini.example"), "[Plugins]\n")
            .expect("plugins template should be written");
    }

    #[rstest]
    fn configures_every_service_and_copies_frontend_files(parameters: ServiceParameters) {
        let temp = TempDir::new().expect("temp dir should be created");
        let root = Utf8Path::from_path(temp.path()).expect("temp path should be UTF-8");
        seed_home(root);

        let configured = configure_services(root, &parameters).expect("configure should succeed");

        let services: Vec<&str> = configured.iter().map(|service| service.service).collect();
        assert_eq!(services, ["users", "wikis", "frontend", "notifications"]);
        let frontend = std::fs::read_to_string(root.join("frontend/config.ini"))
            .expect("frontend config should exist");
        assert!(frontend.contains(&format!("nodeId = {}", FRONTEND.node_id)));
        assert_eq!(
            std::fs::read_to_string(root.join("frontend/index.html")).expect("index should exist"),
            "<html></html>"
        );
        assert!(root.join("frontend/plugins/plugins.ini").exists());
    }

    #[rstest]
    fn missing_template_is_an_error(parameters: ServiceParameters) {
        let temp = TempDir::new().expect("temp dir should be created");
        let root = Utf8Path::from_path(temp.path()).expect("temp path should be UTF-8");

        let result = configure_services(root, &parameters);

        assert!(
            matches!(&result, Err(AdminError::Io { message }) if message.contains("users/config.ini.example")),
            "expected missing template error, got {result:?}"
        );
    }
}
