//! Service configuration generation.

use std::io::{self, Write};

use camino::Utf8Path;
use wikifeat_admin::couch::ServerAddress;
use wikifeat_admin::service_config::{ServiceParameters, configure_services};
use wikifeat_admin::telemetry::{StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
use wikifeat_admin::{AdminError, WikifeatAdminConfig};

use super::output::write_configured_services;

/// Writes every service's `config.ini` under the configured Wikifeat home.
///
/// # Errors
///
/// Returns [`AdminError::MissingCredential`] when the admin credentials are
/// incomplete and [`AdminError::Io`] when a template is missing or a file
/// cannot be written.
pub fn run(config: &WikifeatAdminConfig, address: &ServerAddress) -> Result<(), AdminError> {
    let parameters = config.service_parameters(address.host(), address.port())?;
    let home = config.wikifeat_home();
    let mut stdout = io::stdout().lock();
    generate(&home, &parameters, &mut stdout, &StderrJsonlTelemetrySink)
}

/// Generates the configuration files and reports them to `writer`.
///
/// # Errors
///
/// Propagates generation and output failures.
pub fn generate<W: Write>(
    home: &Utf8Path,
    parameters: &ServiceParameters,
    writer: &mut W,
    telemetry: &dyn TelemetrySink,
) -> Result<(), AdminError> {
    tracing::info!("configuring services under {home}");
    let configured = configure_services(home, parameters)?;
    telemetry.record(TelemetryEvent::ServicesConfigured {
        services: configured
            .iter()
            .map(|service| service.service.to_owned())
            .collect(),
    });
    write_configured_services(writer, &configured)
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use rstest::{fixture, rstest};
    use secrecy::SecretString;
    use tempfile::TempDir;
    use wikifeat_admin::AdminError;
    use wikifeat_admin::service_config::ServiceParameters;
    use wikifeat_admin::telemetry::TelemetryEvent;
    use wikifeat_admin::telemetry::test_support::RecordingTelemetrySink;

    use super::generate;

    #[fixture]
    fn parameters() -> ServiceParameters {
        ServiceParameters {
            domain_name: "localhost".to_owned(),
            database_host: "localhost".to_owned(),
            database_port: 5984,
            admin_user: "admin".to_owned(),
            admin_password: SecretString::from("pw"),
        }
    }

    #[rstest]
    fn generate_reports_every_service(parameters: ServiceParameters) {
        let temp = TempDir::new().expect("temp dir should be created");
        let root = Utf8Path::from_path(temp.path()).expect("temp path should be UTF-8");
        for service in ["users", "wikis", "notifications", "frontend/plugins"] {
            std::fs::create_dir_all(root.join(service)).expect("dir should be created");
        }
        for service in ["users", "wikis", "notifications", "frontend"] {
            std::fs::write(root.join(service).join("config.ini.example"), "[Service]\n")
                .expect("template should be written");
        }
        std::fs::write(root.join("frontend/index.html.template"), "")
            .expect("index template should be written");
        std::fs::write(root.join("frontend/plugins/plugins.ini.example"), "")
            .expect("plugins template should be written");
        let telemetry = RecordingTelemetrySink::default();
        let mut buffer = Vec::new();

        generate(root, &parameters, &mut buffer, &telemetry).expect("generate should succeed");

        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");
        assert!(output.contains("  users: users/config.ini"), "{output}");
        assert_eq!(
            telemetry.take(),
            vec![TelemetryEvent::ServicesConfigured {
                services: vec![
                    "users".to_owned(),
                    "wikis".to_owned(),
                    "frontend".to_owned(),
                    "notifications".to_owned(),
                ],
            }]
        );
    }

    #[rstest]
    fn missing_home_is_an_io_error(parameters: ServiceParameters) {
        let telemetry = RecordingTelemetrySink::default();
        let mut buffer = Vec::new();

        let result = generate(
            Utf8Path::new("/nonexistent/wikifeat-home"),
            &parameters,
            &mut buffer,
            &telemetry,
        );

        assert!(
            matches!(result, Err(AdminError::Io { .. })),
            "expected Io error, got {result:?}"
        );
        assert!(telemetry.take().is_empty());
    }
}
