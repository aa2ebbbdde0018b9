//! Initial provisioning.

use std::io::{self, Write};

use wikifeat_admin::couch::{CouchTransport, ServerAddress};
use wikifeat_admin::setup::{SetupOptions, SetupReport, run_setup};
use wikifeat_admin::telemetry::{StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
use wikifeat_admin::{AdminError, WikifeatAdminConfig};

use super::connect;
use super::output::write_setup_report;

/// Provisions the server and prints the report.
///
/// # Errors
///
/// Returns configuration errors before connecting, and fatal setup errors
/// (unreachable server, uncreatable database) afterwards.
pub fn run(config: &WikifeatAdminConfig, address: &ServerAddress) -> Result<(), AdminError> {
    let options = config.setup_options()?;
    let connection = connect(config, address)?;
    let mut stdout = io::stdout().lock();
    provision(
        &connection,
        &options,
        &mut stdout,
        &StderrJsonlTelemetrySink,
    )
    .map(drop)
}

/// Runs setup over any transport, writing the report to `writer`.
///
/// # Errors
///
/// Propagates fatal setup errors and output failures.
pub fn provision<W: Write>(
    transport: &dyn CouchTransport,
    options: &SetupOptions,
    writer: &mut W,
    telemetry: &dyn TelemetrySink,
) -> Result<SetupReport, AdminError> {
    let report = run_setup(transport, options)?;
    telemetry.record(TelemetryEvent::setup_completed(&report));
    write_setup_report(writer, &report)?;
    Ok(report)
}
