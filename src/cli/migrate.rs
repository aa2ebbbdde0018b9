//! Schema migration.

use std::io::{self, Write};

use wikifeat_admin::couch::{CouchTransport, ServerAddress};
use wikifeat_admin::migration::{MigrationRunner, MigrationStep, StepReport, plan};
use wikifeat_admin::telemetry::{StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
use wikifeat_admin::{AdminError, WikifeatAdminConfig};

use super::connect;
use super::output::write_step_report;

/// Migrates every database between the configured versions.
///
/// # Errors
///
/// Returns configuration errors for an unknown or backwards version range
/// and transport errors that abort a step.
pub fn run(config: &WikifeatAdminConfig, address: &ServerAddress) -> Result<(), AdminError> {
    let (from, to) = config.migration_range()?;
    let mut steps = plan(from, to)?;
    if config.skip_shared {
        steps = steps
            .into_iter()
            .map(MigrationStep::without_shared_targets)
            .collect();
    }
    tracing::info!("migrating from {from} to {to}: {} step(s)", steps.len());

    let connection = connect(config, address)?;
    let mut stdout = io::stdout().lock();
    migrate(
        &connection,
        config.main_database(),
        &steps,
        &mut stdout,
        &StderrJsonlTelemetrySink,
    )
    .map(drop)
}

/// Runs `steps` in order, printing and recording each report as it
/// completes.
///
/// # Errors
///
/// Stops at the first step that aborts; reports for earlier steps have
/// already been written.
pub fn migrate<W: Write>(
    transport: &dyn CouchTransport,
    main_database: &str,
    steps: &[MigrationStep],
    writer: &mut W,
    telemetry: &dyn TelemetrySink,
) -> Result<Vec<StepReport>, AdminError> {
    let runner = MigrationRunner::new(transport, main_database);
    let mut reports = Vec::with_capacity(steps.len());
    for step in steps {
        let report = runner.run(step)?;
        telemetry.record(TelemetryEvent::step_completed(&report));
        write_step_report(writer, &report)?;
        reports.push(report);
    }
    Ok(reports)
}
