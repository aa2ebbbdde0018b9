//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use wikifeat_admin::AdminError;
use wikifeat_admin::migration::StepReport;
use wikifeat_admin::service_config::ConfiguredService;
use wikifeat_admin::setup::SetupReport;

/// Writes a setup report to the given writer.
pub fn write_setup_report<W: Write>(writer: &mut W, report: &SetupReport) -> Result<(), AdminError> {
    writeln!(writer, "Setup:").map_err(|e| io_error(&e))?;
    for item in &report.items {
        writeln!(writer, "  {}: {}", item.subject, item.outcome).map_err(|e| io_error(&e))?;
    }
    writeln!(
        writer,
        "{} operations, {} failed",
        report.items.len(),
        report.failures()
    )
    .map_err(|e| io_error(&e))
}

/// Writes one migration step report to the given writer.
pub fn write_step_report<W: Write>(writer: &mut W, report: &StepReport) -> Result<(), AdminError> {
    writeln!(writer, "Migration {}:", report.step).map_err(|e| io_error(&e))?;
    if report.databases.is_empty() {
        writeln!(writer, "  no matching databases").map_err(|e| io_error(&e))?;
    }

    for database in &report.databases {
        writeln!(writer, "  {}", database.database).map_err(|e| io_error(&e))?;
        for design in &database.designs {
            writeln!(writer, "    _design/{}: {}", design.design, design.outcome)
                .map_err(|e| io_error(&e))?;
        }
        if let Some(documents) = database.documents {
            writeln!(
                writer,
                "    documents: {} examined, {} modified, {} failed",
                documents.examined, documents.modified, documents.failed
            )
            .map_err(|e| io_error(&e))?;
        }
        if let Some(reason) = &database.listing_failure {
            writeln!(writer, "    documents: listing failed: {reason}")
                .map_err(|e| io_error(&e))?;
        }
    }

    let counts = report.counts();
    writeln!(
        writer,
        "  {} applied, {} already current, {} failed",
        counts.applied, counts.already_current, counts.failed
    )
    .map_err(|e| io_error(&e))
}

/// Writes the list of generated service files to the given writer.
pub fn write_configured_services<W: Write>(
    writer: &mut W,
    services: &[ConfiguredService],
) -> Result<(), AdminError> {
    writeln!(writer, "Configured services:").map_err(|e| io_error(&e))?;
    for service in services {
        let files: Vec<&str> = service.written.iter().map(|path| path.as_str()).collect();
        writeln!(writer, "  {}: {}", service.service, files.join(", "))
            .map_err(|e| io_error(&e))?;
    }
    Ok(())
}

/// Converts an I/O error to an [`AdminError::Io`].
pub(crate) fn io_error(error: &io::Error) -> AdminError {
    AdminError::Io {
        message: error.to_string(),
    }
}
