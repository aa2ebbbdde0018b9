//! Operational telemetry events and sinks.
//!
//! Each completed migration step, setup run and configuration pass emits
//! one structured event so that unattended installs leave a machine-readable
//! trail next to the human-readable report.

use std::io;

use serde::{Deserialize, Serialize};

use crate::migration::StepReport;
use crate::setup::SetupReport;

/// A structured telemetry event emitted by the administration tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A migration step finished.
    MigrationStepCompleted {
        /// Step label, e.g. `0.2a -> 0.3a`.
        step: String,
        /// Databases the step visited.
        databases: usize,
        /// Design documents written.
        applied: usize,
        /// Design documents already up to date.
        already_current: usize,
        /// Design documents that failed.
        failed: usize,
        /// Ordinary documents rewritten by the document pass.
        documents_modified: usize,
        /// Ordinary documents the document pass could not handle.
        documents_failed: usize,
    },
    /// A setup run finished.
    SetupCompleted {
        /// Operations attempted.
        operations: usize,
        /// Operations that failed.
        failures: usize,
    },
    /// Service configuration files were generated.
    ServicesConfigured {
        /// Names of the configured services.
        services: Vec<String>,
    },
}

impl TelemetryEvent {
    /// Summarises a migration step report.
    #[must_use]
    pub fn step_completed(report: &StepReport) -> Self {
        let counts = report.counts();
        Self::MigrationStepCompleted {
            step: report.step.clone(),
            databases: report.databases.len(),
            applied: counts.applied,
            already_current: counts.already_current,
            failed: counts.failed,
            documents_modified: report.documents_modified(),
            documents_failed: report.documents_failed(),
        }
    }

    /// Summarises a setup report.
    #[must_use]
    pub fn setup_completed(report: &SetupReport) -> Self {
        Self::SetupCompleted {
            operations: report.items.len(),
            failures: report.failures(),
        }
    }
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Records telemetry events to stderr as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Test helpers for capturing telemetry.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::Mutex;

    use super::{TelemetryEvent, TelemetrySink};

    /// Keeps every recorded event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingTelemetrySink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingTelemetrySink {
        /// Removes and returns the recorded events.
        #[must_use]
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .map(|mut events| events.drain(..).collect())
                .unwrap_or_default()
        }
    }

    impl TelemetrySink for RecordingTelemetrySink {
        fn record(&self, event: TelemetryEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TelemetryEvent;
    use crate::migration::{DatabaseReport, DesignReport, StepReport, TargetOutcome};

    #[test]
    fn step_event_summarises_the_report() {
        let report = StepReport {
            step: "0.4a -> 0.5".to_owned(),
            databases: vec![DatabaseReport {
                database: "wiki_a".to_owned(),
                designs: vec![DesignReport {
                    design: "wikit".to_owned(),
                    outcome: TargetOutcome::Applied,
                }],
                documents: None,
                listing_failure: None,
            }],
        };

        assert_eq!(
            TelemetryEvent::step_completed(&report),
            TelemetryEvent::MigrationStepCompleted {
                step: "0.4a -> 0.5".to_owned(),
                databases: 1,
                applied: 1,
                already_current: 0,
                failed: 0,
                documents_modified: 0,
                documents_failed: 0,
            }
        );
    }

    #[test]
    fn events_serialise_with_a_type_tag() {
        let event = TelemetryEvent::SetupCompleted {
            operations: 7,
            failures: 0,
        };

        assert_eq!(
            serde_json::to_value(&event).expect("event should serialise"),
            json!({"type": "setup_completed", "operations": 7, "failures": 0})
        );
    }
}
