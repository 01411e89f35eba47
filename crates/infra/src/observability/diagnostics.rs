use timeclock_core::{DiagnosticEvent, DiagnosticsSink};
use tracing::warn;

/// Writes diagnostic events to the log at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        match &event {
            DiagnosticEvent::CorruptQueue { key, error, length } => {
                warn!(key = %key, error = %error, length, "Discarding unreadable offline queue");
            }
            DiagnosticEvent::CorruptTimestamp { key, value } => {
                warn!(key = %key, value = %value, "Ignoring unreadable sync timestamp");
            }
        }
    }
}
