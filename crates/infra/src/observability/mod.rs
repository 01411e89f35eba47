//! Logging setup and the diagnostics sink.
//!
//! Everything the engine recovers from silently (a corrupt queue blob, an
//! unparseable sync timestamp) is reported through [`TracingDiagnostics`] so
//! it lands in the same structured log stream as the rest of the client.

pub mod diagnostics;
pub mod logging;

pub use diagnostics::TracingDiagnostics;
pub use logging::init_tracing;
