//! Clock-in/clock-out entry point used by the UI layer

pub mod service;

pub use service::{AttendanceService, ClockOutcome};
