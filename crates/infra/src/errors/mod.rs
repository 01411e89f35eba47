//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{submission_error_from_http, InfraError};
