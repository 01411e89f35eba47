//! # Timeclock Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite and in-memory key-value stores behind the queue
//! - The reqwest-based attendance API client
//! - Connectivity and device identity adapters
//! - Configuration loading and tracing setup
//! - [`AppContext`], which wires all of the above together
//!
//! ## Architecture
//! - Implements traits defined in `timeclock-core`
//! - Contains all "impure" code (I/O, network, environment)

pub mod api;
pub mod config;
pub mod context;
pub mod errors;
pub mod http;
pub mod observability;
pub mod platform;
pub mod storage;

// Re-export commonly used items
pub use api::*;
pub use context::AppContext;
pub use errors::*;
pub use http::*;
pub use observability::{init_tracing, TracingDiagnostics};
pub use platform::*;
pub use storage::*;
