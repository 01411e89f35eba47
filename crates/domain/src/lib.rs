//! # Timeclock Domain
//!
//! Business domain types for the offline clock-action queue.
//!
//! This crate contains:
//! - Clock action records and sync summaries
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Fixed sync policy constants
//!
//! ## Architecture
//! - No dependencies on other Timeclock crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
