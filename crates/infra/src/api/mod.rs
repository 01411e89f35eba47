//! Remote attendance API adapter

pub mod auth;
pub mod client;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use client::{AttendanceApiClient, AttendanceApiConfig};
