//! Shared types for the Hivebase platform: configuration, error types,
//! and small value-handling utilities used across crates.

pub mod config;
pub mod error;
pub mod value;

pub use config::AppConfig;
pub use error::{HivebaseError, HivebaseResult};
