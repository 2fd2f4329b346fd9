//! SQLite-backed multi-tenant storage layer.
//!
//! Each tenant maps to its own database file (a "bind"); [`TenantBinds`]
//! holds one connection pool per bind with a guaranteed `default` bind.
//! Schema bootstrap is idempotent and runs against every newly opened bind.

pub mod binds;
pub mod broker;
pub mod models;
pub mod repo;
pub mod schema;

pub use binds::TenantBinds;
pub use broker::{JsonStorageBroker, StorageBroker};
