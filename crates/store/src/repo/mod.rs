//! CRUD repositories over the bootstrap schema.
//!
//! Functions take the pool of the tenant they should operate on; callers
//! pick the pool through [`crate::TenantBinds`].

pub mod audit;
pub mod settings;
pub mod tenants;
pub mod units;
pub mod users;
