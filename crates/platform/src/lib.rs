//! Platform services: tenancy resolution, authentication and sessions,
//! role/permission checks, and rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
pub mod tenancy;

pub use auth::{hash_password, verify_password, Session, SessionStore};
pub use rate_limit::RateLimiter;
pub use tenancy::{TenantResolver, TenantSelection, TenantSource};
