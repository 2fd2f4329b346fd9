//! Units shipped with the platform.

pub mod auth;
pub mod health;
