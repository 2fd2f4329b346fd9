#![warn(clippy::unwrap_used)]

pub mod admin_rest;
pub mod error;
pub mod middleware;
pub mod render;
pub mod rest;
pub mod server;
pub mod swagger;
pub mod unit_rest;

pub use error::ApiError;
pub use server::ApiServer;
pub use swagger::ApiDoc;
