//! Admin console operations backing the `/admin` REST surface.
//!
//! Every mutating operation records an audit entry on the default bind.

pub mod system_settings;
pub mod tenant_ops;
pub mod unit_ops;
pub mod user_ops;

pub use system_settings::SystemSettings;
pub use tenant_ops::TenantOps;
pub use unit_ops::UnitOps;
pub use user_ops::UserOps;
