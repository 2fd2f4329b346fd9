//! Optional feature units.
//!
//! A unit is an optional piece of the platform compiled into the binary
//! and activated from configuration. Extensions are activated at startup
//! and may mount routes; plugins can be re-synced at runtime. Which units
//! run is decided by diffing the discoverable catalog against an
//! enabled-set read from a JSON file or the database.

pub mod builtin;
pub mod discovery;
pub mod enabled;
pub mod registry;
pub mod sync;

pub use registry::{Unit, UnitContext, UnitKind, UnitRegistry};
pub use sync::{sync_units, SyncReport};
