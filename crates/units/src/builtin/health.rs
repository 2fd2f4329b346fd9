//! The `health` plugin.
//!
//! Verifies on activation that the default bind is registered and reports
//! the bind count; a misassembled bind registry should surface at sync
//! time, not on the first real request.

use crate::registry::{Unit, UnitContext, UnitKind};
use hivebase_core::{HivebaseError, HivebaseResult};
use tracing::info;

pub struct HealthPlugin;

impl Unit for HealthPlugin {
    fn name(&self) -> &'static str {
        "health"
    }

    fn kind(&self) -> UnitKind {
        UnitKind::Plugin
    }

    fn description(&self) -> &'static str {
        "Bind registry probe run at activation"
    }

    fn on_activate(&self, ctx: &UnitContext) -> HivebaseResult<()> {
        if !ctx.binds.contains("default") {
            return Err(HivebaseError::Config(
                "default bind missing from registry".to_string(),
            ));
        }
        info!(binds = ctx.binds.bind_keys().len(), "Health plugin active");
        Ok(())
    }

    fn on_deactivate(&self, _ctx: &UnitContext) -> HivebaseResult<()> {
        info!("Health plugin deactivated");
        Ok(())
    }
}
