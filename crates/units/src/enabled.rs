//! Enabled-set resolution.
//!
//! Which units should be active comes either from a JSON file (an array
//! of unit names) or from the extensions/plugins tables on the default
//! bind, selected by `units.source` in the configuration.

use crate::registry::UnitKind;
use hivebase_core::config::{UnitSource, UnitsConfig};
use hivebase_core::HivebaseResult;
use hivebase_store::repo::units::{self as units_repo, UnitTable};
use hivebase_store::{broker, JsonStorageBroker, StorageBroker, TenantBinds};
use std::path::Path;

impl From<UnitKind> for UnitTable {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Extension => UnitTable::Extensions,
            UnitKind::Plugin => UnitTable::Plugins,
        }
    }
}

/// Resolve the enabled names for `kind` according to the configured source.
pub async fn enabled_names(
    config: &UnitsConfig,
    kind: UnitKind,
    binds: &TenantBinds,
) -> HivebaseResult<Vec<String>> {
    match config.source {
        UnitSource::Json => {
            let file = match kind {
                UnitKind::Extension => &config.extensions_enabled_file,
                UnitKind::Plugin => &config.plugins_enabled_file,
            };
            // A missing file means nothing of this kind is enabled.
            if !Path::new(file).exists() {
                return Ok(Vec::new());
            }
            let broker = JsonStorageBroker;
            broker::read_string_list(&broker, Path::new(file))
        }
        UnitSource::Database => {
            units_repo::enabled_names(&binds.default_pool(), kind.into()).await
        }
    }
}

/// Write the JSON enabled file for `kind` (used by the admin toggles when
/// the source is `json`).
pub fn write_enabled_file(
    config: &UnitsConfig,
    kind: UnitKind,
    names: &[String],
) -> HivebaseResult<()> {
    let file = match kind {
        UnitKind::Extension => &config.extensions_enabled_file,
        UnitKind::Plugin => &config.plugins_enabled_file,
    };
    let broker = JsonStorageBroker;
    broker.create(Path::new(file), &serde_json::json!(names))
}
