//! Enable/disable toggles and resync for extensions and plugins.

use hivebase_core::config::{UnitSource, UnitsConfig};
use hivebase_core::{HivebaseError, HivebaseResult};
use hivebase_store::repo::{audit, units as units_repo};
use hivebase_store::TenantBinds;
use hivebase_units::{discovery, enabled, sync_units, SyncReport, UnitContext, UnitKind, UnitRegistry};
use serde::Serialize;
use std::sync::Arc;

/// One row in the admin unit listing.
#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub name: String,
    pub kind: UnitKind,
    pub description: String,
    pub enabled: bool,
    pub active: bool,
}

pub struct UnitOps {
    binds: Arc<TenantBinds>,
    registry: Arc<UnitRegistry>,
    ctx: UnitContext,
    units_config: UnitsConfig,
}

impl UnitOps {
    pub fn new(
        binds: Arc<TenantBinds>,
        registry: Arc<UnitRegistry>,
        ctx: UnitContext,
        units_config: UnitsConfig,
    ) -> Self {
        Self {
            binds,
            registry,
            ctx,
            units_config,
        }
    }

    /// The full catalog of `kind`, with enabled and active flags.
    pub async fn list(&self, kind: UnitKind) -> HivebaseResult<Vec<UnitStatus>> {
        let enabled = enabled::enabled_names(&self.units_config, kind, &self.binds).await?;
        let mut out = Vec::new();
        for name in self.registry.names(Some(kind)) {
            let Some(unit) = self.registry.get(&name) else {
                continue;
            };
            out.push(UnitStatus {
                enabled: enabled.iter().any(|e| *e == name),
                active: self.registry.is_active(&name),
                description: unit.description().to_string(),
                kind,
                name,
            });
        }
        Ok(out)
    }

    /// Flip the enabled flag for one unit and resync its kind. Unknown
    /// names are rejected before touching the enabled source.
    pub async fn set_enabled(
        &self,
        actor: &str,
        kind: UnitKind,
        name: &str,
        enabled_flag: bool,
    ) -> HivebaseResult<SyncReport> {
        let known = self
            .registry
            .get(name)
            .map(|u| u.kind() == kind)
            .unwrap_or(false);
        if !known {
            return Err(HivebaseError::UnitNotFound(name.to_string()));
        }

        match self.units_config.source {
            UnitSource::Database => {
                let pool = self.binds.default_pool();
                units_repo::ensure_row(&pool, kind.into(), name).await?;
                units_repo::set_enabled(&pool, kind.into(), name, enabled_flag).await?;
            }
            UnitSource::Json => {
                let mut names =
                    enabled::enabled_names(&self.units_config, kind, &self.binds).await?;
                names.retain(|n| n != name);
                if enabled_flag {
                    names.push(name.to_string());
                }
                enabled::write_enabled_file(&self.units_config, kind, &names)?;
            }
        }

        audit::record(
            &self.binds.default_pool(),
            actor,
            "default",
            if enabled_flag { "unit.enable" } else { "unit.disable" },
            name,
        )
        .await?;

        self.resync(kind).await
    }

    /// Re-run the activation diff for one kind.
    pub async fn resync(&self, kind: UnitKind) -> HivebaseResult<SyncReport> {
        let enabled = enabled::enabled_names(&self.units_config, kind, &self.binds).await?;
        let discovered =
            discovery::discover(&self.registry, kind, &self.units_config.manifest_dir)?;
        Ok(sync_units(&self.registry, &self.ctx, kind, &enabled, &discovered))
    }

    /// Resync both kinds, merging the reports.
    pub async fn sync_all(&self) -> HivebaseResult<SyncReport> {
        let mut report = self.resync(UnitKind::Extension).await?;
        let plugins = self.resync(UnitKind::Plugin).await?;
        report.activated.extend(plugins.activated);
        report.deactivated.extend(plugins.deactivated);
        report.failed.extend(plugins.failed);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivebase_platform::auth::SessionStore;
    use hivebase_store::schema;

    async fn ops() -> UnitOps {
        let binds = Arc::new(TenantBinds::open("sqlite::memory:", 1, 1000).await.unwrap());
        schema::create_tables(&binds.default_pool()).await.unwrap();
        let registry = Arc::new(UnitRegistry::with_builtins());
        let ctx = UnitContext {
            binds: binds.clone(),
            sessions: Arc::new(SessionStore::new(60)),
            registration_enabled: true,
            password_min_length: 12,
        };
        let mut config = UnitsConfig::default();
        config.source = UnitSource::Database;
        UnitOps::new(binds, registry, ctx, config)
    }

    #[tokio::test]
    async fn test_enable_activates_and_disable_deactivates() {
        let ops = ops().await;

        let report = ops
            .set_enabled("admin", UnitKind::Plugin, "health", true)
            .await
            .unwrap();
        assert_eq!(report.activated, vec!["health"]);

        let listing = ops.list(UnitKind::Plugin).await.unwrap();
        let health = listing.iter().find(|u| u.name == "health").unwrap();
        assert!(health.enabled && health.active);

        let report = ops
            .set_enabled("admin", UnitKind::Plugin, "health", false)
            .await
            .unwrap();
        assert_eq!(report.deactivated, vec!["health"]);
    }

    #[tokio::test]
    async fn test_unknown_unit_rejected() {
        let ops = ops().await;
        let err = ops
            .set_enabled("admin", UnitKind::Plugin, "nope", true)
            .await
            .unwrap_err();
        assert!(matches!(err, HivebaseError::UnitNotFound(_)));
    }
}
