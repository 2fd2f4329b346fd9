//! Activation diffing.

use crate::registry::{UnitContext, UnitKind, UnitRegistry};
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SyncReport {
    pub activated: Vec<String>,
    pub deactivated: Vec<String>,
    pub failed: Vec<String>,
}

/// Bring the active set of `kind` in line with the enabled set.
///
/// Units enabled and discoverable but not active are activated; active
/// units no longer enabled are deactivated. A failing activation hook is
/// logged and the unit skipped; the sync itself never fails. Last write
/// wins across repeated syncs.
pub fn sync_units(
    registry: &UnitRegistry,
    ctx: &UnitContext,
    kind: UnitKind,
    enabled: &[String],
    discovered: &[String],
) -> SyncReport {
    let mut report = SyncReport::default();

    for name in discovered {
        let Some(unit) = registry.get(name) else {
            continue;
        };
        if unit.kind() != kind {
            continue;
        }

        let should_be_active = enabled.iter().any(|e| e == name);
        let is_active = registry.is_active(name);

        if should_be_active && !is_active {
            match unit.on_activate(ctx) {
                Ok(()) => {
                    registry.mark_active(name);
                    info!(unit = %name, kind = ?kind, "Unit activated");
                    report.activated.push(name.clone());
                }
                Err(e) => {
                    error!(unit = %name, error = %e, "Failed to activate unit");
                    metrics::counter!("units.activation_failures").increment(1);
                    report.failed.push(name.clone());
                }
            }
        }
    }

    // Deactivate active units of this kind that are no longer enabled.
    for name in registry.active_names() {
        let Some(unit) = registry.get(&name) else {
            continue;
        };
        if unit.kind() != kind {
            continue;
        }
        if !enabled.iter().any(|e| *e == name) {
            if let Err(e) = unit.on_deactivate(ctx) {
                error!(unit = %name, error = %e, "Failed to deactivate unit");
            }
            registry.mark_inactive(&name);
            info!(unit = %name, kind = ?kind, "Unit deactivated");
            report.deactivated.push(name);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Unit;
    use hivebase_core::{HivebaseError, HivebaseResult};
    use hivebase_platform::auth::SessionStore;
    use hivebase_store::TenantBinds;
    use std::sync::Arc;

    struct FailingPlugin;

    impl Unit for FailingPlugin {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn kind(&self) -> UnitKind {
            UnitKind::Plugin
        }
        fn on_activate(&self, _ctx: &UnitContext) -> HivebaseResult<()> {
            Err(HivebaseError::Validation("boom".to_string()))
        }
    }

    async fn test_ctx() -> UnitContext {
        UnitContext {
            binds: Arc::new(TenantBinds::open("sqlite::memory:", 1, 1000).await.unwrap()),
            sessions: Arc::new(SessionStore::new(60)),
            registration_enabled: true,
            password_min_length: 12,
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_activate_then_deactivate() {
        let registry = UnitRegistry::with_builtins();
        let ctx = test_ctx().await;
        let discovered = names(&["health"]);

        let report = sync_units(&registry, &ctx, UnitKind::Plugin, &names(&["health"]), &discovered);
        assert_eq!(report.activated, vec!["health"]);
        assert!(registry.is_active("health"));

        // Second sync with the same enabled set is a no-op.
        let report = sync_units(&registry, &ctx, UnitKind::Plugin, &names(&["health"]), &discovered);
        assert!(report.activated.is_empty());
        assert!(report.deactivated.is_empty());

        // Removing it from the enabled set deactivates it.
        let report = sync_units(&registry, &ctx, UnitKind::Plugin, &[], &discovered);
        assert_eq!(report.deactivated, vec!["health"]);
        assert!(!registry.is_active("health"));
    }

    #[tokio::test]
    async fn test_enabled_but_undiscovered_is_ignored() {
        let registry = UnitRegistry::with_builtins();
        let ctx = test_ctx().await;

        let report = sync_units(&registry, &ctx, UnitKind::Plugin, &names(&["health"]), &[]);
        assert!(report.activated.is_empty());
        assert!(!registry.is_active("health"));
    }

    #[tokio::test]
    async fn test_failed_activation_is_skipped_not_fatal() {
        let mut registry = UnitRegistry::with_builtins();
        registry.register(Arc::new(FailingPlugin));
        let ctx = test_ctx().await;
        let discovered = names(&["failing", "health"]);

        let report = sync_units(
            &registry,
            &ctx,
            UnitKind::Plugin,
            &names(&["failing", "health"]),
            &discovered,
        );
        assert_eq!(report.failed, vec!["failing"]);
        assert_eq!(report.activated, vec!["health"]);
        assert!(!registry.is_active("failing"));
    }

    #[tokio::test]
    async fn test_kind_isolation() {
        let registry = UnitRegistry::with_builtins();
        let ctx = test_ctx().await;

        // Syncing plugins never touches the auth extension.
        let report = sync_units(
            &registry,
            &ctx,
            UnitKind::Plugin,
            &names(&["auth", "health"]),
            &names(&["auth", "health"]),
        );
        assert_eq!(report.activated, vec!["health"]);
        assert!(!registry.is_active("auth"));
    }
}
