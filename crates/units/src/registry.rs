//! Unit trait and the static catalog.

use axum::Router;
use hivebase_core::HivebaseResult;
use hivebase_platform::auth::SessionStore;
use hivebase_store::TenantBinds;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Extension or plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Extension,
    Plugin,
}

/// Shared services handed to units when they build routes or activate.
#[derive(Clone)]
pub struct UnitContext {
    pub binds: Arc<TenantBinds>,
    pub sessions: Arc<SessionStore>,
    pub registration_enabled: bool,
    pub password_min_length: usize,
}

/// A compiled-in optional feature.
pub trait Unit: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> UnitKind;
    fn description(&self) -> &'static str {
        ""
    }

    /// Called when the unit becomes active. Errors are logged by the sync
    /// pass and the unit is skipped; they never abort the sync.
    fn on_activate(&self, _ctx: &UnitContext) -> HivebaseResult<()> {
        Ok(())
    }

    fn on_deactivate(&self, _ctx: &UnitContext) -> HivebaseResult<()> {
        Ok(())
    }

    /// Routes contributed by the unit (extensions only). The returned
    /// router carries its own state; the server nests it under
    /// `/<unit name>`.
    fn routes(&self, _ctx: &UnitContext) -> Option<Router> {
        None
    }
}

/// Static catalog of compiled-in units plus the active set.
pub struct UnitRegistry {
    units: BTreeMap<&'static str, Arc<dyn Unit>>,
    active: RwLock<HashSet<String>>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            active: RwLock::new(HashSet::new()),
        }
    }

    /// Catalog with every built-in unit registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::builtin::auth::AuthExtension));
        registry.register(Arc::new(crate::builtin::health::HealthPlugin));
        registry
    }

    pub fn register(&mut self, unit: Arc<dyn Unit>) {
        self.units.insert(unit.name(), unit);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Unit>> {
        self.units.get(name).cloned()
    }

    /// Names in the catalog, optionally filtered by kind.
    pub fn names(&self, kind: Option<UnitKind>) -> Vec<String> {
        self.units
            .values()
            .filter(|u| kind.map_or(true, |k| u.kind() == k))
            .map(|u| u.name().to_string())
            .collect()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.read().contains(name)
    }

    pub fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.read().iter().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn mark_active(&self, name: &str) {
        self.active.write().insert(name.to_string());
    }

    pub(crate) fn mark_inactive(&self, name: &str) {
        self.active.write().remove(name);
    }
}
