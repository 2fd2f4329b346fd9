//! Unit manifest discovery.
//!
//! An optional manifest directory narrows the discoverable set: each
//! subdirectory with a `unit.toml` declares one unit. Without a manifest
//! directory every catalog unit is discoverable.

use crate::registry::{UnitKind, UnitRegistry};
use hivebase_core::{HivebaseError, HivebaseResult};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct UnitManifest {
    pub name: String,
    pub kind: UnitKind,
    #[serde(default)]
    pub description: String,
}

/// Subdirectory names of `dir` (the discoverable unit folders).
pub fn list_unit_dirs(dir: &Path) -> HivebaseResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Parse every `<dir>/<unit>/unit.toml`. Folders without a manifest or
/// with a malformed one are skipped with a warning.
pub fn scan_manifests(dir: &Path) -> HivebaseResult<Vec<UnitManifest>> {
    let mut manifests = Vec::new();
    for name in list_unit_dirs(dir)? {
        let manifest_path = dir.join(&name).join("unit.toml");
        if !manifest_path.exists() {
            continue;
        }
        let text = std::fs::read_to_string(&manifest_path)?;
        match toml::from_str::<UnitManifest>(&text) {
            Ok(manifest) => manifests.push(manifest),
            Err(e) => {
                warn!(unit = %name, error = %e, "Skipping malformed unit manifest");
            }
        }
    }
    Ok(manifests)
}

/// The discoverable names of `kind`: the catalog, narrowed by the manifest
/// directory when one is configured.
pub fn discover(
    registry: &UnitRegistry,
    kind: UnitKind,
    manifest_dir: &str,
) -> HivebaseResult<Vec<String>> {
    let catalog = registry.names(Some(kind));
    if manifest_dir.is_empty() {
        return Ok(catalog);
    }

    let dir = Path::new(manifest_dir);
    if !dir.is_dir() {
        return Err(HivebaseError::Config(format!(
            "unit manifest directory {manifest_dir} does not exist"
        )));
    }

    let manifested: Vec<String> = scan_manifests(dir)?
        .into_iter()
        .filter(|m| m.kind == kind)
        .map(|m| m.name)
        .collect();
    Ok(catalog
        .into_iter()
        .filter(|name| manifested.iter().any(|m| m == name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hivebase-units-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scan_skips_missing_and_malformed_manifests() {
        let dir = temp_dir("scan");
        fs::create_dir_all(dir.join("auth")).unwrap();
        fs::write(
            dir.join("auth/unit.toml"),
            "name = \"auth\"\nkind = \"extension\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("no-manifest")).unwrap();
        fs::create_dir_all(dir.join("broken")).unwrap();
        fs::write(dir.join("broken/unit.toml"), "not toml = = =").unwrap();

        let manifests = scan_manifests(&dir).unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].name, "auth");
        assert_eq!(manifests[0].kind, UnitKind::Extension);
    }

    #[test]
    fn test_discover_without_manifest_dir_returns_catalog() {
        let registry = UnitRegistry::with_builtins();
        let names = discover(&registry, UnitKind::Plugin, "").unwrap();
        assert_eq!(names, vec!["health".to_string()]);
    }

    #[test]
    fn test_discover_narrows_to_manifested_units() {
        let registry = UnitRegistry::with_builtins();
        let dir = temp_dir("narrow");
        // Manifest dir exists but lists nothing: nothing discoverable.
        let names = discover(&registry, UnitKind::Extension, dir.to_str().unwrap()).unwrap();
        assert!(names.is_empty());

        fs::create_dir_all(dir.join("auth")).unwrap();
        fs::write(
            dir.join("auth/unit.toml"),
            "name = \"auth\"\nkind = \"extension\"\n",
        )
        .unwrap();
        let names = discover(&registry, UnitKind::Extension, dir.to_str().unwrap()).unwrap();
        assert_eq!(names, vec!["auth".to_string()]);
    }

    #[test]
    fn test_discover_missing_dir_errors() {
        let registry = UnitRegistry::with_builtins();
        assert!(discover(&registry, UnitKind::Plugin, "/no/such/dir").is_err());
    }
}
