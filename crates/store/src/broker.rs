//! File-backed storage brokers.
//!
//! A broker abstracts "a document at a path" with CRUD semantics; the JSON
//! broker is what backs the enabled-unit files.

use hivebase_core::{HivebaseError, HivebaseResult};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub trait StorageBroker: Send + Sync {
    fn create(&self, path: &Path, data: &Value) -> HivebaseResult<()>;
    fn read(&self, path: &Path) -> HivebaseResult<Value>;
    /// Merge `data` into the existing document (object keys overwrite).
    fn update(&self, path: &Path, data: &Value) -> HivebaseResult<()>;
    fn delete(&self, path: &Path) -> HivebaseResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonStorageBroker;

impl StorageBroker for JsonStorageBroker {
    fn create(&self, path: &Path, data: &Value) -> HivebaseResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(data)?;
        fs::write(path, text)?;
        Ok(())
    }

    fn read(&self, path: &Path) -> HivebaseResult<Value> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn update(&self, path: &Path, data: &Value) -> HivebaseResult<()> {
        let mut current = self.read(path)?;
        match (&mut current, data) {
            (Value::Object(existing), Value::Object(incoming)) => {
                for (key, value) in incoming {
                    existing.insert(key.clone(), value.clone());
                }
            }
            (current, data) => *current = data.clone(),
        }
        self.create(path, &current)
    }

    fn delete(&self, path: &Path) -> HivebaseResult<()> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(HivebaseError::Validation(format!(
                "refusing to delete non-json file {}",
                path.display()
            )));
        }
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Read a JSON array of strings, the shape of the enabled-unit files.
pub fn read_string_list(broker: &dyn StorageBroker, path: &Path) -> HivebaseResult<Vec<String>> {
    let value = broker.read(path)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(HivebaseError::Validation(format!(
                    "expected string entry, got {other}"
                ))),
            })
            .collect(),
        other => Err(HivebaseError::Validation(format!(
            "expected a JSON array in {}, got {other}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hivebase-broker-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_create_read_update_delete() {
        let broker = JsonStorageBroker;
        let path = temp_path("crud.json");

        broker.create(&path, &json!({"a": 1})).unwrap();
        assert_eq!(broker.read(&path).unwrap(), json!({"a": 1}));

        broker.update(&path, &json!({"b": 2})).unwrap();
        assert_eq!(broker.read(&path).unwrap(), json!({"a": 1, "b": 2}));

        broker.delete(&path).unwrap();
        assert!(broker.read(&path).is_err());
    }

    #[test]
    fn test_delete_refuses_non_json() {
        let broker = JsonStorageBroker;
        assert!(broker.delete(Path::new("/tmp/notes.txt")).is_err());
    }

    #[test]
    fn test_read_string_list() {
        let broker = JsonStorageBroker;
        let path = temp_path("list.json");
        broker.create(&path, &json!(["auth", "health"])).unwrap();
        assert_eq!(
            read_string_list(&broker, &path).unwrap(),
            vec!["auth", "health"]
        );

        broker.create(&path, &json!({"auth": true})).unwrap();
        assert!(read_string_list(&broker, &path).is_err());
        broker.delete(&path).unwrap();
    }
}
