//! External collaborators: the durable key-value store backing the text
//! language's remember/recall, and the table source backing the query
//! language's load. The engine calls these synchronously and surfaces any
//! failure to the caller unchanged; nothing is retried.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::eval::expression::Value;

pub type Row = serde_json::Map<String, JsonValue>;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("table file {path} is not an array of objects")]
    NotATable { path: PathBuf },
}

pub trait MemoryStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), MemoryError>;
    fn delete(&mut self, key: &str) -> Result<(), MemoryError>;
    fn clear(&mut self) -> Result<(), MemoryError>;
    fn keys(&self) -> Vec<String>;
}

/// Non-persistent store, the default when no memory file is configured.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    store: HashMap<String, Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), MemoryError> {
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), MemoryError> {
        self.store.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MemoryError> {
        self.store.clear();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.store.keys().cloned().collect()
    }
}

/// Store persisted as one JSON object. With `auto_save` every mutation
/// writes the file back immediately, so state survives across runs.
#[derive(Debug)]
pub struct JsonFileMemory {
    path: PathBuf,
    auto_save: bool,
    store: HashMap<String, JsonValue>,
}

impl JsonFileMemory {
    pub fn open(path: impl Into<PathBuf>, auto_save: bool) -> Result<Self, MemoryError> {
        let path = path.into();
        let store = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| MemoryError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| MemoryError::Malformed {
                path: path.clone(),
                source,
            })?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            auto_save,
            store,
        })
    }

    pub fn save(&self) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| MemoryError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(&self.store).map_err(|source| {
            MemoryError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, text).map_err(|source| MemoryError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn save_if_auto(&self) -> Result<(), MemoryError> {
        if self.auto_save {
            self.save()
        } else {
            Ok(())
        }
    }
}

impl MemoryStore for JsonFileMemory {
    fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key).map(value_from_json)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), MemoryError> {
        self.store.insert(key.to_string(), value_to_json(&value));
        self.save_if_auto()
    }

    fn delete(&mut self, key: &str) -> Result<(), MemoryError> {
        if self.store.remove(key).is_some() {
            self.save_if_auto()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MemoryError> {
        self.store.clear();
        self.save_if_auto()
    }

    fn keys(&self) -> Vec<String> {
        self.store.keys().cloned().collect()
    }
}

pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Undefined => JsonValue::Null,
    }
}

pub fn value_from_json(value: &JsonValue) -> Value {
    match value {
        JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        JsonValue::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null | JsonValue::Object(_) => Value::Undefined,
    }
}

/// Supplies the query language's tables; the engine itself never touches
/// the filesystem.
pub trait TableSource {
    fn load(&self, path: &str) -> Result<Vec<Row>, MemoryError>;
}

#[derive(Debug, Default)]
pub struct JsonFileTables {
    root: Option<PathBuf>,
}

impl JsonFileTables {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => Path::new(path).to_path_buf(),
        }
    }
}

impl TableSource for JsonFileTables {
    fn load(&self, path: &str) -> Result<Vec<Row>, MemoryError> {
        let path = self.resolve(path);
        let text = fs::read_to_string(&path).map_err(|source| MemoryError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed: JsonValue = serde_json::from_str(&text).map_err(|source| {
            MemoryError::Malformed {
                path: path.clone(),
                source,
            }
        })?;
        match parsed {
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::Object(row) => Ok(row),
                    _ => Err(MemoryError::NotATable { path: path.clone() }),
                })
                .collect(),
            _ => Err(MemoryError::NotATable { path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let mut store = InMemoryStore::new();
        store.set("mood", Value::Text("happy".into())).unwrap();
        assert_eq!(store.get("mood"), Some(Value::Text("happy".into())));
        assert_eq!(store.get("absent"), None);
        store.clear().unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_json_file_memory_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let mut store = JsonFileMemory::open(&path, true).unwrap();
        store.set("favorite_color", Value::Text("green".into())).unwrap();
        store.set("count", Value::Number(3.0)).unwrap();
        drop(store);

        let reopened = JsonFileMemory::open(&path, true).unwrap();
        assert_eq!(
            reopened.get("favorite_color"),
            Some(Value::Text("green".into()))
        );
        assert_eq!(reopened.get("count"), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_json_file_memory_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileMemory::open(&path, true),
            Err(MemoryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_table_source_requires_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, r#"[{"name": "ada", "age": 36}]"#).unwrap();

        let tables = JsonFileTables::new(Some(dir.path().to_path_buf()));
        let rows = tables.load("users.json").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "ada");

        fs::write(&path, r#"{"name": "ada"}"#).unwrap();
        assert!(matches!(
            tables.load("users.json"),
            Err(MemoryError::NotATable { .. })
        ));
    }
}
