use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lang::Engine;
use crate::memory::{InMemoryStore, JsonFileMemory, JsonFileTables, MemoryStore};
use crate::task::Matcher;

/// Engine configuration, loadable from a JSON file. Every field has a
/// default so a missing or partial file still yields a working engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub tables: TableConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Durable store location; in-memory only when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub auto_save: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            auto_save: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// Directory that `load table ... from` paths resolve against. Relative
    /// to the working directory when unset.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub fuzzy: bool,

    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            fuzzy: false,
            threshold: default_threshold(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    0.9
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| Error::config(format!("cannot open {}: {}", path.display(), err)))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|err| Error::config(format!("cannot parse {}: {}", path.display(), err)))
    }

    /// Builds an engine with the configured collaborators.
    pub fn engine(&self) -> Result<Engine> {
        let memory: Box<dyn MemoryStore> = match &self.memory.path {
            Some(path) => Box::new(JsonFileMemory::open(path, self.memory.auto_save)?),
            None => Box::new(InMemoryStore::new()),
        };
        let tables = Box::new(JsonFileTables::new(self.tables.root.clone()));
        Ok(Engine::with_collaborators(memory, tables))
    }

    pub fn matcher(&self) -> Matcher {
        if self.evaluation.fuzzy {
            Matcher::Fuzzy {
                threshold: self.evaluation.threshold,
            }
        } else {
            Matcher::Exact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.memory.path.is_none());
        assert!(config.memory.auto_save);
        assert_eq!(config.matcher(), Matcher::Exact);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"evaluation\": {{\"fuzzy\": true}}}}").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.matcher(), Matcher::Fuzzy { threshold: 0.9 });
        assert!(config.memory.auto_save);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EngineConfig::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }
}
