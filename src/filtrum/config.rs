use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "filtrum.json";

/// Runtime behavior switches, stored in `filtrum.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Fall back to the nearest ancestor's class filters when a class has none of its own.
    #[serde(default = "default_true")]
    pub inherit_filters: bool,

    /// Accept filters for class names that are not declared yet.
    #[serde(default = "default_true")]
    pub lazy_filters: bool,

    /// Reject dynamic calls whose argument count does not fit the method's arity.
    #[serde(default = "default_true")]
    pub enforce_arity: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inherit_filters: true,
            lazy_filters: true,
            enforce_arity: true,
        }
    }
}

impl RuntimeConfig {
    /// Where the config file lives inside `dir`.
    pub fn path<P: AsRef<Path>>(dir: P) -> PathBuf {
        dir.as_ref().join(CONFIG_FILENAME)
    }

    /// Reads `filtrum.json` from `dir`. A missing file (or directory) means defaults;
    /// fields absent from the file take their defaults too.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        match fs::read_to_string(Self::path(dir)) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the config into `dir`, creating it if needed, and returns the file path.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;
        let path = Self::path(dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FiltrumError;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert!(config.inherit_filters);
        assert!(config.lazy_filters);
        assert!(config.enforce_arity);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = RuntimeConfig::load(dir.path()).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("conf");

        let config = RuntimeConfig {
            inherit_filters: false,
            ..RuntimeConfig::default()
        };
        let written = config.save(&nested).unwrap();
        assert_eq!(written, RuntimeConfig::path(&nested));

        let loaded = RuntimeConfig::load(&nested).unwrap();
        assert!(!loaded.inherit_filters);
        assert!(loaded.enforce_arity);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "enforce_arity": false }"#,
        )
        .unwrap();

        let loaded = RuntimeConfig::load(dir.path()).unwrap();
        assert!(!loaded.enforce_arity);
        assert!(loaded.inherit_filters);
        assert!(loaded.lazy_filters);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "not json").unwrap();
        assert!(matches!(
            RuntimeConfig::load(dir.path()),
            Err(FiltrumError::Serialization(_))
        ));
    }
}
