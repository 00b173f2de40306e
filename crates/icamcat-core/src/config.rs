//! Catalog configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::naming::MAX_DIRECTORY_ORDINAL;
use crate::CatalogError;

/// Settings for the catalog, its builder and the image store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Top-level directory holding the `NNNICAMF` folders
    pub image_root: PathBuf,
    /// Byte budget of the node and name arena
    pub arena_bytes: usize,
    /// Upper bound on names returned by one name list
    pub max_catalog_names: usize,
    /// Ordinal of the first directory created on an empty card
    pub directory_base: u32,
    /// Files written to a directory before a new one is started
    pub files_per_directory: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("/sdcard/images"),
            arena_bytes: 32 * 1024,
            max_catalog_names: 100,
            directory_base: 100,
            files_per_directory: 100,
        }
    }
}

impl CatalogConfig {
    /// Load a JSON config file; absent fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Ok(default) if default.exists() => Self::load(default),
            _ => Ok(Self::default()),
        }
    }

    /// Get the default config path (~/.icamcat/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".icamcat").join("config.json"))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.arena_bytes == 0 {
            return Err(CatalogError::Config("arena_bytes must be nonzero".into()));
        }
        if self.files_per_directory == 0 {
            return Err(CatalogError::Config(
                "files_per_directory must be nonzero".into(),
            ));
        }
        if self.directory_base > MAX_DIRECTORY_ORDINAL {
            return Err(CatalogError::Config(format!(
                "directory_base {} exceeds {}",
                self.directory_base, MAX_DIRECTORY_ORDINAL
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "image_root": "/mnt/card", "arena_bytes": 1024 }"#).unwrap();

        let config = CatalogConfig::load(&path).unwrap();
        assert_eq!(config.image_root, PathBuf::from("/mnt/card"));
        assert_eq!(config.arena_bytes, 1024);
        assert_eq!(config.max_catalog_names, 100);
        assert_eq!(config.directory_base, 100);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "directory_base": 1000 }"#).unwrap();
        assert!(CatalogConfig::load(&path).is_err());

        let config = CatalogConfig {
            arena_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(CatalogConfig::load(temp_dir.path().join("absent.json")).is_err());
        assert!(CatalogConfig::load_or_default(Some(&temp_dir.path().join("absent.json"))).is_err());
    }
}
