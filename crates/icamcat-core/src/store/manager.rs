//! High-level image store

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogIndex, DirectoryEntry, FileEntry, SharedCatalog};
use crate::config::CatalogConfig;
use crate::naming::{
    directory_name, file_name, parse_directory_ordinal, parse_file_ordinal, ImageKind,
    MAX_DIRECTORY_ORDINAL, MAX_FILE_ORDINAL,
};
use crate::scan::{ScanReport, Storage};
use crate::CatalogError;

/// Where the next image should be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub directory: String,
    pub file: String,
    pub kind: ImageKind,
    pub path: PathBuf,
}

/// Image store for one removable card
pub struct ImageStore<S> {
    config: CatalogConfig,
    storage: S,
    catalog: SharedCatalog,
}

impl<S: Storage> ImageStore<S> {
    pub fn new(config: CatalogConfig, storage: S) -> Self {
        let catalog = SharedCatalog::from_config(&config);
        Self {
            config,
            storage,
            catalog,
        }
    }

    /// Handle for browse accessors; clones share the same catalog
    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Card inserted: rebuild the catalog from the image root
    pub fn mount(&self) -> Result<ScanReport, CatalogError> {
        let result = self.catalog.rebuild(&self.storage, &self.config.image_root);
        if let Err(e) = &result {
            tracing::warn!("Mount failed: {}", e);
        }
        result
    }

    /// Card removed: drop the catalog
    pub fn unmount(&self) {
        self.catalog.clear();
    }

    /// Pick the directory and file name for the next image
    ///
    /// Starts a new directory on the card and in the catalog when there is
    /// none yet or the last one is full. The file itself is not created; call
    /// [`commit_image`](Self::commit_image) once it has been written.
    pub fn prepare_image(&self, kind: ImageKind) -> Result<ImageSlot, CatalogError> {
        self.catalog.with(|index| -> Result<ImageSlot, CatalogError> {
            let last = index
                .num_directories()
                .checked_sub(1)
                .and_then(|n| index.directory(n));

            let reuse = last.and_then(|dir| {
                let ordinal = last_file_ordinal(index, &dir);
                let full = dir.file_count >= self.config.files_per_directory
                    || ordinal.is_some_and(|o| o >= MAX_FILE_ORDINAL);
                (!full).then(|| (dir.name, ordinal.map_or(1, |o| o + 1)))
            });

            let (directory, ordinal) = match reuse {
                Some(found) => found,
                None => (self.create_directory(index)?, 1),
            };

            let file = file_name(ordinal, kind);
            let path = self.config.image_root.join(&directory).join(&file);
            tracing::debug!("Next image slot: {}", path.display());
            Ok(ImageSlot {
                directory,
                file,
                kind,
                path,
            })
        })
    }

    /// Start the next image directory, skipping ordinals taken by non-directories
    fn create_directory(&self, index: &mut CatalogIndex) -> Result<String, CatalogError> {
        let first = index
            .directories()
            .iter()
            .filter_map(|d| parse_directory_ordinal(&d.name))
            .max()
            .map_or(self.config.directory_base, |o| o + 1);

        for ordinal in first..=MAX_DIRECTORY_ORDINAL {
            let name = directory_name(ordinal);
            let path = self.config.image_root.join(&name);
            let created = match self.storage.create_dir(&path) {
                Ok(()) => true,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if !self.is_directory(&name)? {
                        tracing::warn!("{} exists and is not a directory", path.display());
                        continue;
                    }
                    false
                }
                Err(source) => return Err(CatalogError::Storage { path, source }),
            };

            if index.insert_directory(&name).is_none() {
                if created {
                    if let Err(e) = self.storage.remove_dir(&path) {
                        tracing::warn!("Leaving {} on card: {}", path.display(), e);
                    }
                }
                return Err(CatalogError::CatalogFull);
            }

            tracing::info!("Created image directory {}", name);
            return Ok(name);
        }
        Err(CatalogError::DirectoriesExhausted)
    }

    fn is_directory(&self, name: &str) -> Result<bool, CatalogError> {
        let root = &self.config.image_root;
        let entries = self
            .storage
            .list_dir(root)
            .map_err(|source| CatalogError::Storage {
                path: root.clone(),
                source,
            })?;
        Ok(entries.iter().any(|e| e.is_dir && e.name == name))
    }

    /// Record an image written to `slot`
    pub fn commit_image(&self, slot: &ImageSlot) -> Option<FileEntry> {
        self.catalog.with(|index| {
            let dir = index
                .directory_index(&slot.directory)
                .and_then(|n| index.directory(n))?;
            let id = index.insert_file(dir.id, &slot.file)?;
            index.file_entry(id)
        })
    }

    /// Card path of the image at absolute index `abs`
    pub fn image_path(&self, abs: usize) -> Option<PathBuf> {
        self.catalog.with(|index| {
            let (dir, file) = locate(index, abs)?;
            Some(self.config.image_root.join(&dir.name).join(&file.name))
        })
    }

    /// Delete the image at absolute index `abs` from the card and the catalog
    ///
    /// A directory left empty is removed as well. Returns `Ok(false)` when
    /// `abs` is past the last image.
    pub fn delete_image(&self, abs: usize) -> Result<bool, CatalogError> {
        self.catalog.with(|index| -> Result<bool, CatalogError> {
            let Some((dir_idx, file_idx)) = index.indexes_from_abs(abs) else {
                return Ok(false);
            };
            let Some((dir, file)) = locate(index, abs) else {
                return Ok(false);
            };

            let dir_path = self.config.image_root.join(&dir.name);
            let path = dir_path.join(&file.name);
            match self.storage.remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!("{} already gone from card", path.display());
                }
                Err(source) => return Err(CatalogError::Storage { path, source }),
            }
            index.delete_file(dir.id, file_idx);
            tracing::info!("Deleted image {}", path.display());

            let now_empty = index
                .directory_entry(dir.id)
                .is_some_and(|d| d.file_count == 0);
            if now_empty {
                match self.storage.remove_dir(&dir_path) {
                    Ok(()) => index.delete_directory(dir_idx),
                    Err(e) => {
                        tracing::warn!("Keeping directory {}: {}", dir_path.display(), e)
                    }
                }
            }
            Ok(true)
        })
    }
}

fn locate(index: &CatalogIndex, abs: usize) -> Option<(DirectoryEntry, FileEntry)> {
    let (dir_idx, file_idx) = index.indexes_from_abs(abs)?;
    let dir = index.directory(dir_idx)?;
    let file = index.file(dir.id, file_idx)?;
    Some((dir, file))
}

fn last_file_ordinal(index: &CatalogIndex, dir: &DirectoryEntry) -> Option<u32> {
    index
        .files(dir.id)
        .iter()
        .filter_map(|f| parse_file_ordinal(&f.name))
        .max()
}
