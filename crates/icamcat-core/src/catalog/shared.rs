//! Mutex-guarded catalog handle
//!
//! Every accessor takes the single catalog lock with an unbounded wait, runs
//! to completion and releases it before returning. Accessors never call one
//! another while holding the lock; compound operations go through
//! [`SharedCatalog::with`] so they take it exactly once.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::index::{CatalogIndex, DirId, DirectoryEntry, FileEntry, FileId, NameList, NameListKind};
use crate::config::CatalogConfig;
use crate::scan::{build_catalog, ScanReport, Storage};
use crate::CatalogError;

/// Cloneable, thread-safe handle to one catalog
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<Mutex<CatalogIndex>>,
}

impl SharedCatalog {
    pub fn new(index: CatalogIndex) -> Self {
        Self {
            inner: Arc::new(Mutex::new(index)),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(CatalogIndex::from_config(config))
    }

    fn lock(&self) -> MutexGuard<'_, CatalogIndex> {
        // Poisoning is ignored: no accessor panics between link updates
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the index
    pub fn with<R>(&self, f: impl FnOnce(&mut CatalogIndex) -> R) -> R {
        let mut index = self.lock();
        f(&mut index)
    }

    /// Discard the catalog and rebuild it from `root` on `storage`
    pub fn rebuild<S: Storage + ?Sized>(
        &self,
        storage: &S,
        root: &Path,
    ) -> Result<ScanReport, CatalogError> {
        let mut index = self.lock();
        build_catalog(&mut index, storage, root)
    }

    /// Discard the catalog
    pub fn clear(&self) {
        self.lock().clear();
        tracing::info!("Catalog cleared");
    }

    pub fn add_directory(&self, name: &str) -> Option<DirId> {
        self.lock().insert_directory(name)
    }

    pub fn add_file(&self, dir: DirId, name: &str) -> Option<FileId> {
        self.lock().insert_file(dir, name)
    }

    pub fn delete_directory(&self, n: usize) {
        self.lock().delete_directory(n)
    }

    pub fn delete_file(&self, dir: DirId, n: usize) {
        self.lock().delete_file(dir, n)
    }

    pub fn name_list(&self, kind: NameListKind) -> NameList {
        self.lock().name_list(kind)
    }

    pub fn directory(&self, n: usize) -> Option<DirectoryEntry> {
        self.lock().directory(n)
    }

    pub fn directory_index(&self, name: &str) -> Option<usize> {
        self.lock().directory_index(name)
    }

    pub fn file(&self, dir: DirId, n: usize) -> Option<FileEntry> {
        self.lock().file(dir, n)
    }

    pub fn file_index(&self, dir: DirId, name: &str) -> Option<usize> {
        self.lock().file_index(dir, name)
    }

    pub fn num_directories(&self) -> usize {
        self.lock().num_directories()
    }

    pub fn num_files(&self) -> usize {
        self.lock().num_files()
    }

    pub fn abs_file_index(&self, dir_idx: usize, file_idx: usize) -> Option<usize> {
        self.lock().abs_file_index(dir_idx, file_idx)
    }

    pub fn indexes_from_abs(&self, abs: usize) -> Option<(usize, usize)> {
        self.lock().indexes_from_abs(abs)
    }
}
