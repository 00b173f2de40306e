//! Catalog builder
//!
//! One pass over the image root: every qualifying `NNNICAMF` directory is
//! added to the catalog, then listed, and every qualifying non-empty
//! `ICAM*.JPG` / `ICAM*.MJPG` file in it is added to that directory. Only a
//! failure to list the root itself is an error. Directories that cannot be
//! listed are kept (empty), and entries that no longer fit in the arena are
//! dropped and counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use super::storage::{Storage, StorageEntry};
use crate::catalog::CatalogIndex;
use crate::naming::{is_valid_directory_name, is_valid_file_name};
use crate::CatalogError;

/// Outcome of a catalog build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Directories now in the catalog
    pub directories: usize,
    /// Files now in the catalog
    pub files: usize,
    /// Entries that did not match the naming convention, were empty, or could
    /// not be listed
    pub skipped_entries: usize,
    /// Qualifying entries left out because the arena was full, including the
    /// images inside a directory that did not fit
    pub dropped_entries: usize,
    pub arena_used: usize,
    pub arena_capacity: usize,
}

impl ScanReport {
    /// True when the catalog holds fewer entries than the card
    pub fn is_truncated(&self) -> bool {
        self.dropped_entries > 0
    }
}

/// Reset `index` and fill it from the directory tree under `root`
pub fn build_catalog<S: Storage + ?Sized>(
    index: &mut CatalogIndex,
    storage: &S,
    root: &Path,
) -> Result<ScanReport, CatalogError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    index.clear();
    tracing::info!("Building catalog from {}", root.display());

    let entries = storage
        .list_dir(root)
        .map_err(|source| CatalogError::RootUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

    let mut skipped = 0;
    let mut dropped = 0;

    for entry in entries {
        if !entry.is_dir || !is_valid_directory_name(&entry.name) {
            skipped += 1;
            continue;
        }

        let dir_path = root.join(&entry.name);
        let Some(dir) = index.insert_directory(&entry.name) else {
            // The directory and every image it holds are left out
            dropped += 1 + storage
                .list_dir(&dir_path)
                .map_or(0, |files| files.iter().filter(|f| is_catalogued(f)).count());
            continue;
        };

        let files = match storage.list_dir(&dir_path) {
            Ok(files) => files,
            Err(e) => {
                tracing::debug!("Skipping contents of {}: {}", dir_path.display(), e);
                skipped += 1;
                continue;
            }
        };

        for file in files {
            if !is_catalogued(&file) {
                skipped += 1;
                continue;
            }
            if index.insert_file(dir, &file.name).is_none() {
                dropped += 1;
            }
        }
    }

    let report = ScanReport {
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
        directories: index.num_directories(),
        files: index.num_files(),
        skipped_entries: skipped,
        dropped_entries: dropped,
        arena_used: index.arena().used(),
        arena_capacity: index.arena().capacity(),
    };

    if report.is_truncated() {
        tracing::warn!(
            "Catalog truncated: {} entries did not fit in {} bytes",
            report.dropped_entries,
            report.arena_capacity
        );
    }
    tracing::info!(
        "Catalog built: {} directories, {} files ({} entries skipped)",
        report.directories,
        report.files,
        report.skipped_entries
    );

    Ok(report)
}

fn is_catalogued(file: &StorageEntry) -> bool {
    !file.is_dir && file.size > 0 && is_valid_file_name(&file.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    /// Listing-only storage with canned directory contents
    #[derive(Default)]
    struct FakeStorage {
        listings: HashMap<PathBuf, Vec<StorageEntry>>,
    }

    impl FakeStorage {
        fn with(mut self, path: &str, entries: Vec<StorageEntry>) -> Self {
            self.listings.insert(PathBuf::from(path), entries);
            self
        }
    }

    impl Storage for FakeStorage {
        fn list_dir(&self, path: &Path) -> io::Result<Vec<StorageEntry>> {
            self.listings
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
        }

        fn create_dir(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "read-only"))
        }

        fn remove_file(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "read-only"))
        }

        fn remove_dir(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "read-only"))
        }
    }

    fn card() -> FakeStorage {
        FakeStorage::default()
            .with(
                "/card",
                vec![
                    StorageEntry::directory("101ICAMF"),
                    StorageEntry::directory("100ICAMF"),
                    StorageEntry::directory("ABCICAMF"),
                    StorageEntry::directory("102ICAMG"),
                    StorageEntry::file("103ICAMF", 10),
                    StorageEntry::directory("104ICAMF"),
                ],
            )
            .with(
                "/card/100ICAMF",
                vec![
                    StorageEntry::file("ICAM_0002.JPG", 100),
                    StorageEntry::file("ICAM_0001.JPG", 100),
                    StorageEntry::file("ICAM_0003.MJPG", 100),
                    StorageEntry::file("ICAM_0004.JPG", 0),
                    StorageEntry::file("IMG_0005.JPG", 100),
                    StorageEntry::directory("ICAM_0006.JPG"),
                ],
            )
            .with("/card/101ICAMF", vec![StorageEntry::file("ICAM_0007.JPG", 1)])
    }

    #[test]
    fn test_build_filters_and_sorts() {
        let mut index = CatalogIndex::new(4096, 100);
        let report = build_catalog(&mut index, &card(), Path::new("/card")).unwrap();

        let dirs: Vec<_> = index.directories().into_iter().map(|d| d.name).collect();
        // 104ICAMF cannot be listed but stays in the catalog, empty
        assert_eq!(dirs, vec!["100ICAMF", "101ICAMF", "104ICAMF"]);

        let first = index.directory(0).unwrap();
        let files: Vec<_> = index.files(first.id).into_iter().map(|f| f.name).collect();
        assert_eq!(files, vec!["ICAM_0001.JPG", "ICAM_0002.JPG", "ICAM_0003.MJPG"]);
        assert_eq!(first.file_count, 3);

        assert_eq!(report.directories, 3);
        assert_eq!(report.files, 4);
        assert_eq!(report.skipped_entries, 7);
        assert!(!report.is_truncated());
        assert!(index.is_consistent());
    }

    #[test]
    fn test_unreadable_root_is_an_error() {
        let mut index = CatalogIndex::new(4096, 100);
        index.insert_directory("100ICAMF").unwrap();

        let result = build_catalog(&mut index, &FakeStorage::default(), Path::new("/card"));

        assert!(matches!(result, Err(CatalogError::RootUnavailable { .. })));
        assert_eq!(index.num_directories(), 0);
    }

    #[test]
    fn test_rebuild_replaces_previous_catalog() {
        let mut index = CatalogIndex::new(4096, 100);
        index.insert_directory("999ICAMF").unwrap();

        build_catalog(&mut index, &card(), Path::new("/card")).unwrap();
        build_catalog(&mut index, &card(), Path::new("/card")).unwrap();

        assert_eq!(index.directory_index("999ICAMF"), None);
        assert_eq!(index.num_directories(), 3);
        assert_eq!(index.num_files(), 4);
    }

    #[test]
    fn test_arena_exhaustion_truncates() {
        // Two directory nodes with names, then one file node with its name
        let capacity = 2 * (20 + 12) + (12 + 16);
        let mut index = CatalogIndex::new(capacity, 100);
        let storage = FakeStorage::default()
            .with(
                "/card",
                vec![
                    StorageEntry::directory("100ICAMF"),
                    StorageEntry::directory("101ICAMF"),
                ],
            )
            .with(
                "/card/100ICAMF",
                vec![
                    StorageEntry::file("ICAM_0002.JPG", 1),
                    StorageEntry::file("ICAM_0001.JPG", 1),
                ],
            )
            .with("/card/101ICAMF", vec![StorageEntry::file("ICAM_0003.JPG", 1)]);

        let report = build_catalog(&mut index, &storage, Path::new("/card")).unwrap();

        assert!(report.is_truncated());
        assert!(report.files < 3);
        assert_eq!(report.arena_capacity, capacity);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_dropped_directory_counts_its_images() {
        // 100ICAMF and its one file fill the arena
        let capacity = (20 + 12) + (12 + 16);
        let mut index = CatalogIndex::new(capacity, 100);
        let storage = FakeStorage::default()
            .with(
                "/card",
                vec![
                    StorageEntry::directory("100ICAMF"),
                    StorageEntry::directory("101ICAMF"),
                ],
            )
            .with("/card/100ICAMF", vec![StorageEntry::file("ICAM_0001.JPG", 1)])
            .with(
                "/card/101ICAMF",
                vec![
                    StorageEntry::file("ICAM_0002.JPG", 1),
                    StorageEntry::file("ICAM_0003.MJPG", 1),
                    StorageEntry::file("notes.txt", 1),
                ],
            );

        let report = build_catalog(&mut index, &storage, Path::new("/card")).unwrap();

        assert_eq!(report.directories, 1);
        assert_eq!(report.files, 1);
        assert_eq!(report.dropped_entries, 3);
        assert_eq!(report.skipped_entries, 0);
        assert!(index.is_consistent());
    }
}
