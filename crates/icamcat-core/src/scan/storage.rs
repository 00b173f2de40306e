/// Storage collaborator used by the builder and the image store
use std::io;
use std::path::Path;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes; zero for directories
    pub size: u64,
}

impl StorageEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
        }
    }
}

/// Directory enumeration and file primitives of the removable medium
pub trait Storage {
    /// List the entries of one directory (not recursive)
    fn list_dir(&self, path: &Path) -> io::Result<Vec<StorageEntry>>;

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// Storage backed by the host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<StorageEntry>> {
        Ok(std::fs::read_dir(path)?
            .filter_map(|entry| local_entry(path, entry))
            .collect())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }
}

/// Convert one listing entry, skipping those that cannot be read
fn local_entry(dir: &Path, entry: io::Result<std::fs::DirEntry>) -> Option<StorageEntry> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
            tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
            return None;
        }
    };
    let Ok(name) = entry.file_name().into_string() else {
        tracing::debug!("Skipping non-UTF-8 entry in {}", dir.display());
        return None;
    };
    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("Skipping {}: {}", name, e);
            return None;
        }
    };
    Some(StorageEntry {
        name,
        is_dir: metadata.is_dir(),
        size: if metadata.is_dir() { 0 } else { metadata.len() },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_listing_reports_kind_and_size() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("100ICAMF")).unwrap();
        std::fs::write(temp_dir.path().join("ICAM_0001.JPG"), [0xFF, 0xD8, 0xFF]).unwrap();

        let mut entries = LocalStorage.list_dir(temp_dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                StorageEntry::directory("100ICAMF"),
                StorageEntry::file("ICAM_0001.JPG", 3),
            ]
        );
    }

    #[test]
    fn test_unreadable_entry_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let failed = Err(io::Error::new(io::ErrorKind::Other, "bad sector"));
        assert_eq!(local_entry(temp_dir.path(), failed), None);

        std::fs::write(temp_dir.path().join("ICAM_0001.JPG"), [0xFF]).unwrap();
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|entry| local_entry(temp_dir.path(), entry))
            .collect();
        assert_eq!(entries, vec![StorageEntry::file("ICAM_0001.JPG", 1)]);
    }

    #[test]
    fn test_local_primitives() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("100ICAMF");
        LocalStorage.create_dir(&dir).unwrap();
        let file = dir.join("ICAM_0001.JPG");
        std::fs::write(&file, b"x").unwrap();

        assert!(LocalStorage.remove_dir(&dir).is_err());
        LocalStorage.remove_file(&file).unwrap();
        LocalStorage.remove_dir(&dir).unwrap();
        assert!(!dir.exists());
        assert!(LocalStorage.list_dir(&dir).is_err());
    }
}
