use std::path::PathBuf;

pub mod catalog;
pub mod config;
pub mod naming;
pub mod scan;
pub mod store;

pub use catalog::{
    CatalogIndex, DirId, DirectoryEntry, FileEntry, FileId, NameList, NameListKind, SharedCatalog,
};
pub use config::CatalogConfig;
pub use naming::ImageKind;
pub use scan::{build_catalog, LocalStorage, ScanReport, Storage, StorageEntry};
pub use store::{ImageSlot, ImageStore};

/// Failures surfaced by catalog operations
///
/// Lookups that find nothing and deletes of missing entries are not errors;
/// they return `None` or do nothing.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The image root could not be listed (no card, or no image folder)
    #[error("image root {} is unavailable: {source}", .path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A create or unlink on the card failed
    #[error("storage operation on {} failed: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The arena has no room for the entry
    #[error("catalog arena is full")]
    CatalogFull,

    /// Every three-digit directory ordinal is in use
    #[error("no directory ordinals left")]
    DirectoriesExhausted,

    #[error("invalid configuration: {0}")]
    Config(String),
}
