//! In-memory image catalog
//!
//! [`arena`] provides the fixed-budget allocator, [`index`] the sorted
//! directory/file lists built on it, and [`shared`] the mutex-guarded
//! handle that GUI and background threads use concurrently.

pub mod arena;
pub mod index;
pub mod shared;

pub use arena::{NameArena, NameRef, DIRECTORY_NODE_BYTES, FILE_NODE_BYTES};
pub use index::{CatalogIndex, DirId, DirectoryEntry, FileEntry, FileId, NameList, NameListKind};
pub use shared::SharedCatalog;
