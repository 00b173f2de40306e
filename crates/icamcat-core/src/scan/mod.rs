//! Card scanning
//!
//! The [`storage`] collaborator lists and modifies the card's directories;
//! the [`builder`] walks it once and fills a [`CatalogIndex`](crate::catalog::CatalogIndex).

pub mod builder;
pub mod storage;

pub use builder::{build_catalog, ScanReport};
pub use storage::{LocalStorage, Storage, StorageEntry};
