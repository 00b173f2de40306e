//! Card-level image management
//!
//! Coordinates the storage collaborator and the shared catalog so that
//! directories and files created or removed on the card are mirrored in the
//! catalog under a single lock acquisition.

pub mod manager;

pub use manager::{ImageSlot, ImageStore};
