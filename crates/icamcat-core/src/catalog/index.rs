//! Sorted two-level list engine
//!
//! Directories form one doubly linked list ordered by name. Each directory
//! owns a second doubly linked list of its files, also ordered by name.
//! Links are arena slot numbers; the handles handed out to callers carry the
//! arena generation so that a handle issued before a rebuild never resolves
//! to a node of the new catalog.

use serde::{Deserialize, Serialize};

use super::arena::{DirectoryNode, FileNode, NameArena};
use crate::config::CatalogConfig;
use crate::naming::display_name;

/// Handle to a directory in the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DirId {
    slot: u32,
    generation: u32,
}

/// Handle to a file in the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId {
    slot: u32,
    generation: u32,
}

/// Snapshot of a directory node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: DirId,
    pub name: String,
    pub file_count: usize,
}

/// Snapshot of a file node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: FileId,
    pub directory: DirId,
    /// Stored name, extension included
    pub name: String,
}

impl FileEntry {
    /// Name without its extension, as shown in browse lists
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }
}

/// What [`CatalogIndex::name_list`] enumerates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameListKind {
    /// Every directory name
    Directories,
    /// Display names of the files in the directory at this index
    Files(usize),
}

impl From<i32> for NameListKind {
    /// Negative selects directories, anything else a directory index
    fn from(kind: i32) -> Self {
        if kind < 0 {
            NameListKind::Directories
        } else {
            NameListKind::Files(kind as usize)
        }
    }
}

/// Bounded list of names produced for a browse widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameList {
    names: Vec<String>,
}

impl NameList {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Comma-separated form
    pub fn joined(&self) -> String {
        self.names.join(",")
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

struct DirectorySlots<'a> {
    arena: &'a NameArena,
    cursor: Option<u32>,
}

impl<'a> Iterator for DirectorySlots<'a> {
    type Item = (u32, &'a DirectoryNode);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.arena.directory(slot)?;
        self.cursor = node.next;
        Some((slot, node))
    }
}

struct FileSlots<'a> {
    arena: &'a NameArena,
    cursor: Option<u32>,
}

impl<'a> Iterator for FileSlots<'a> {
    type Item = (u32, &'a FileNode);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.arena.file(slot)?;
        self.cursor = node.next;
        Some((slot, node))
    }
}

/// In-memory catalog of image directories and files
///
/// Not synchronised; see [`SharedCatalog`](super::SharedCatalog) for the
/// guarded wrapper used across threads.
pub struct CatalogIndex {
    arena: NameArena,
    root: Option<u32>,
    max_names: usize,
}

impl CatalogIndex {
    /// Create an empty catalog with an arena of `arena_bytes` and a name list
    /// limit of `max_names`
    pub fn new(arena_bytes: usize, max_names: usize) -> Self {
        Self {
            arena: NameArena::new(arena_bytes),
            root: None,
            max_names,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.arena_bytes, config.max_catalog_names)
    }

    pub fn arena(&self) -> &NameArena {
        &self.arena
    }

    /// Drop every node by resetting the arena and the root
    pub fn clear(&mut self) {
        self.arena.reset();
        self.root = None;
    }

    fn directory_slots(&self) -> DirectorySlots<'_> {
        DirectorySlots {
            arena: &self.arena,
            cursor: self.root,
        }
    }

    fn file_slots(&self, dir_slot: u32) -> FileSlots<'_> {
        FileSlots {
            arena: &self.arena,
            cursor: self.arena.directory(dir_slot).and_then(|d| d.first_file),
        }
    }

    fn dir_id(&self, slot: u32) -> DirId {
        DirId {
            slot,
            generation: self.arena.generation(),
        }
    }

    fn file_id(&self, slot: u32) -> FileId {
        FileId {
            slot,
            generation: self.arena.generation(),
        }
    }

    /// Slot of a live directory, or `None` for stale or unlinked handles
    fn live_directory(&self, id: DirId) -> Option<u32> {
        if id.generation != self.arena.generation() {
            return None;
        }
        self.arena
            .directory(id.slot)
            .filter(|node| node.linked)
            .map(|_| id.slot)
    }

    fn directory_snapshot(&self, slot: u32, node: &DirectoryNode) -> DirectoryEntry {
        DirectoryEntry {
            id: self.dir_id(slot),
            name: self.arena.name(node.name).to_string(),
            file_count: node.file_count,
        }
    }

    fn file_snapshot(&self, slot: u32, node: &FileNode) -> FileEntry {
        FileEntry {
            id: self.file_id(slot),
            directory: self.dir_id(node.owner),
            name: self.arena.name(node.name).to_string(),
        }
    }

    /// Insert a directory in name order
    ///
    /// The new node goes before the first existing node whose name is greater
    /// than or equal to `name`. Returns `None` when the arena is full; the
    /// catalog is left unchanged apart from the consumed space.
    pub fn insert_directory(&mut self, name: &str) -> Option<DirId> {
        let slot = self.arena.allocate_directory_node()?;
        let name_ref = self.arena.allocate_name(name)?;

        let mut prev = None;
        let mut next = None;
        for (candidate, node) in self.directory_slots() {
            if self.arena.name(node.name) >= name {
                next = Some(candidate);
                break;
            }
            prev = Some(candidate);
        }

        let node = self.arena.directory_mut(slot)?;
        node.name = name_ref;
        node.prev = prev;
        node.next = next;
        node.linked = true;

        match prev {
            Some(p) => self.arena.directory_mut(p)?.next = Some(slot),
            None => self.root = Some(slot),
        }
        if let Some(n) = next {
            self.arena.directory_mut(n)?.prev = Some(slot);
        }

        tracing::debug!("Catalog: added directory {}", name);
        Some(self.dir_id(slot))
    }

    /// Insert a file into `dir` in name order, incrementing its file count
    pub fn insert_file(&mut self, dir: DirId, name: &str) -> Option<FileId> {
        let dir_slot = self.live_directory(dir)?;
        let slot = self.arena.allocate_file_node()?;
        let name_ref = self.arena.allocate_name(name)?;

        let mut prev = None;
        let mut next = None;
        for (candidate, node) in self.file_slots(dir_slot) {
            if self.arena.name(node.name) >= name {
                next = Some(candidate);
                break;
            }
            prev = Some(candidate);
        }

        let node = self.arena.file_mut(slot)?;
        node.name = name_ref;
        node.prev = prev;
        node.next = next;
        node.owner = dir_slot;
        node.linked = true;

        match prev {
            Some(p) => self.arena.file_mut(p)?.next = Some(slot),
            None => self.arena.directory_mut(dir_slot)?.first_file = Some(slot),
        }
        if let Some(n) = next {
            self.arena.file_mut(n)?.prev = Some(slot);
        }
        self.arena.directory_mut(dir_slot)?.file_count += 1;

        tracing::debug!("Catalog: added file {}", name);
        Some(self.file_id(slot))
    }

    /// Unlink the `n`th directory; out-of-range indexes are ignored
    pub fn delete_directory(&mut self, n: usize) {
        let Some((slot, prev, next)) = self
            .directory_slots()
            .nth(n)
            .map(|(slot, node)| (slot, node.prev, node.next))
        else {
            return;
        };

        match prev {
            Some(p) => {
                if let Some(p) = self.arena.directory_mut(p) {
                    p.next = next;
                }
            }
            None => self.root = next,
        }
        if let Some(n) = next.and_then(|n| self.arena.directory_mut(n)) {
            n.prev = prev;
        }
        if let Some(node) = self.arena.directory_mut(slot) {
            node.prev = None;
            node.next = None;
            node.linked = false;
        }
    }

    /// Unlink the `n`th file of `dir`; out-of-range indexes and stale
    /// handles are ignored
    pub fn delete_file(&mut self, dir: DirId, n: usize) {
        let Some(dir_slot) = self.live_directory(dir) else {
            return;
        };
        let Some((slot, prev, next)) = self
            .file_slots(dir_slot)
            .nth(n)
            .map(|(slot, node)| (slot, node.prev, node.next))
        else {
            return;
        };

        let head = match prev {
            Some(p) => {
                if let Some(p) = self.arena.file_mut(p) {
                    p.next = next;
                }
                false
            }
            None => true,
        };
        if let Some(d) = self.arena.directory_mut(dir_slot) {
            if head {
                d.first_file = next;
            }
            d.file_count -= 1;
        }
        if let Some(n) = next.and_then(|n| self.arena.file_mut(n)) {
            n.prev = prev;
        }
        if let Some(node) = self.arena.file_mut(slot) {
            node.prev = None;
            node.next = None;
            node.linked = false;
        }
    }

    /// The `n`th directory in name order
    pub fn directory(&self, n: usize) -> Option<DirectoryEntry> {
        self.directory_slots()
            .nth(n)
            .map(|(slot, node)| self.directory_snapshot(slot, node))
    }

    /// Resolve a directory handle
    pub fn directory_entry(&self, id: DirId) -> Option<DirectoryEntry> {
        let slot = self.live_directory(id)?;
        let node = self.arena.directory(slot)?;
        Some(self.directory_snapshot(slot, node))
    }

    /// Index of the directory with exactly this name
    pub fn directory_index(&self, name: &str) -> Option<usize> {
        self.directory_slots()
            .position(|(_, node)| self.arena.name(node.name) == name)
    }

    /// The `n`th file of `dir` in name order
    pub fn file(&self, dir: DirId, n: usize) -> Option<FileEntry> {
        let dir_slot = self.live_directory(dir)?;
        self.file_slots(dir_slot)
            .nth(n)
            .map(|(slot, node)| self.file_snapshot(slot, node))
    }

    /// Resolve a file handle
    pub fn file_entry(&self, id: FileId) -> Option<FileEntry> {
        if id.generation != self.arena.generation() {
            return None;
        }
        let node = self.arena.file(id.slot).filter(|node| {
            node.linked && self.arena.directory(node.owner).is_some_and(|d| d.linked)
        })?;
        Some(self.file_snapshot(id.slot, node))
    }

    /// Index within `dir` of the file with exactly this stored name
    pub fn file_index(&self, dir: DirId, name: &str) -> Option<usize> {
        let dir_slot = self.live_directory(dir)?;
        self.file_slots(dir_slot)
            .position(|(_, node)| self.arena.name(node.name) == name)
    }

    /// All directories in order
    pub fn directories(&self) -> Vec<DirectoryEntry> {
        self.directory_slots()
            .map(|(slot, node)| self.directory_snapshot(slot, node))
            .collect()
    }

    /// All files of `dir` in order; empty for stale handles
    pub fn files(&self, dir: DirId) -> Vec<FileEntry> {
        match self.live_directory(dir) {
            Some(dir_slot) => self
                .file_slots(dir_slot)
                .map(|(slot, node)| self.file_snapshot(slot, node))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Up to the configured maximum of directory names or file display names
    pub fn name_list(&self, kind: NameListKind) -> NameList {
        let names = match kind {
            NameListKind::Directories => self
                .directory_slots()
                .take(self.max_names)
                .map(|(_, node)| self.arena.name(node.name).to_string())
                .collect(),
            NameListKind::Files(n) => match self.directory_slots().nth(n) {
                Some((dir_slot, _)) => self
                    .file_slots(dir_slot)
                    .take(self.max_names)
                    .map(|(_, node)| display_name(self.arena.name(node.name)).to_string())
                    .collect(),
                None => Vec::new(),
            },
        };
        NameList { names }
    }

    pub fn num_directories(&self) -> usize {
        self.directory_slots().count()
    }

    /// Total number of files across all directories
    pub fn num_files(&self) -> usize {
        self.directory_slots().map(|(_, node)| node.file_count).sum()
    }

    /// Flatten a (directory, file) index pair into one catalog-wide ordinal
    pub fn abs_file_index(&self, dir_idx: usize, file_idx: usize) -> Option<usize> {
        let mut base = 0;
        for (i, (_, node)) in self.directory_slots().enumerate() {
            if i == dir_idx {
                return (file_idx < node.file_count).then_some(base + file_idx);
            }
            base += node.file_count;
        }
        None
    }

    /// Split a catalog-wide ordinal back into a (directory, file) index pair
    pub fn indexes_from_abs(&self, abs: usize) -> Option<(usize, usize)> {
        let mut base = 0;
        for (i, (_, node)) in self.directory_slots().enumerate() {
            if abs < base + node.file_count {
                return Some((i, abs - base));
            }
            base += node.file_count;
        }
        None
    }

    /// Check ordering, back links and file counts across the whole catalog
    pub fn is_consistent(&self) -> bool {
        let mut prev_dir: Option<(u32, &str)> = None;
        for (slot, dir) in self.directory_slots() {
            let name = self.arena.name(dir.name);
            if dir.prev != prev_dir.map(|(s, _)| s) || !dir.linked {
                return false;
            }
            if prev_dir.is_some_and(|(_, p)| p > name) {
                return false;
            }

            let mut prev_file: Option<(u32, &str)> = None;
            let mut count = 0;
            for (file_slot, file) in self.file_slots(slot) {
                let file_name = self.arena.name(file.name);
                if file.prev != prev_file.map(|(s, _)| s) || file.owner != slot || !file.linked {
                    return false;
                }
                if prev_file.is_some_and(|(_, p)| p > file_name) {
                    return false;
                }
                prev_file = Some((file_slot, file_name));
                count += 1;
            }
            if count != dir.file_count {
                return false;
            }
            prev_dir = Some((slot, name));
        }
        true
    }
}
