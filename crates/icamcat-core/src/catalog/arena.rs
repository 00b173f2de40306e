//! Bump allocator backing every catalog node and name
//!
//! The arena has a fixed byte budget. Directory nodes, file nodes and
//! NUL-terminated names all draw from the same cursor, and nothing is ever
//! returned individually: the only way to reclaim space is [`NameArena::reset`],
//! which discards every node at once and bumps the generation so that
//! previously issued handles can be recognised as stale.

/// Bytes charged for one directory node (name, count and three links)
pub const DIRECTORY_NODE_BYTES: usize = 20;

/// Bytes charged for one file node (name and two links)
pub const FILE_NODE_BYTES: usize = 12;

/// Names are padded to a 32-bit boundary
const NAME_ALIGN: usize = 4;

/// Location of a name inside the arena's byte storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRef {
    offset: u32,
    len: u32,
}

impl NameRef {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Directory node slot
#[derive(Debug, Clone)]
pub(crate) struct DirectoryNode {
    pub name: NameRef,
    pub file_count: usize,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub first_file: Option<u32>,
    /// False once spliced out of the directory list
    pub linked: bool,
}

/// File node slot
#[derive(Debug, Clone)]
pub(crate) struct FileNode {
    pub name: NameRef,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    /// Slot of the owning directory
    pub owner: u32,
    pub linked: bool,
}

const EMPTY_NAME: NameRef = NameRef { offset: 0, len: 0 };

/// Fixed-capacity arena for catalog nodes and names
pub struct NameArena {
    capacity: usize,
    cursor: usize,
    generation: u32,
    names: Vec<u8>,
    directories: Vec<DirectoryNode>,
    files: Vec<FileNode>,
}

/// Round up to the next multiple of four
pub fn ceil4(n: usize) -> usize {
    (n + NAME_ALIGN - 1) & !(NAME_ALIGN - 1)
}

impl NameArena {
    /// Create an arena with a budget of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
            generation: 0,
            names: Vec::new(),
            directories: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed since the last reset
    pub fn used(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }

    /// Generation counter, incremented by every reset
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Discard every allocation and return the cursor to the start
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.generation = self.generation.wrapping_add(1);
        self.names.clear();
        self.directories.clear();
        self.files.clear();
    }

    fn reserve(&mut self, bytes: usize, what: &str) -> bool {
        if bytes > self.remaining() {
            tracing::warn!(
                "Catalog arena exhausted allocating {} ({} bytes requested, {} of {} used)",
                what,
                bytes,
                self.cursor,
                self.capacity
            );
            return false;
        }
        self.cursor += bytes;
        true
    }

    /// Reserve an unlinked directory node and return its slot
    pub fn allocate_directory_node(&mut self) -> Option<u32> {
        if !self.reserve(DIRECTORY_NODE_BYTES, "directory node") {
            return None;
        }
        let slot = self.directories.len() as u32;
        self.directories.push(DirectoryNode {
            name: EMPTY_NAME,
            file_count: 0,
            prev: None,
            next: None,
            first_file: None,
            linked: false,
        });
        Some(slot)
    }

    /// Reserve an unlinked file node and return its slot
    pub fn allocate_file_node(&mut self) -> Option<u32> {
        if !self.reserve(FILE_NODE_BYTES, "file node") {
            return None;
        }
        let slot = self.files.len() as u32;
        self.files.push(FileNode {
            name: EMPTY_NAME,
            prev: None,
            next: None,
            owner: 0,
            linked: false,
        });
        Some(slot)
    }

    /// Copy `name` into the arena with a NUL terminator and 32-bit padding
    pub fn allocate_name(&mut self, name: &str) -> Option<NameRef> {
        let bytes = ceil4(name.len() + 1);
        if !self.reserve(bytes, "name") {
            return None;
        }
        let offset = self.names.len();
        self.names.extend_from_slice(name.as_bytes());
        self.names.resize(offset + bytes, 0);
        Some(NameRef {
            offset: offset as u32,
            len: name.len() as u32,
        })
    }

    /// Resolve a name previously returned by [`allocate_name`](Self::allocate_name)
    pub fn name(&self, name: NameRef) -> &str {
        let start = name.offset as usize;
        let end = start + name.len as usize;
        self.names
            .get(start..end)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("")
    }

    pub(crate) fn directory(&self, slot: u32) -> Option<&DirectoryNode> {
        self.directories.get(slot as usize)
    }

    pub(crate) fn directory_mut(&mut self, slot: u32) -> Option<&mut DirectoryNode> {
        self.directories.get_mut(slot as usize)
    }

    pub(crate) fn file(&self, slot: u32) -> Option<&FileNode> {
        self.files.get(slot as usize)
    }

    pub(crate) fn file_mut(&mut self, slot: u32) -> Option<&mut FileNode> {
        self.files.get_mut(slot as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil4() {
        assert_eq!(ceil4(0), 0);
        assert_eq!(ceil4(1), 4);
        assert_eq!(ceil4(4), 4);
        assert_eq!(ceil4(9), 12);
    }

    #[test]
    fn test_name_allocation_is_padded() {
        let mut arena = NameArena::new(64);

        // 8 chars + NUL rounds up to 12
        let name = arena.allocate_name("001ICAMF").unwrap();
        assert_eq!(arena.used(), 12);
        assert_eq!(arena.name(name), "001ICAMF");

        // 3 chars + NUL fits exactly in 4
        let short = arena.allocate_name("abc").unwrap();
        assert_eq!(arena.used(), 16);
        assert_eq!(arena.name(short), "abc");
        assert_eq!(arena.name(name), "001ICAMF");
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let mut arena = NameArena::new(DIRECTORY_NODE_BYTES + FILE_NODE_BYTES);

        assert!(arena.allocate_directory_node().is_some());
        assert!(arena.allocate_directory_node().is_none());
        assert!(arena.allocate_file_node().is_some());
        assert_eq!(arena.remaining(), 0);
        assert!(arena.allocate_file_node().is_none());
        assert!(arena.allocate_name("").is_none());
    }

    #[test]
    fn test_reset_reclaims_everything() {
        let mut arena = NameArena::new(32);
        arena.allocate_directory_node().unwrap();
        arena.allocate_name("ICAM").unwrap();
        let generation = arena.generation();

        arena.reset();

        assert_eq!(arena.used(), 0);
        assert_eq!(arena.generation(), generation + 1);
        assert!(arena.directory(0).is_none());
        assert_eq!(arena.allocate_directory_node(), Some(0));
    }
}
