// SPDX-License-Identifier: MIT
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use flatio::BlockIO;

use crate::core::{errors::*, utils::path_utils::*};
use crate::fs::flat::{constant::*, meta::FlatMeta, types::*};

/// The whole metadata table, held in memory for one operation.
///
/// Entries live in a flat array; the tree is expressed through slot
/// indices (`parent` and `children`). Every mutation keeps both sides of a
/// parent/child link in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable {
    capacity: u32,
    entries: Vec<Entry>,
}

impl MetadataTable {
    /// A table with every slot free.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            entries: vec![Entry::default(); capacity as usize],
        }
    }

    /// A freshly formatted table: the root directory in slot 0.
    pub fn with_root(capacity: u32) -> Self {
        let mut table = Self::new(capacity);
        if let Some(slot) = table.entries.first_mut() {
            *slot = Entry::root();
        }
        table
    }

    /// Reads and decodes the table region in one request.
    pub fn load<IO: BlockIO + ?Sized>(io: &mut IO, meta: &FlatMeta) -> FsTableResult<Self> {
        let mut raw = vec![0u8; meta.table_size as usize];
        io.read_at(meta.table_offset, &mut raw)?;
        Self::from_raw(&raw, meta.capacity)
    }

    pub fn from_raw(raw: &[u8], capacity: u32) -> FsTableResult<Self> {
        let stride = FLAT_ENTRY_HEADER_SIZE + FLAT_CHILD_INDEX_SIZE * capacity as usize;
        if raw.len() < stride * capacity as usize {
            return Err(FsTableError::Corrupted("Truncated metadata table"));
        }
        let entries = raw
            .chunks_exact(stride)
            .take(capacity as usize)
            .map(|slot| Entry::from_raw(slot, capacity))
            .collect::<FsTableResult<Vec<_>>>()?;
        Ok(Self { capacity, entries })
    }

    /// Builds a table from already decoded slots (padded or cut to `capacity`).
    pub(crate) fn from_entries(capacity: u32, mut entries: Vec<Entry>) -> Self {
        entries.resize(capacity as usize, Entry::default());
        Self { capacity, entries }
    }

    /// Encodes and writes the whole table region in one request.
    pub fn store<IO: BlockIO + ?Sized>(&self, io: &mut IO, meta: &FlatMeta) -> FsTableResult {
        let mut raw = Vec::with_capacity(meta.table_size as usize);
        for entry in &self.entries {
            entry.to_raw_buffer(self.capacity, &mut raw);
        }
        io.write_at(meta.table_offset, &raw)?;
        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&Entry> {
        self.entries.get(index as usize)
    }

    /// Non-free entry at `index`.
    pub fn entry(&self, index: u32) -> FsTableResult<&Entry> {
        match self.get(index) {
            Some(entry) if !entry.is_free() => Ok(entry),
            _ => Err(FsTableError::NotFound),
        }
    }

    fn entry_mut(&mut self, index: u32) -> FsTableResult<&mut Entry> {
        match self.entries.get_mut(index as usize) {
            Some(entry) if !entry.is_free() => Ok(entry),
            _ => Err(FsTableError::NotFound),
        }
    }

    /// Non-free entries in table order.
    pub fn iter_used(&self) -> impl Iterator<Item = (u32, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_free())
            .map(|(i, e)| (i as u32, e))
    }

    pub fn used_count(&self) -> usize {
        self.iter_used().count()
    }

    /// Slot of the root directory (the first entry without a parent).
    pub fn root_index(&self) -> FsTableResult<u32> {
        self.iter_used()
            .find(|(_, e)| e.is_root())
            .map(|(i, _)| i)
            .ok_or(FsTableError::Corrupted("Missing root directory"))
    }

    /// First free slot in table order.
    pub fn find_free_slot(&self) -> FsTableResult<u32> {
        self.entries
            .iter()
            .position(Entry::is_free)
            .map(|i| i as u32)
            .ok_or(FsTableError::TableFull)
    }

    /// Child of `dir` named `name`, searched in child-list order.
    pub fn find_child(&self, dir: u32, name: &str) -> Option<u32> {
        let dir_entry = self.get(dir)?;
        dir_entry.children.iter().copied().find(|&c| {
            self.get(c)
                .is_some_and(|e| e.parent == Some(dir) && e.name.matches(name))
        })
    }

    /// Direct children of `dir`, in child-list order.
    pub fn children(&self, dir: u32) -> FsTableResult<impl Iterator<Item = (u32, &Entry)>> {
        let entry = self.entry(dir)?;
        if !entry.is_directory {
            return Err(FsTableError::NotADirectory);
        }
        Ok(entry
            .children
            .iter()
            .filter_map(move |&c| self.get(c).filter(|e| !e.is_free()).map(|e| (c, e))))
    }

    fn walk(&self, segments: &[&str]) -> FsTableResult<u32> {
        let mut current = self.root_index()?;
        for segment in segments {
            if !self.entry(current)?.is_directory {
                return Err(FsTableError::NotADirectory);
            }
            current = self
                .find_child(current, segment)
                .ok_or(FsTableError::NotFound)?;
        }
        Ok(current)
    }

    /// Resolves an absolute path to a slot, walking down from the root.
    pub fn find_by_path(&self, path: &str) -> FsTableResult<u32> {
        ensure_absolute(path)?;
        self.walk(&split_path(path))
    }

    /// Resolves the directory that would hold `path`, and returns it with
    /// the leaf name.
    pub fn resolve_parent<'p>(&self, path: &'p str) -> FsTableResult<(u32, &'p str)> {
        ensure_absolute(path)?;
        let (segments, leaf) =
            split_parent(path).ok_or(FsTableError::InvalidPath("Path has no leaf name"))?;

        let parent = self.walk(&segments).map_err(|e| match e {
            FsTableError::NotFound => FsTableError::ParentNotFound,
            other => other,
        })?;
        if !self.entry(parent)?.is_directory {
            return Err(FsTableError::NotADirectory);
        }
        Ok((parent, leaf))
    }

    /// Stores `entry` in the first free slot and links it under `parent`.
    pub fn insert_child(&mut self, parent: u32, mut entry: Entry) -> FsTableResult<u32> {
        let dir = self.entry(parent)?;
        if !dir.is_directory {
            return Err(FsTableError::NotADirectory);
        }
        if dir.children.len() >= self.capacity as usize {
            return Err(FsTableError::TableFull);
        }
        let slot = self.find_free_slot()?;

        entry.parent = Some(parent);
        entry.children.clear();
        self.entries[slot as usize] = entry;
        self.entry_mut(parent)?.children.push(slot);
        Ok(slot)
    }

    /// Frees the slot and unlinks it from its parent's child list.
    ///
    /// Children of a removed directory are not touched.
    pub fn remove(&mut self, index: u32) -> FsTableResult<Entry> {
        let parent = self.entry(index)?.parent;
        if let Some(parent) = parent
            && let Ok(dir) = self.entry_mut(parent)
        {
            dir.children.retain(|&c| c != index);
        }
        Ok(core::mem::take(&mut self.entries[index as usize]))
    }

    pub fn rename(&mut self, index: u32, name: EntryName) -> FsTableResult {
        self.entry_mut(index)?.name = name;
        Ok(())
    }

    /// Updates where a file's content lives.
    pub fn set_extent(&mut self, index: u32, start_block: u32, size: u32) -> FsTableResult {
        let entry = self.entry_mut(index)?;
        if entry.is_directory {
            return Err(FsTableError::IsADirectory);
        }
        entry.start_block = start_block;
        entry.size = size;
        Ok(())
    }
}

fn ensure_absolute(path: &str) -> FsTableResult {
    if path.is_empty() {
        return Err(FsTableError::InvalidPath("Empty path"));
    }
    if !is_absolute(path) {
        return Err(FsTableError::InvalidPath("Path must be absolute"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> EntryName {
        EntryName::new(s).unwrap()
    }

    /// `/` with `docs/` and `a.txt`, `docs/` holding `b.txt`.
    fn sample() -> MetadataTable {
        let mut t = MetadataTable::with_root(8);
        let docs = t.insert_child(0, Entry::directory(name("docs"))).unwrap();
        t.insert_child(0, Entry::file(name("a.txt"))).unwrap();
        t.insert_child(docs, Entry::file(name("b.txt"))).unwrap();
        t
    }

    #[test]
    fn test_insert_links_both_sides() {
        let t = sample();
        assert_eq!(t.entry(0).unwrap().children, vec![1, 2]);
        assert_eq!(t.entry(1).unwrap().children, vec![3]);
        assert_eq!(t.entry(3).unwrap().parent, Some(1));
        assert_eq!(t.used_count(), 4);
    }

    #[test]
    fn test_find_by_path() {
        let t = sample();
        assert_eq!(t.find_by_path("/"), Ok(0));
        assert_eq!(t.find_by_path("/docs"), Ok(1));
        assert_eq!(t.find_by_path("/docs/b.txt"), Ok(3));
        assert_eq!(t.find_by_path("//docs//b.txt/"), Ok(3));

        assert_eq!(t.find_by_path("/nope"), Err(FsTableError::NotFound));
        assert_eq!(t.find_by_path("/a.txt/x"), Err(FsTableError::NotADirectory));
        assert!(matches!(t.find_by_path(""), Err(FsTableError::InvalidPath(_))));
        assert!(matches!(t.find_by_path("docs"), Err(FsTableError::InvalidPath(_))));
    }

    #[test]
    fn test_resolve_parent() {
        let t = sample();
        assert_eq!(t.resolve_parent("/docs/new"), Ok((1, "new")));
        assert_eq!(t.resolve_parent("/new"), Ok((0, "new")));
        assert_eq!(t.resolve_parent("/ghost/new"), Err(FsTableError::ParentNotFound));
        assert_eq!(t.resolve_parent("/a.txt/new"), Err(FsTableError::NotADirectory));
        assert!(t.resolve_parent("/").is_err());
    }

    #[test]
    fn test_table_full() {
        let mut t = MetadataTable::with_root(3);
        t.insert_child(0, Entry::file(name("x"))).unwrap();
        t.insert_child(0, Entry::file(name("y"))).unwrap();
        assert_eq!(
            t.insert_child(0, Entry::file(name("z"))),
            Err(FsTableError::TableFull)
        );

        let y = t.find_by_path("/y").unwrap();
        t.remove(y).unwrap();
        assert_eq!(t.insert_child(0, Entry::file(name("z"))), Ok(y));
    }

    #[test]
    fn test_remove_compacts_child_list() {
        let mut t = sample();
        let removed = t.remove(1).unwrap();
        assert_eq!(removed.name.as_bytes(), b"docs");
        assert!(t.get(1).unwrap().is_free());
        assert_eq!(t.entry(0).unwrap().children, vec![2]);
        assert_eq!(t.remove(1), Err(FsTableError::NotFound));

        // slot reuse picks the lowest free index
        assert_eq!(t.find_free_slot(), Ok(1));
    }

    #[test]
    fn test_children_and_rename() {
        let mut t = sample();
        let names: Vec<_> = t
            .children(0)
            .unwrap()
            .map(|(_, e)| e.name.to_string_lossy())
            .collect();
        assert_eq!(names, ["docs", "a.txt"]);
        assert!(matches!(t.children(2), Err(FsTableError::NotADirectory)));

        t.rename(2, name("c.txt")).unwrap();
        assert_eq!(t.find_by_path("/c.txt"), Ok(2));
        assert_eq!(t.find_by_path("/a.txt"), Err(FsTableError::NotFound));
    }

    #[test]
    fn test_set_extent() {
        let mut t = sample();
        t.set_extent(2, 5, 300).unwrap();
        let e = t.entry(2).unwrap();
        assert_eq!((e.start_block, e.size), (5, 300));
        assert_eq!(t.set_extent(1, 0, 1), Err(FsTableError::IsADirectory));
    }

    #[test]
    fn test_raw_roundtrip_keeps_order() {
        let t = sample();
        let mut raw = Vec::new();
        for slot in 0..t.capacity() {
            t.get(slot).unwrap().to_raw_buffer(t.capacity(), &mut raw);
        }
        assert_eq!(MetadataTable::from_raw(&raw, 8).unwrap(), t);
        assert!(MetadataTable::from_raw(&raw[..raw.len() - 1], 8).is_err());
    }

    #[test]
    fn test_missing_root() {
        let t = MetadataTable::new(4);
        assert!(matches!(t.find_by_path("/x"), Err(FsTableError::Corrupted(_))));
    }
}
