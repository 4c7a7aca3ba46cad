// SPDX-License-Identifier: MIT
#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};
use core::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    core::{errors::*, utils::path_utils::validate_name},
    fs::flat::{allocator::BlockRun, constant::*, meta::FlatMeta},
};

/// Fixed part of a table slot; followed on disk by `capacity` child indices.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct RawEntryHeader {
    pub name: [u8; FLAT_NAME_LEN],
    pub start_block: u32,
    pub size: u32,
    pub is_directory: u8,
    pub reserved: [u8; 3],
    pub parent_index: i32,
    pub num_children: u32,
}

/// NUL-padded entry name. An empty name marks a free slot.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryName([u8; FLAT_NAME_LEN]);

impl EntryName {
    /// Builds a name for a new entry, rejecting anything a path segment
    /// could not round-trip through.
    pub fn new(name: &str) -> FsTableResult<Self> {
        validate_name(name).map_err(FsTableError::InvalidPath)?;
        Ok(Self::from_str_unchecked(name))
    }

    pub fn root() -> Self {
        Self::from_str_unchecked(FLAT_ROOT_NAME)
    }

    fn from_str_unchecked(name: &str) -> Self {
        let mut raw = [0u8; FLAT_NAME_LEN];
        let len = name.len().min(FLAT_NAME_LEN - 1);
        raw[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self(raw)
    }

    pub fn from_raw(raw: [u8; FLAT_NAME_LEN]) -> FsTableResult<Self> {
        if raw[FLAT_NAME_LEN - 1] != 0 {
            return Err(FsTableError::Corrupted("Entry name is not NUL-terminated"));
        }
        Ok(Self(raw))
    }

    pub fn raw(&self) -> [u8; FLAT_NAME_LEN] {
        self.0
    }

    /// Name bytes up to the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(FLAT_NAME_LEN);
        &self.0[..len]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// Exact byte comparison, no case folding.
    #[inline]
    pub fn matches(&self, segment: &str) -> bool {
        !self.is_empty() && self.as_bytes() == segment.as_bytes()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// In-memory view of one table slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub name: EntryName,
    pub start_block: u32,
    pub size: u32,
    pub is_directory: bool,
    /// `None` only for the root.
    pub parent: Option<u32>,
    /// Slot indices of the children, in insertion order.
    pub children: Vec<u32>,
}

impl Entry {
    pub fn file(name: EntryName) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn directory(name: EntryName) -> Self {
        Self {
            name,
            is_directory: true,
            ..Self::default()
        }
    }

    pub fn root() -> Self {
        Self::directory(EntryName::root())
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.name.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        !self.is_free() && self.parent.is_none()
    }

    /// Block run held by a file; directories hold none.
    pub fn run(&self, meta: &FlatMeta) -> Option<BlockRun> {
        if self.is_free() || self.is_directory {
            return None;
        }
        let count = meta.blocks_for(self.size as usize) as u32;
        Some(BlockRun::new(self.start_block, count))
    }

    /// Appends the slot encoding (`entry_size` bytes for `capacity`) to `buf`.
    pub fn to_raw_buffer(&self, capacity: u32, buf: &mut Vec<u8>) {
        if self.is_free() {
            buf.resize(buf.len() + FLAT_ENTRY_HEADER_SIZE + FLAT_CHILD_INDEX_SIZE * capacity as usize, 0);
            return;
        }

        let header = RawEntryHeader {
            name: self.name.raw(),
            start_block: self.start_block.to_le(),
            size: self.size.to_le(),
            is_directory: self.is_directory as u8,
            reserved: [0; 3],
            parent_index: self.parent.map_or(FLAT_NO_PARENT, |p| p as i32).to_le(),
            num_children: (self.children.len() as u32).to_le(),
        };
        buf.extend_from_slice(header.as_bytes());

        for slot in 0..capacity as usize {
            let child = self.children.get(slot).map_or(0, |&c| c as i32);
            buf.extend_from_slice(&child.to_le_bytes());
        }
    }

    /// Decodes one slot, checking every index against `capacity`.
    pub fn from_raw(raw: &[u8], capacity: u32) -> FsTableResult<Self> {
        let stride = FLAT_ENTRY_HEADER_SIZE + FLAT_CHILD_INDEX_SIZE * capacity as usize;
        if raw.len() < stride {
            return Err(FsTableError::Corrupted("Truncated table slot"));
        }

        let header = RawEntryHeader::read_from_bytes(&raw[..FLAT_ENTRY_HEADER_SIZE])
            .map_err(|_| FsTableError::Corrupted("Unreadable table slot"))?;
        if header.name[0] == 0 {
            return Ok(Self::default());
        }

        let name = EntryName::from_raw(header.name)?;
        let (parent_index, num_children) = (header.parent_index, header.num_children);
        let (start_block, size) = (header.start_block, header.size);

        let parent = match i32::from_le(parent_index) {
            FLAT_NO_PARENT => None,
            p if p >= 0 && (p as u32) < capacity => Some(p as u32),
            _ => return Err(FsTableError::Corrupted("Parent index out of range")),
        };

        let num_children = u32::from_le(num_children);
        if num_children > capacity {
            return Err(FsTableError::Corrupted("Child count exceeds table capacity"));
        }

        let mut children = Vec::with_capacity(num_children as usize);
        for slot in 0..num_children as usize {
            let at = FLAT_ENTRY_HEADER_SIZE + slot * FLAT_CHILD_INDEX_SIZE;
            let mut bytes = [0u8; FLAT_CHILD_INDEX_SIZE];
            bytes.copy_from_slice(&raw[at..at + FLAT_CHILD_INDEX_SIZE]);
            let child = i32::from_le_bytes(bytes);
            if child < 0 || child as u32 >= capacity {
                return Err(FsTableError::Corrupted("Child index out of range"));
            }
            children.push(child as u32);
        }

        Ok(Self {
            name,
            start_block: u32::from_le(start_block),
            size: u32::from_le(size),
            is_directory: header.is_directory != 0,
            parent,
            children,
        })
    }
}
