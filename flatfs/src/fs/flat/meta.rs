// SPDX-License-Identifier: MIT

pub use crate::core::meta::*;

use crate::core::errors::{FsFormatterError, FsFormatterResult};
use crate::fs::flat::constant::*;

/// Geometry of a flat volume.
///
/// Only the block size, block count and table capacity are chosen; every
/// region offset follows from them:
///
/// ```text
/// | superblock | metadata table | bitmap | data region |
/// 0            table_offset     bitmap_offset           data_offset + total_blocks * block_size
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMeta {
    pub block_size: u32,
    pub total_blocks: u32,
    pub capacity: u32,

    /// Stride of one table slot in bytes.
    pub entry_size: usize,

    pub table_offset: u64,
    pub table_size: u32,

    pub bitmap_offset: u64,
    pub bitmap_size: u32,

    pub data_offset: u64,
}

impl FlatMeta {
    /// Validates the geometry and derives the region offsets.
    pub fn new(block_size: u32, total_blocks: u32, capacity: u32) -> FsFormatterResult<Self> {
        if block_size == 0 {
            return Err(FsFormatterError::Invalid("Block size must be non-zero"));
        }
        if total_blocks == 0 {
            return Err(FsFormatterError::Invalid("Volume needs at least one data block"));
        }
        if capacity == 0 {
            return Err(FsFormatterError::Invalid("Table capacity must hold the root entry"));
        }
        if capacity > i32::MAX as u32 {
            return Err(FsFormatterError::Invalid("Table capacity exceeds the index range"));
        }
        let entry_size = Self::stride(capacity);
        if capacity as u64 * entry_size > u32::MAX as u64 {
            return Err(FsFormatterError::Invalid("Metadata table too large"));
        }

        Ok(Self::compute(block_size, total_blocks, capacity))
    }

    /// Largest volume with the given block size and capacity that fits in
    /// `size_bytes`.
    pub fn from_device_size(size_bytes: u64, block_size: u32, capacity: u32) -> FsFormatterResult<Self> {
        if block_size == 0 || capacity == 0 {
            return Self::new(block_size, 1, capacity);
        }

        let fixed = FLAT_SUPERBLOCK_SIZE as u64 + capacity as u64 * Self::stride(capacity);
        let available = size_bytes
            .checked_sub(fixed)
            .ok_or(FsFormatterError::Invalid("Device too small for the metadata table"))?;

        // each block costs its data plus one bitmap bit
        let bs = block_size as u64;
        let mut blocks = available.saturating_mul(8) / (8 * bs + 1);
        while blocks > 0 && blocks.div_ceil(8) + blocks * bs > available {
            blocks -= 1;
        }

        let blocks = blocks.min(u32::MAX as u64) as u32;
        Self::new(block_size, blocks, capacity)
    }

    fn stride(capacity: u32) -> u64 {
        FLAT_ENTRY_HEADER_SIZE as u64 + FLAT_CHILD_INDEX_SIZE as u64 * capacity as u64
    }

    fn compute(block_size: u32, total_blocks: u32, capacity: u32) -> Self {
        let entry_size = Self::stride(capacity) as usize;
        let table_offset = FLAT_SUPERBLOCK_OFFSET + FLAT_SUPERBLOCK_SIZE as u64;
        let table_size = (capacity as usize * entry_size) as u32;
        let bitmap_offset = table_offset + table_size as u64;
        let bitmap_size = total_blocks.div_ceil(8);
        let data_offset = bitmap_offset + bitmap_size as u64;

        Self {
            block_size,
            total_blocks,
            capacity,
            entry_size,
            table_offset,
            table_size,
            bitmap_offset,
            bitmap_size,
            data_offset,
        }
    }

    /// Bytes needed on the device to hold the whole volume.
    #[inline]
    pub fn device_size(&self) -> u64 {
        self.data_offset + self.total_blocks as u64 * self.block_size as u64
    }

    /// Absolute offset of table slot `slot`.
    #[inline]
    pub fn entry_offset(&self, slot: u32) -> u64 {
        self.table_offset + slot as u64 * self.entry_size as u64
    }

    /// Absolute offset of data block `block`.
    #[inline]
    pub fn block_offset(&self, block: u32) -> u64 {
        self.data_offset + block as u64 * self.block_size as u64
    }

    /// Blocks held by a file of `len` bytes. A file always holds at least one.
    #[inline]
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.block_size as usize).max(1)
    }

    /// `true` if `[start, start + count)` is a non-empty run inside the data region.
    #[inline]
    pub fn contains_run(&self, start: u32, count: u32) -> bool {
        count > 0 && start as u64 + count as u64 <= self.total_blocks as u64
    }
}

impl Default for FlatMeta {
    fn default() -> Self {
        Self::compute(DEFAULT_BLOCK_SIZE, DEFAULT_TOTAL_BLOCKS, DEFAULT_CAPACITY)
    }
}

impl FsMeta<u32> for FlatMeta {
    fn unit_size(&self) -> usize {
        self.block_size as usize
    }

    fn unit_offset(&self, unit: u32) -> u64 {
        self.block_offset(unit)
    }

    fn first_data_unit(&self) -> u32 {
        0
    }

    fn last_data_unit(&self) -> u32 {
        self.total_blocks.saturating_sub(1)
    }

    fn total_units(&self) -> usize {
        self.total_blocks as usize
    }

    fn size_bytes(&self) -> u64 {
        self.device_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_geometry() {
        let meta = FlatMeta::new(64, 16, 4).unwrap();

        assert_eq!(meta.entry_size, 52 + 4 * 4);
        assert_eq!(meta.table_offset, 13);
        assert_eq!(meta.table_size, 4 * 68);
        assert_eq!(meta.bitmap_offset, 13 + 272);
        assert_eq!(meta.bitmap_size, 2);
        assert_eq!(meta.data_offset, 287);
        assert_eq!(meta.device_size(), 287 + 16 * 64);

        assert_eq!(meta.entry_offset(2), 13 + 2 * 68);
        assert_eq!(meta.block_offset(3), 287 + 3 * 64);
    }

    #[test]
    fn test_default_geometry() {
        let meta = FlatMeta::default();
        assert_eq!(meta, FlatMeta::new(4096, 256, 128).unwrap());
        assert_eq!(meta.entry_size, 564);
        assert_eq!(meta.table_size, 128 * 564);
        assert_eq!(meta.bitmap_size, 32);
        assert_eq!(meta.device_size(), 13 + 72192 + 32 + 256 * 4096);
    }

    #[test]
    fn test_blocks_for() {
        let meta = FlatMeta::new(64, 16, 4).unwrap();
        assert_eq!(meta.blocks_for(0), 1);
        assert_eq!(meta.blocks_for(1), 1);
        assert_eq!(meta.blocks_for(64), 1);
        assert_eq!(meta.blocks_for(65), 2);
        assert_eq!(meta.blocks_for(1024), 16);
    }

    #[test]
    fn test_runs_and_units() {
        let meta = FlatMeta::new(64, 16, 4).unwrap();
        assert!(meta.contains_run(0, 16));
        assert!(meta.contains_run(15, 1));
        assert!(!meta.contains_run(15, 2));
        assert!(!meta.contains_run(0, 0));

        assert_eq!(meta.first_data_unit(), 0);
        assert_eq!(meta.last_data_unit(), 15);
        assert!(meta.is_valid_unit(15));
        assert!(!meta.is_valid_unit(16));
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(FlatMeta::new(0, 16, 4).is_err());
        assert!(FlatMeta::new(64, 0, 4).is_err());
        assert!(FlatMeta::new(64, 16, 0).is_err());
        assert!(FlatMeta::new(64, 16, u32::MAX).is_err());
    }

    #[test]
    fn test_from_device_size() {
        let exact = FlatMeta::new(64, 16, 4).unwrap();
        let meta = FlatMeta::from_device_size(exact.device_size(), 64, 4).unwrap();
        assert_eq!(meta, exact);

        // one byte short loses a block
        let meta = FlatMeta::from_device_size(exact.device_size() - 1, 64, 4).unwrap();
        assert_eq!(meta.total_blocks, 15);
        assert!(meta.device_size() <= exact.device_size() - 1);

        assert!(FlatMeta::from_device_size(100, 64, 4).is_err());
    }
}
