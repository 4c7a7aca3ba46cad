// SPDX-License-Identifier: MIT
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::ops::Range;

use flatio::BlockIO;

pub use crate::core::allocator::*;

use crate::core::utils::bitmap::BitmapOps;
use crate::fs::flat::meta::*;

/// Contiguous run of data blocks `[start, start + count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRun {
    pub start: u32,
    pub count: u32,
}

impl BlockRun {
    pub fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    /// One past the last block of the run.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start as u64 + self.count as u64
    }

    #[inline]
    pub fn overlaps(&self, other: &BlockRun) -> bool {
        (self.start as u64) < other.end() && (other.start as u64) < self.end()
    }

    pub fn blocks(&self) -> Range<u32> {
        self.start..self.start.saturating_add(self.count)
    }
}

impl FsHandle for BlockRun {}

/// First-fit allocator over the volume's free-block bitmap.
///
/// Works on an in-memory copy of the bitmap region; [`FlatAllocator::store`]
/// writes it back. Bit `b` set means block `b` is in use.
#[derive(Debug, Clone)]
pub struct FlatAllocator<'a> {
    meta: &'a FlatMeta,
    bitmap: Vec<u8>,
}

impl<'a> FlatAllocator<'a> {
    /// Allocator with every block free, as laid down by a format.
    pub fn new(meta: &'a FlatMeta) -> Self {
        Self {
            meta,
            bitmap: vec![0u8; meta.bitmap_size as usize],
        }
    }

    /// Reads the bitmap region from the device.
    pub fn load<IO: BlockIO + ?Sized>(io: &mut IO, meta: &'a FlatMeta) -> FsAllocatorResult<Self> {
        let mut bitmap = vec![0u8; meta.bitmap_size as usize];
        io.read_at(meta.bitmap_offset, &mut bitmap)?;
        Ok(Self { meta, bitmap })
    }

    /// Persists the bitmap region.
    pub fn store<IO: BlockIO + ?Sized>(&self, io: &mut IO) -> FsAllocatorResult {
        io.write_at(self.meta.bitmap_offset, &self.bitmap)?;
        Ok(())
    }

    /// Marks a known run as used again, whatever its bits say.
    pub fn reserve(&mut self, run: &BlockRun) -> FsAllocatorResult {
        self.check_run(run)?;
        self.bitmap
            .set_range(run.start as usize, run.count as usize, true);
        Ok(())
    }

    #[inline]
    pub fn is_allocated(&self, block: u32) -> bool {
        block < self.meta.total_blocks && self.bitmap.get_bit(block as usize)
    }

    /// Raw bitmap bytes, padding bits included.
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    fn check_run(&self, run: &BlockRun) -> FsAllocatorResult {
        if !self.meta.contains_run(run.start, run.count) {
            return Err(FsAllocatorError::InvalidRun);
        }
        Ok(())
    }
}

impl<'a> FsAllocator<BlockRun> for FlatAllocator<'a> {
    fn allocate(&mut self, count: usize) -> FsAllocatorResult<BlockRun> {
        if count == 0 {
            return Err(FsAllocatorError::Other("Cannot allocate an empty run"));
        }
        let total = self.meta.total_blocks as usize;
        let start = self
            .bitmap
            .find_zero_run(count, total)
            .ok_or(FsAllocatorError::OutOfSpace)?;

        self.bitmap.set_range(start, count, true);
        Ok(BlockRun::new(start as u32, count as u32))
    }

    /// Clears exactly the bits of `run`; ownership is not checked.
    fn free(&mut self, run: &BlockRun) -> FsAllocatorResult {
        self.check_run(run)?;
        self.bitmap
            .set_range(run.start as usize, run.count as usize, false);
        Ok(())
    }

    fn used_units(&self) -> usize {
        self.bitmap
            .count_ones_in_range(0, self.meta.total_blocks as usize)
    }

    fn remaining_units(&self) -> usize {
        self.meta.total_units() - self.used_units()
    }
}
