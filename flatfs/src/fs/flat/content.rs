// SPDX-License-Identifier: MIT
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use flatio::{BlockIO, BlockIOExt};

use crate::bail;
use crate::core::{allocator::FsAllocator, errors::*};
use crate::fs::flat::{allocator::*, meta::FlatMeta, types::Entry};

/// Reads a file's `size` bytes from its run, one block per request.
pub fn read_content<IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &FlatMeta,
    entry: &Entry,
) -> FsResult<Vec<u8>> {
    if entry.is_directory {
        bail!(FsTableError::IsADirectory);
    }
    let run = entry.run(meta).ok_or(FsTableError::NotFound)?;
    if !meta.contains_run(run.start, run.count) {
        bail!(FsTableError::Corrupted("File extends past the data region"));
    }

    let mut buf = vec![0u8; entry.size as usize];
    io.read_in_chunks(meta.block_offset(run.start), &mut buf, meta.block_size as usize)?;
    Ok(buf)
}

/// Places `data` in a fresh run: allocates it, persists the bitmap, then
/// writes the data one block per request (the last one may be short).
///
/// The caller decides what happens to the run the data replaces.
pub fn write_content<IO: BlockIO + ?Sized>(
    io: &mut IO,
    alloc: &mut FlatAllocator<'_>,
    meta: &FlatMeta,
    data: &[u8],
) -> FsResult<BlockRun> {
    let run = alloc.allocate(meta.blocks_for(data.len()))?;
    alloc.store(io)?;
    io.write_in_chunks(meta.block_offset(run.start), data, meta.block_size as usize)?;
    Ok(run)
}
