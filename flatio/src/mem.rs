// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOError, BlockIOResult, BlockIOSetLen};

/// In-memory implementation of `BlockIO`.
///
/// Useful for tests, RAM-backed volumes and throwaway shells.
#[derive(Debug)]
pub struct MemBlockIO<'a> {
    buffer: &'a mut [u8],
    logical_len: usize,
}

impl<'a> MemBlockIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let logical_len = buffer.len();

        Self {
            buffer,
            logical_len,
        }
    }

    /// Raw view of the whole backing buffer.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.logical_len]
    }
}

impl<'a> BlockIO for MemBlockIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.check_range(offset, data.len())?;
        let start = offset as usize;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        self.check_range(offset, buf.len())?;
        let start = offset as usize;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        Ok(())
    }

    #[inline]
    fn size_bytes(&self) -> u64 {
        self.logical_len as u64
    }
}

impl<'a> BlockIOSetLen for MemBlockIO<'a> {
    fn set_len(&mut self, new_len: u64) -> BlockIOResult {
        if new_len > self.buffer.len() as u64 {
            return Err(BlockIOError::OutOfBounds);
        }
        self.logical_len = new_len as usize;
        Ok(())
    }
}
