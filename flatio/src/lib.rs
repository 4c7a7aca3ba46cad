// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
mod macros;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std_io;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BlockIO;
    pub use super::BlockIOExt;
    pub use super::BlockIOSetLen;
    pub use super::BlockIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemBlockIO;

    #[cfg(feature = "std")]
    pub use super::std_io::StdBlockIO;
}

// Internal use
use errors::*;

// Constants

/// Size of the internal scratch buffer used for zero fills and struct reads.
/// 4 KiB = typical page size and the default filesystem block size.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Fixed-size, byte-addressable block device.
///
/// Every request either completes entirely or fails; there are no partial
/// reads or writes. Offsets are absolute and `offset + len` must not exceed
/// [`BlockIO::size_bytes`].
pub trait BlockIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> BlockIOResult;

    /// Total addressable size of the device in bytes.
    fn size_bytes(&self) -> u64;

    /// Checks that `[offset, offset + len)` lies within the device.
    #[inline]
    fn check_range(&self, offset: u64, len: usize) -> BlockIOResult {
        let end = offset
            .checked_add(len as u64)
            .ok_or(BlockIOError::OutOfBounds)?;
        if end > self.size_bytes() {
            return Err(BlockIOError::OutOfBounds);
        }
        Ok(())
    }
}

/// Extension helpers for BlockIO.
///
/// - chunked reads/writes (one request per block)
/// - zero fill
/// - little-endian primitive reads/writes (`read_u32_at`, `write_u16_at`, ...)
pub trait BlockIOExt: BlockIO {
    /// Reads `buf.len()` bytes from `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn read_in_chunks(&mut self, offset: u64, buf: &mut [u8], chunk_size: usize) -> BlockIOResult {
        if chunk_size == 0 {
            return Err(BlockIOError::Other("read_in_chunks: zero chunk size"));
        }
        let mut remaining = buf.len();
        let mut off = offset;
        let mut pos = 0;

        while remaining > 0 {
            let to_read = remaining.min(chunk_size);
            self.read_at(off, &mut buf[pos..pos + to_read])?;
            off += to_read as u64;
            pos += to_read;
            remaining -= to_read;
        }

        Ok(())
    }

    /// Writes `buf.len()` bytes at `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn write_in_chunks(&mut self, offset: u64, buf: &[u8], chunk_size: usize) -> BlockIOResult {
        if chunk_size == 0 {
            return Err(BlockIOError::Other("write_in_chunks: zero chunk size"));
        }
        let mut remaining = buf.len();
        let mut off = offset;
        let mut pos = 0;

        while remaining > 0 {
            let to_write = remaining.min(chunk_size);
            self.write_at(off, &buf[pos..pos + to_write])?;
            off += to_write as u64;
            pos += to_write;
            remaining -= to_write;
        }

        Ok(())
    }

    /// Fills a region with zeroes.
    ///
    /// Used for table and bitmap clearing and full formats.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> BlockIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // Implements read/write helpers for primitive types (u16, u32, u64)
    blockio_impl_primitive_rw!(u16, u32, u64);
}

impl<T: BlockIO + ?Sized> BlockIOExt for T {}

/// Trait for resizing the storage behind a BlockIO object (if supported by the backend).
pub trait BlockIOSetLen: BlockIO {
    /// Sets the length of the storage.
    fn set_len(&mut self, len: u64) -> BlockIOResult;
}

/// Extension trait for reading and writing structs using zerocopy.
///
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait BlockIOStructExt: BlockIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> BlockIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(BlockIOError::Other("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| BlockIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> BlockIOResult {
        let bytes = val.as_bytes();
        self.write_at(offset, bytes)
    }
}

impl<T: BlockIO + ?Sized> BlockIOStructExt for T {}
