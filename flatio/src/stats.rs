// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
///
/// Counts every request forwarded to the inner device; handy to assert
/// that a failed operation never touched the disk.
pub struct IOCounter<'a, IO: BlockIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
}

impl<'a, IO: BlockIO + ?Sized> IOCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> &'a mut IO {
        self.inner
    }
}

impl<'a, IO: BlockIO + ?Sized> BlockIO for IOCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline]
    fn size_bytes(&self) -> u64 {
        self.inner.size_bytes()
    }
}
