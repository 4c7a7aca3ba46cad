// SPDX-License-Identifier: MIT

use std::io::{Error, Read, Seek, SeekFrom, Write};

use crate::{BlockIO, BlockIOError, BlockIOResult, BlockIOSetLen};

/// `BlockIO` over any seekable stream (image files, cursors).
///
/// The device size is fixed at construction; requests past it fail with
/// `OutOfBounds` even if the underlying stream could grow.
#[derive(Debug)]
pub struct StdBlockIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    len: u64,
}

impl<'a, T: Read + Write + Seek> StdBlockIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T, len: u64) -> Self {
        Self { io, len }
    }
}

impl<'a, T: Read + Write + Seek> BlockIO for StdBlockIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.check_range(offset, data.len())?;
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        self.check_range(offset, buf.len())?;
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> BlockIOResult {
        self.io.flush()?;
        Ok(())
    }

    #[inline]
    fn size_bytes(&self) -> u64 {
        self.len
    }
}

impl<'a> BlockIOSetLen for StdBlockIO<'a, std::fs::File> {
    fn set_len(&mut self, len: u64) -> BlockIOResult {
        self.io.set_len(len)?;
        self.len = len;
        self.flush()?;
        self.io.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl From<Error> for BlockIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        // Leak the string to produce a 'static str. Acceptable for error mapping.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        BlockIOError::Other(leaked_str)
    }
}
