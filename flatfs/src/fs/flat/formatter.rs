// SPDX-License-Identifier: MIT

use flatio::{BlockIO, BlockIOExt, BlockIOStructExt};

pub use crate::core::formatter::*;

use crate::fs::flat::{constant::*, meta::*, table::MetadataTable, types::*};

/// FlatFormatter:
/// - Lays down an empty volume: zeroed bitmap, table holding only the root.
/// - The superblock goes last, so an interrupted format leaves a volume
///   that is detected as unformatted.
/// - A full format also zeroes every data block.
pub struct FlatFormatter<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a FlatMeta,
}

impl<'a, IO: BlockIO + ?Sized> FlatFormatter<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a FlatMeta) -> Self {
        Self { io, meta }
    }

    /// Reads the superblock; `None` if the device does not hold a volume
    /// of the current version.
    pub fn probe(io: &mut IO) -> FsFormatterResult<Option<FlatSuperBlock>> {
        let sb: FlatSuperBlock = io.read_struct(FLAT_SUPERBLOCK_OFFSET)?;
        Ok(sb.is_valid().then_some(sb))
    }

    fn write_table(&mut self) -> FsFormatterResult {
        MetadataTable::with_root(self.meta.capacity).store(self.io, self.meta)?;
        Ok(())
    }

    fn write_bitmap(&mut self) -> FsFormatterResult {
        self.io
            .zero_fill(self.meta.bitmap_offset, self.meta.bitmap_size as usize)?;
        Ok(())
    }

    fn write_superblock(&mut self) -> FsFormatterResult {
        let sb = FlatSuperBlock::from_meta(self.meta);
        self.io.write_struct(FLAT_SUPERBLOCK_OFFSET, &sb)?;
        Ok(())
    }
}

impl<'a, IO: BlockIO + ?Sized> FsFormatter for FlatFormatter<'a, IO> {
    fn format(&mut self, full_format: bool) -> FsFormatterResult {
        if self.io.size_bytes() < self.meta.device_size() {
            return Err(FsFormatterError::Invalid(
                "Device smaller than the volume geometry",
            ));
        }

        self.io
            .zero_fill(FLAT_SUPERBLOCK_OFFSET, FLAT_SUPERBLOCK_SIZE)?;
        self.write_table()?;
        self.write_bitmap()?;
        if full_format {
            zero_data_region(self.io, self.meta)?;
        }
        self.write_superblock()?;

        self.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> FsFormatterResult {
        self.io.flush()?;
        Ok(())
    }
}
