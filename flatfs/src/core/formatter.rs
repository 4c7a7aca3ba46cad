// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsFormatterError, FsFormatterResult};

/// A Formatter for a filesystem type.
///
/// Implementations encapsulate all required state (I/O backend, metadata)
/// and lay down an empty volume on the target device.
///
/// A *full format* also clears the data region; a quick format only
/// rewrites the metadata regions.
pub trait FsFormatter {
    /// Format the filesystem.
    ///
    /// - `full_format`: if `true`, perform a full format, else a quick format
    #[must_use = "format result must be checked for errors"]
    fn format(&mut self, full_format: bool) -> FsFormatterResult;

    /// Flush any buffered writes to disk.
    #[must_use = "flush result must be checked for errors"]
    fn flush(&mut self) -> FsFormatterResult<()> {
        Ok(())
    }
}

use crate::core::meta::FsMeta;
use flatio::{BlockIO, BlockIOExt};

/// Zeroes every allocatable unit of a filesystem.
pub fn zero_data_region<M: FsMeta<u32>, IO: BlockIO + ?Sized>(
    io: &mut IO,
    meta: &M,
) -> FsFormatterResult {
    if meta.total_units() == 0 {
        return Ok(());
    }

    let start = meta.unit_offset(meta.first_data_unit());
    let end = meta.unit_offset(meta.last_data_unit()) + meta.unit_size() as u64;
    let len = end.saturating_sub(start) as usize;

    io.zero_fill(start, len)?;
    Ok(())
}
