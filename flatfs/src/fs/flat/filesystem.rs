// SPDX-License-Identifier: MIT
#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use flatio::BlockIO;

use crate::core::{allocator::FsAllocator, checker::FsChecker, errors::*, formatter::FsFormatter};
use crate::core::utils::path_utils::{is_absolute, is_root_path};
use crate::{bail, ensure};
use crate::fs::flat::{
    allocator::FlatAllocator,
    checker::{FlatCheckOptions, FlatChecker, VerifyReport},
    content,
    formatter::FlatFormatter,
    meta::FlatMeta,
    table::MetadataTable,
    types::*,
};

/// What `set_content` does with the run it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Free the old run before allocating the new one.
    #[default]
    Reclaim,
    /// Keep the old run marked used. Space is never recovered.
    Leak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatOptions {
    pub overwrite: OverwritePolicy,
    /// Zero the data region when formatting.
    pub full_format: bool,
}

impl Default for FlatOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::Reclaim,
            full_format: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeState {
    Unformatted,
    Formatting,
    Ready,
}

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_directory: bool,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeUsage {
    pub block_size: u32,
    pub total_blocks: u32,
    pub used_blocks: u32,
    pub free_blocks: u32,
    pub used_entries: u32,
    pub capacity: u32,
}

/// A mounted flat volume.
///
/// Holds the device exclusively for its lifetime. Every operation loads
/// the table (and the bitmap when it needs one) from the device, works on
/// the copy, and writes back what changed before returning: the bitmap
/// first, then the table. A failed operation leaves the device untouched
/// unless the device itself failed midway.
pub struct FlatFs<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: FlatMeta,
    options: FlatOptions,
    state: VolumeState,
    formatted_on_open: bool,
}

impl<'a, IO: BlockIO + ?Sized> FlatFs<'a, IO> {
    pub fn open(io: &'a mut IO, meta: FlatMeta) -> FsResult<Self> {
        Self::open_with(io, meta, FlatOptions::default())
    }

    /// Mounts the volume, formatting it first if the device holds no
    /// volume of the current version.
    ///
    /// A valid superblock describing another geometry is an error, never a
    /// reason to format.
    pub fn open_with(io: &'a mut IO, meta: FlatMeta, options: FlatOptions) -> FsResult<Self> {
        let mut fs = Self {
            io,
            meta,
            options,
            state: VolumeState::Unformatted,
            formatted_on_open: false,
        };

        ensure!(
            fs.io.size_bytes() >= fs.meta.device_size(),
            FsFormatterError::Invalid("Device smaller than the volume geometry")
        );

        match FlatFormatter::probe(&mut *fs.io)? {
            Some(sb) if sb.matches(&fs.meta) => fs.state = VolumeState::Ready,
            Some(_) => bail!(FsFormatterError::Invalid(
                "Superblock geometry does not match the volume"
            )),
            None => {
                fs.format()?;
                fs.formatted_on_open = true;
            }
        }
        Ok(fs)
    }

    /// Destroys every entry and leaves only the root directory.
    pub fn format(&mut self) -> FsResult {
        self.state = VolumeState::Formatting;
        FlatFormatter::new(&mut *self.io, &self.meta).format(self.options.full_format)?;
        self.state = VolumeState::Ready;
        Ok(())
    }

    pub fn create(&mut self, path: &str, is_directory: bool) -> FsResult {
        self.ensure_ready()?;
        ensure!(!is_root_path(path), FsTableError::AlreadyExists);

        let mut table = self.load_table()?;
        let (parent, leaf) = table.resolve_parent(path)?;
        let name = EntryName::new(leaf)?;
        ensure!(
            table.find_child(parent, leaf).is_none(),
            FsTableError::AlreadyExists
        );

        let entry = if is_directory {
            Entry::directory(name)
        } else {
            Entry::file(name)
        };
        let slot = table.insert_child(parent, entry)?;

        if !is_directory {
            let mut alloc = FlatAllocator::load(&mut *self.io, &self.meta)?;
            let run = alloc.allocate_unit()?;
            alloc.store(&mut *self.io)?;
            table.set_extent(slot, run.start, 0)?;
        }

        table.store(&mut *self.io, &self.meta)?;
        Ok(())
    }

    pub fn get_content(&mut self, path: &str) -> FsResult<Vec<u8>> {
        self.ensure_ready()?;
        let table = self.load_table()?;
        let slot = table.find_by_path(path)?;
        content::read_content(&mut *self.io, &self.meta, table.entry(slot)?)
    }

    /// Replaces a file's content with `data`, in a freshly allocated run.
    pub fn set_content(&mut self, path: &str, data: &[u8]) -> FsResult {
        self.ensure_ready()?;
        let size = u32::try_from(data.len()).map_err(|_| FsAllocatorError::OutOfSpace)?;

        let mut table = self.load_table()?;
        let slot = table.find_by_path(path)?;
        let entry = table.entry(slot)?;
        ensure!(!entry.is_directory, FsTableError::IsADirectory);
        let old = entry
            .run(&self.meta)
            .filter(|run| self.meta.contains_run(run.start, run.count));

        let mut alloc = FlatAllocator::load(&mut *self.io, &self.meta)?;
        let reclaimed = match (self.options.overwrite, old) {
            (OverwritePolicy::Reclaim, Some(run)) => {
                alloc.free(&run)?;
                Some(run)
            }
            _ => None,
        };

        let run = match content::write_content(&mut *self.io, &mut alloc, &self.meta, data) {
            Ok(run) => run,
            Err(e) => {
                if let Some(old) = reclaimed {
                    alloc.reserve(&old)?;
                }
                return Err(e);
            }
        };

        table.set_extent(slot, run.start, size)?;
        table.store(&mut *self.io, &self.meta)?;
        Ok(())
    }

    /// Direct children of a directory, in creation order.
    pub fn list(&mut self, path: &str) -> FsResult<Vec<DirEntryInfo>> {
        self.ensure_ready()?;
        let table = self.load_table()?;
        let slot = table.find_by_path(path)?;
        let listing = table
            .children(slot)?
            .map(|(_, e)| DirEntryInfo {
                name: e.name.to_string_lossy(),
                is_directory: e.is_directory,
                size: e.size,
            })
            .collect();
        Ok(listing)
    }

    pub fn remove_file(&mut self, path: &str) -> FsResult {
        self.ensure_ready()?;
        let mut table = self.load_table()?;
        let slot = table.find_by_path(path)?;
        let entry = table.entry(slot)?;
        ensure!(!entry.is_directory, FsTableError::IsADirectory);
        let run = entry.run(&self.meta);

        table.remove(slot)?;

        if let Some(run) = run
            && self.meta.contains_run(run.start, run.count)
        {
            let mut alloc = FlatAllocator::load(&mut *self.io, &self.meta)?;
            alloc.free(&run)?;
            alloc.store(&mut *self.io)?;
        }

        table.store(&mut *self.io, &self.meta)?;
        Ok(())
    }

    /// Removes an empty directory other than the root.
    pub fn remove_directory(&mut self, path: &str) -> FsResult {
        self.ensure_ready()?;
        let mut table = self.load_table()?;
        let slot = table.find_by_path(path)?;
        let entry = table.entry(slot)?;
        ensure!(entry.is_directory, FsTableError::NotADirectory);
        ensure!(
            !entry.is_root(),
            FsTableError::InvalidPath("Cannot remove the root directory")
        );
        ensure!(
            table.children(slot)?.next().is_none(),
            FsTableError::NotEmpty
        );

        table.remove(slot)?;
        table.store(&mut *self.io, &self.meta)?;
        Ok(())
    }

    /// Renames an entry in place. `new_path` must name the same parent
    /// directory as `old_path`.
    pub fn move_entry(&mut self, old_path: &str, new_path: &str) -> FsResult {
        self.ensure_ready()?;
        for path in [old_path, new_path] {
            ensure!(!path.is_empty(), FsTableError::InvalidPath("Empty path"));
            ensure!(
                is_absolute(path),
                FsTableError::InvalidPath("Path must be absolute")
            );
        }

        let mut table = self.load_table()?;
        let slot = table.find_by_path(old_path)?;
        let entry = table.entry(slot)?;
        ensure!(
            !entry.is_root(),
            FsTableError::InvalidPath("Cannot rename the root directory")
        );
        let parent = entry.parent;

        let (new_parent, leaf) = table.resolve_parent(new_path).map_err(|e| match e {
            FsTableError::InvalidPath(msg) => FsTableError::InvalidPath(msg),
            _ => FsTableError::InvalidPath("Cannot move across directories"),
        })?;
        ensure!(
            parent == Some(new_parent),
            FsTableError::InvalidPath("Cannot move across directories")
        );
        if entry.name.matches(leaf) {
            return Ok(());
        }

        let name = EntryName::new(leaf)?;
        ensure!(
            table.find_child(new_parent, leaf).is_none(),
            FsTableError::AlreadyExists
        );

        table.rename(slot, name)?;
        table.store(&mut *self.io, &self.meta)?;
        Ok(())
    }

    pub fn usage(&mut self) -> FsResult<VolumeUsage> {
        self.ensure_ready()?;
        let table = self.load_table()?;
        let alloc = FlatAllocator::load(&mut *self.io, &self.meta)?;
        Ok(VolumeUsage {
            block_size: self.meta.block_size,
            total_blocks: self.meta.total_blocks,
            used_blocks: alloc.used_units() as u32,
            free_blocks: alloc.remaining_units() as u32,
            used_entries: table.used_count() as u32,
            capacity: self.meta.capacity,
        })
    }

    /// Runs every checker phase over the volume. Read-only.
    pub fn check(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check_with(&FlatCheckOptions::default())
    }

    pub fn check_with(&mut self, opt: &FlatCheckOptions) -> FsCheckerResult<VerifyReport> {
        FlatChecker::new(&mut *self.io, &self.meta).check_with(opt)
    }

    pub fn flush(&mut self) -> FsResult {
        self.io.flush()?;
        Ok(())
    }

    #[inline]
    pub fn meta(&self) -> &FlatMeta {
        &self.meta
    }

    #[inline]
    pub fn options(&self) -> &FlatOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: FlatOptions) {
        self.options = options;
    }

    #[inline]
    pub fn state(&self) -> VolumeState {
        self.state
    }

    /// `true` if `open` found no valid volume and formatted the device.
    #[inline]
    pub fn formatted_on_open(&self) -> bool {
        self.formatted_on_open
    }

    fn ensure_ready(&self) -> FsResult {
        ensure!(
            self.state == VolumeState::Ready,
            FsError::Other("Volume is not ready")
        );
        Ok(())
    }

    fn load_table(&mut self) -> FsResult<MetadataTable> {
        Ok(MetadataTable::load(&mut *self.io, &self.meta)?)
    }
}
