// SPDX-License-Identifier: MIT
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use flatio::prelude::*;

pub use crate::core::checker::*;
use crate::core::{allocator::FsAllocator, utils::bitmap::BitmapOps};
use crate::fs::flat::{
    allocator::{BlockRun, FlatAllocator},
    constant::*,
    meta::*,
    table::MetadataTable,
    types::*,
};

#[derive(Clone, Debug)]
pub struct FlatCheckOptions {
    pub phases: VerifyPhases,
    pub fail_fast: bool,
    /// Report blocks marked used but owned by no file. A volume written
    /// with the leak overwrite policy has them by construction.
    pub report_leaks: bool,
}

impl Default for FlatCheckOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: false,
            report_leaks: true,
        }
    }
}

impl VerifierOptionsLike for FlatCheckOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

/// Read-only consistency check of a flat volume.
///
/// The table phase decodes slot by slot so one bad slot does not hide the
/// rest; undecodable slots are treated as free by the later phases.
pub struct FlatChecker<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a FlatMeta,
    readable: bool,
    table: Option<MetadataTable>,
}

impl<'a, IO: BlockIO + ?Sized> FlatChecker<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a FlatMeta) -> Self {
        Self {
            io,
            meta,
            readable: true,
            table: None,
        }
    }

    fn ensure_table(&mut self, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        if self.table.is_none() && self.readable {
            self.load_table(rep)?;
        }
        Ok(())
    }

    fn load_table(&mut self, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        let meta = self.meta;
        let mut raw = vec![0u8; meta.table_size as usize];
        self.io.read_at(meta.table_offset, &mut raw)?;

        let mut entries = Vec::with_capacity(meta.capacity as usize);
        for (slot, chunk) in raw.chunks_exact(meta.entry_size).enumerate() {
            match Entry::from_raw(chunk, meta.capacity) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    rep.push(Finding::err(
                        "TABLE.SLOT",
                        format!("slot {slot}: {}", e.msg()),
                    ));
                    entries.push(Entry::default());
                }
            }
        }

        self.table = Some(MetadataTable::from_entries(meta.capacity, entries));
        Ok(())
    }
}

impl<'a, IO: BlockIO + ?Sized> FsChecker for FlatChecker<'a, IO> {
    type Options = FlatCheckOptions;

    fn check_superblock(
        &mut self,
        _opt: &Self::Options,
        rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        if self.io.size_bytes() < self.meta.device_size() {
            self.readable = false;
            rep.push(Finding::err(
                "SB.DEVICE",
                format!(
                    "device holds {} bytes, volume needs {}",
                    self.io.size_bytes(),
                    self.meta.device_size()
                ),
            ));
            return Ok(());
        }

        let header: FlatHeader = self.io.read_struct(FLAT_SUPERBLOCK_OFFSET)?;
        if header.magic != FLAT_MAGIC {
            rep.push(Finding::err("SB.MAGIC", "bad magic, volume not formatted"));
            return Ok(());
        }
        if header.version != FLAT_VERSION {
            rep.push(Finding::err(
                "SB.VERSION",
                format!("version {} (expected {})", header.version, FLAT_VERSION),
            ));
        }

        let table_size = self.io.read_u32_at(FLAT_SB_TABLE_SIZE_OFFSET)?;
        let bitmap_size = self.io.read_u32_at(FLAT_SB_BITMAP_SIZE_OFFSET)?;
        if table_size != self.meta.table_size {
            rep.push(Finding::err(
                "SB.TABLE_SIZE",
                format!("table size {table_size} (expected {})", self.meta.table_size),
            ));
        }
        if bitmap_size != self.meta.bitmap_size {
            rep.push(Finding::err(
                "SB.BITMAP_SIZE",
                format!("bitmap size {bitmap_size} (expected {})", self.meta.bitmap_size),
            ));
        }
        if !rep.has_error() {
            rep.push(Finding::info(
                "SB.OK",
                format!("table {table_size} bytes, bitmap {bitmap_size} bytes"),
            ));
        }
        Ok(())
    }

    fn check_table(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult<()> {
        if !self.readable {
            return Ok(());
        }
        self.load_table(rep)?;
        if let Some(table) = &self.table {
            rep.push(Finding::info(
                "TABLE.USAGE",
                format!("{}/{} slots in use", table.used_count(), table.capacity()),
            ));
        }
        Ok(())
    }

    fn check_hierarchy(
        &mut self,
        _opt: &Self::Options,
        rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        self.ensure_table(rep)?;
        if let Some(table) = &self.table {
            hierarchy(table, rep);
        }
        Ok(())
    }

    fn check_allocation(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        self.ensure_table(rep)?;
        let Some(table) = &self.table else {
            return Ok(());
        };
        let alloc = FlatAllocator::load(self.io, self.meta)?;
        allocation(self.meta, table, &alloc, opt, rep);
        Ok(())
    }
}

fn hierarchy(table: &MetadataTable, rep: &mut VerifyReport) {
    let roots: Vec<u32> = table
        .iter_used()
        .filter(|(_, e)| e.is_root())
        .map(|(i, _)| i)
        .collect();
    match roots.as_slice() {
        [] => rep.push(Finding::err("TREE.ROOT_MISSING", "no entry without a parent")),
        [root] => {
            if table.get(*root).is_some_and(|e| !e.is_directory) {
                rep.push(Finding::err(
                    "TREE.ROOT_NOT_DIR",
                    format!("root slot {root} is not a directory"),
                ));
            }
        }
        [_, extra @ ..] => {
            for slot in extra {
                rep.push(Finding::err(
                    "TREE.ROOT_MULTIPLE",
                    format!("slot {slot} is a second root"),
                ));
            }
        }
    }

    for (slot, entry) in table.iter_used() {
        if let Some(parent) = entry.parent {
            match table.get(parent) {
                Some(p) if p.is_free() => rep.push(Finding::err(
                    "TREE.PARENT_FREE",
                    format!("slot {slot} ('{}') has free parent slot {parent}", entry.name),
                )),
                Some(p) if !p.is_directory => rep.push(Finding::err(
                    "TREE.PARENT_NOT_DIR",
                    format!("slot {slot} ('{}') has file parent slot {parent}", entry.name),
                )),
                Some(p) => {
                    let links = p.children.iter().filter(|&&c| c == slot).count();
                    if links != 1 {
                        rep.push(Finding::err(
                            "TREE.CHILD_LINK",
                            format!("slot {slot} listed {links} times under slot {parent}"),
                        ));
                    }
                }
                None => {}
            }
        }

        if entry.is_directory {
            if entry.size != 0 || entry.start_block != 0 {
                rep.push(Finding::warn(
                    "TREE.DIR_EXTENT",
                    format!("directory slot {slot} carries a block extent"),
                ));
            }
            siblings(table, slot, entry, rep);
        } else if !entry.children.is_empty() {
            rep.push(Finding::err(
                "TREE.FILE_CHILDREN",
                format!("file slot {slot} lists children"),
            ));
        }
    }

    // reachability from the root through child lists
    if let [root] = roots.as_slice() {
        let mut seen = vec![0u8; (table.capacity() as usize).div_ceil(8)];
        let mut stack = vec![*root];
        seen.set_bit(*root as usize, true);
        while let Some(dir) = stack.pop() {
            for (child, e) in table.children(dir).into_iter().flatten() {
                if e.parent == Some(dir) && !seen.get_bit(child as usize) {
                    seen.set_bit(child as usize, true);
                    if e.is_directory {
                        stack.push(child);
                    }
                }
            }
        }
        for (slot, entry) in table.iter_used() {
            if !seen.get_bit(slot as usize) {
                rep.push(Finding::err(
                    "TREE.ORPHAN",
                    format!("slot {slot} ('{}') is unreachable from the root", entry.name),
                ));
            }
        }
    }
}

fn siblings(table: &MetadataTable, dir: u32, entry: &Entry, rep: &mut VerifyReport) {
    let mut names: Vec<&[u8]> = Vec::with_capacity(entry.children.len());
    for &child in &entry.children {
        match table.get(child) {
            Some(c) if !c.is_free() && c.parent == Some(dir) => {
                let name = c.name.as_bytes();
                if names.contains(&name) {
                    rep.push(Finding::err(
                        "TREE.NAME_DUPLICATE",
                        format!("'{}' appears twice under slot {dir}", c.name),
                    ));
                }
                names.push(name);
            }
            _ => rep.push(Finding::err(
                "TREE.CHILD_DANGLING",
                format!("slot {dir} lists slot {child} which is not its child"),
            )),
        }
    }
}

fn allocation(
    meta: &FlatMeta,
    table: &MetadataTable,
    alloc: &FlatAllocator<'_>,
    opt: &FlatCheckOptions,
    rep: &mut VerifyReport,
) {
    let mut runs: Vec<(BlockRun, u32)> = Vec::new();
    for (slot, entry) in table.iter_used() {
        let Some(run) = entry.run(meta) else {
            continue;
        };
        if meta.contains_run(run.start, run.count) {
            runs.push((run, slot));
        } else {
            rep.push(Finding::err(
                "ALLOC.RANGE",
                format!(
                    "slot {slot} ('{}') spans blocks {}..{} past {}",
                    entry.name,
                    run.start,
                    run.end(),
                    meta.total_blocks
                ),
            ));
        }
    }

    runs.sort_by_key(|(run, _)| run.start);
    for pair in runs.windows(2) {
        let ((a, slot_a), (b, slot_b)) = (pair[0], pair[1]);
        if a.overlaps(&b) {
            rep.push(Finding::err(
                "ALLOC.OVERLAP",
                format!("slots {slot_a} and {slot_b} share blocks from {}", b.start),
            ));
        }
    }

    let mut expected = vec![0u8; meta.bitmap_size as usize];
    for (run, _) in &runs {
        expected.set_range(run.start as usize, run.count as usize, true);
    }

    let actual = alloc.bitmap();
    let total = meta.total_blocks as usize;
    let unmarked: Vec<usize> = (0..total)
        .filter(|&b| expected.get_bit(b) && !actual.get_bit(b))
        .collect();
    let leaked: Vec<usize> = (0..total)
        .filter(|&b| actual.get_bit(b) && !expected.get_bit(b))
        .collect();

    if let Some(first) = unmarked.first() {
        rep.push(Finding::err(
            "ALLOC.UNMARKED",
            format!("{} file blocks marked free, first {first}", unmarked.len()),
        ));
    }
    if opt.report_leaks
        && let Some(first) = leaked.first()
    {
        rep.push(Finding::warn(
            "ALLOC.LEAKED",
            format!("{} blocks marked used but unowned, first {first}", leaked.len()),
        ));
    }
    if actual.count_ones_in_range(total, actual.len() * 8) != 0 {
        rep.push(Finding::warn("ALLOC.PADDING", "bits set past the last block"));
    }

    rep.push(Finding::info(
        "ALLOC.USAGE",
        format!("{}/{} blocks used", alloc.used_units(), meta.total_units()),
    ));
}
