// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsAllocatorError, FsAllocatorResult};

/// Trait implemented by all FS allocation handles.
///
/// A handle names what was allocated (a block run, a cluster chain, ...)
/// and is what the caller hands back to release it.
pub trait FsHandle {}

/// Trait for managing allocation of logical units in a filesystem.
///
/// Allocation state lives in memory; implementations expose their own way
/// to persist it, which callers invoke before anything refers to the units.
pub trait FsAllocator<Handle: FsHandle + Sized + Clone> {
    /// Allocate `count` units and return a handle covering all of them.
    fn allocate(&mut self, count: usize) -> FsAllocatorResult<Handle>;

    /// Allocate a single unit and return its handle.
    fn allocate_unit(&mut self) -> FsAllocatorResult<Handle> {
        self.allocate(1)
    }

    /// Return every unit covered by `handle` to the free pool.
    fn free(&mut self, handle: &Handle) -> FsAllocatorResult;

    /// Number of units currently used.
    fn used_units(&self) -> usize;

    /// Number of remaining units.
    fn remaining_units(&self) -> usize;
}
