// SPDX-License-Identifier: MIT

pub mod allocator;
pub mod checker;
pub mod constant;
pub mod content;
pub mod filesystem;
pub mod formatter;
pub mod meta;
pub mod table;
pub mod types;

// === Public Interface ===
pub mod traits {
    pub use super::allocator::{BlockRun, FlatAllocator};
    pub use super::checker::{FlatCheckOptions, FlatChecker};
    pub use super::formatter::FlatFormatter;
    pub use super::meta::FlatMeta;
    pub use super::table::MetadataTable;
}

pub mod prelude {
    pub use super::constant::*;
    pub use super::filesystem::{
        DirEntryInfo, FlatFs, FlatOptions, OverwritePolicy, VolumeState, VolumeUsage,
    };
    pub use super::traits::*;
    pub use super::types::{Entry, EntryName, FlatSuperBlock};
    pub use crate::core::checker::{
        Finding, ReportDisplayOpts, Severity, VerifyPhases, VerifyReport,
    };
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use flatio::prelude::*;
}
