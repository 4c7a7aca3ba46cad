// SPDX-License-Identifier: MIT

// === Superblock ===

pub const FLAT_MAGIC: [u8; 4] = *b"MYFS";
pub const FLAT_VERSION: u8 = 0x03;
pub const FLAT_SUPERBLOCK_OFFSET: u64 = 0;
pub const FLAT_SUPERBLOCK_SIZE: usize = 13; // magic + version + 2 x u32

// field offsets inside the superblock
pub const FLAT_SB_TABLE_SIZE_OFFSET: u64 = 5;
pub const FLAT_SB_BITMAP_SIZE_OFFSET: u64 = 9;

// === Metadata Table ===

pub const FLAT_NAME_LEN: usize = 32; // 31 bytes + NUL
pub const FLAT_ENTRY_HEADER_SIZE: usize = 52;
pub const FLAT_CHILD_INDEX_SIZE: usize = 4;
pub const FLAT_NO_PARENT: i32 = -1;
pub const FLAT_ROOT_NAME: &str = "/";
pub const FLAT_ROOT_SLOT: u32 = 0;

// === Defaults ===

pub const DEFAULT_BLOCK_SIZE: u32 = 4096;
pub const DEFAULT_TOTAL_BLOCKS: u32 = 256; // 1 MiB data region
pub const DEFAULT_CAPACITY: u32 = 128;
